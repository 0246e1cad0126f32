//! Domain-level constants.
//!
//! These constants describe how documents are shaped on the wire and the
//! defaults the data-access layer applies when talking to the store.

// =============================================================================
// Documents
// =============================================================================

/// Property holding the unique document identifier
pub const ID_PROPERTY: &str = "id";

/// Property of a query response envelope holding the returned documents.
/// Matched case-insensitively.
pub const DOCUMENTS_PROPERTY: &str = "documents";

// =============================================================================
// Queries
// =============================================================================

/// Maximum number of documents returned per query page
pub const MAX_ITEMS_PER_PAGE: usize = 100;

// =============================================================================
// Deletes
// =============================================================================

/// Default number of delete attempts before giving up
pub const DEFAULT_DELETE_MAX_ATTEMPTS: u32 = 5;

/// Default delay between delete attempts in milliseconds
pub const DEFAULT_DELETE_RETRY_DELAY_MS: u64 = 100;

/// Check if a property name is the documents envelope key
pub fn is_documents_property(name: &str) -> bool {
    name.eq_ignore_ascii_case(DOCUMENTS_PROPERTY)
}
