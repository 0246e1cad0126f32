//! Master-key request signing for the document database REST API.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

use common::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Characters left unescaped in the authorization token (URI component rules).
const TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Decoded account master key.
#[derive(Clone)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl MasterKey {
    /// Decode a base64 account key.
    pub fn from_base64(encoded: &str) -> AppResult<Self> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| AppError::validation(format!("Argument accountKey is not valid base64: {}", e)))?;
        Ok(Self { key })
    }

    /// Build the `authorization` header value for one request.
    ///
    /// `resource_link` is the unescaped link of the addressed resource
    /// (`dbs/{db}/colls/{coll}` for feeds, `.../docs/{id}` for items).
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> AppResult<String> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::internal(format!("Invalid signing key: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", signature);
        Ok(utf8_percent_encode(&token, TOKEN_ENCODE_SET).to_string())
    }
}

/// RFC 1123 date as expected by the `x-ms-date` header.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const KEY: &str = "dGVzdC1tYXN0ZXIta2V5LWZvci1zaWduaW5nLTAwMDE=";

    #[test]
    fn test_http_date_format() {
        let at = Utc.with_ymd_and_hms(2017, 4, 27, 0, 51, 12).unwrap();
        assert_eq!(http_date(at), "Thu, 27 Apr 2017 00:51:12 GMT");
    }

    #[test]
    fn test_authorization_signature() {
        let key = MasterKey::from_base64(KEY).unwrap();
        let token = key
            .authorization(
                "GET",
                "docs",
                "dbs/shop/colls/orders/docs/o-1",
                "Thu, 27 Apr 2017 00:51:12 GMT",
            )
            .unwrap();

        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3Dxs70X%2FuHEXDv7gLQKpcUx54uFiZ2q24tTsUbL66hFXQ%3D"
        );
    }

    #[test]
    fn test_signature_depends_on_resource_link() {
        let key = MasterKey::from_base64(KEY).unwrap();
        let date = "Thu, 27 Apr 2017 00:51:12 GMT";
        let a = key.authorization("DELETE", "docs", "dbs/shop/colls/orders/docs/a", date).unwrap();
        let b = key.authorization("DELETE", "docs", "dbs/shop/colls/orders/docs/b", date).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let err = MasterKey::from_base64("not base64 !!").err().unwrap();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
