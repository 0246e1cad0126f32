//! Network-backed store client for the document database REST API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::json;
use tracing::{debug, info, warn};

use common::{AppError, AppResult, StoreConfig};
use domain::Document;

use super::auth::{http_date, MasterKey};
use super::client::{FeedResponse, QueryCursor, StoreClient};

const API_VERSION: &str = "2018-12-31";
const RESOURCE_DOCS: &str = "docs";

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_IS_UPSERT: &str = "x-ms-documentdb-is-upsert";
const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
const HEADER_CONTINUATION: &str = "x-ms-continuation";

/// Characters escaped in a document id used as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// REST client bound to one container.
#[derive(Clone)]
pub struct CosmosClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    endpoint: String,
    key: MasterKey,
    collection_link: String,
}

impl CosmosClient {
    /// Build a client from validated settings.
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        config.validate()?;
        let key = MasterKey::from_base64(&config.account_key)?;
        let http = reqwest::Client::builder().build()?;

        info!(
            endpoint = %config.account_endpoint,
            database = %config.database_id,
            container = %config.container_id,
            "Document store client created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                endpoint: config.account_endpoint.trim_end_matches('/').to_string(),
                key,
                collection_link: format!("dbs/{}/colls/{}", config.database_id, config.container_id),
            }),
        })
    }

    fn collection_link(&self) -> &str {
        &self.inner.collection_link
    }

    /// Start a signed request against `path` (relative to the endpoint).
    fn request(
        &self,
        method: Method,
        resource_link: &str,
        path: &str,
        partition_key: &str,
    ) -> AppResult<RequestBuilder> {
        let date = http_date(Utc::now());
        let authorization =
            self.inner
                .key
                .authorization(method.as_str(), RESOURCE_DOCS, resource_link, &date)?;
        let partition_header = serde_json::to_string(&[partition_key])?;
        let url = format!("{}/{}", self.inner.endpoint, path);

        Ok(self
            .inner
            .http
            .request(method, url)
            .header("authorization", authorization)
            .header(HEADER_DATE, date)
            .header(HEADER_VERSION, API_VERSION)
            .header(HEADER_PARTITION_KEY, partition_header))
    }
}

#[async_trait]
impl StoreClient for CosmosClient {
    fn open_query(
        &self,
        query: &str,
        partition_key: &str,
        max_item_count: usize,
    ) -> Box<dyn QueryCursor> {
        debug!(partition_key = %partition_key, max_item_count, "Opening query cursor");
        Box::new(CosmosQueryCursor {
            client: self.clone(),
            body: json!({ "query": query, "parameters": [] }),
            partition_key: partition_key.to_string(),
            max_item_count,
            continuation: None,
            started: false,
            pages: 0,
        })
    }

    async fn upsert(&self, partition_key: &str, document: &Document) -> AppResult<()> {
        let link = self.collection_link();
        let response = self
            .request(Method::POST, link, &format!("{}/docs", link), partition_key)?
            .header(HEADER_IS_UPSERT, "True")
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(document)?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, id = ?document.id(), "Document upserted");
            return Ok(());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(status = %status, id = ?document.id(), "Upsert rejected by store");
        Err(AppError::store(status.as_u16(), message))
    }

    async fn delete(&self, id: &str, partition_key: &str) -> AppResult<StatusCode> {
        let link = format!("{}/docs/{}", self.collection_link(), id);
        let path = format!(
            "{}/docs/{}",
            self.collection_link(),
            utf8_percent_encode(id, PATH_SEGMENT)
        );

        let response = self
            .request(Method::DELETE, &link, &path, partition_key)?
            .send()
            .await?;

        Ok(response.status())
    }
}

/// Continuation-token cursor over a partition-scoped query.
pub struct CosmosQueryCursor {
    client: CosmosClient,
    body: serde_json::Value,
    partition_key: String,
    max_item_count: usize,
    continuation: Option<String>,
    started: bool,
    pages: usize,
}

#[async_trait]
impl QueryCursor for CosmosQueryCursor {
    fn has_more(&self) -> bool {
        !self.started || self.continuation.is_some()
    }

    async fn fetch_next(&mut self) -> AppResult<FeedResponse> {
        let link = self.client.collection_link();
        let mut request = self
            .client
            .request(Method::POST, link, &format!("{}/docs", link), &self.partition_key)?
            .header(HEADER_IS_QUERY, "True")
            .header(HEADER_CROSS_PARTITION, "False")
            .header(HEADER_MAX_ITEM_COUNT, self.max_item_count.to_string())
            .header(CONTENT_TYPE, "application/query+json")
            .body(serde_json::to_vec(&self.body)?);

        if let Some(token) = &self.continuation {
            request = request.header(HEADER_CONTINUATION, token.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        self.started = true;
        self.pages += 1;
        self.continuation = response
            .headers()
            .get(HEADER_CONTINUATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let body = response.bytes().await?.to_vec();
        debug!(
            status = %status,
            page = self.pages,
            bytes = body.len(),
            more = self.continuation.is_some(),
            "Query page fetched"
        );

        Ok(FeedResponse { status, body })
    }
}

impl Drop for CosmosQueryCursor {
    fn drop(&mut self) {
        debug!(
            partition_key = %self.partition_key,
            pages = self.pages,
            "Query cursor released"
        );
    }
}
