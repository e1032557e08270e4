//! Minimal Pinecone data-plane client.
//!
//! Uses the integrated-embedding records API, so the index embeds the
//! `text` field itself and no separate embedding provider is needed:
//! - `POST {host}/records/namespaces/{ns}/upsert` (NDJSON body)
//! - `POST {host}/records/namespaces/{ns}/search`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use url::Url;

use super::VectorIndex;
use crate::db::Product;

const API_VERSION: &str = "2025-01";

/// Largest batch the records upsert endpoint accepts for integrated indexes.
pub const MAX_UPSERT_BATCH: usize = 96;

#[derive(Debug, Error)]
pub enum PineconeError {
    #[error("invalid index host {0:?}")]
    InvalidHost(String),

    #[error("invalid API key header value")]
    InvalidApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pinecone returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One record as written to the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRecord {
    #[serde(rename = "_id")]
    pub id: String,
    /// Field embedded by the index.
    pub text: String,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
}

impl From<&Product> for IndexRecord {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            text: product.search_text(),
            name: product.name.clone(),
            category: product.category.clone(),
            price_cents: product.price_cents,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
}

pub struct PineconeClient {
    http: reqwest::Client,
    host: Url,
    namespace: String,
}

impl PineconeClient {
    /// `host` may omit the scheme, as the Pinecone console shows it; https is assumed.
    pub fn new(
        host: &str,
        api_key: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<Self, PineconeError> {
        let with_scheme = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let host_url = Url::parse(&with_scheme)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
            .ok_or_else(|| PineconeError::InvalidHost(host.to_string()))?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).map_err(|_| PineconeError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert("api-key", key);
        headers.insert("x-pinecone-api-version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            host: host_url,
            namespace: namespace.to_string(),
        })
    }

    fn endpoint(&self, action: &str) -> Result<Url, PineconeError> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| PineconeError::InvalidHost(self.host.to_string()))?
            .pop_if_empty()
            .extend(["records", "namespaces", self.namespace.as_str(), action]);
        Ok(url)
    }

    /// Upsert one batch of records (at most [`MAX_UPSERT_BATCH`]).
    pub async fn upsert_records(&self, records: &[IndexRecord]) -> Result<(), PineconeError> {
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        let response = self
            .http
            .post(self.endpoint("upsert")?)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Ids of the `top_k` records closest to `text`, best first.
    pub async fn search(&self, text: &str, top_k: usize) -> Result<Vec<String>, PineconeError> {
        let body = json!({
            "query": {
                "inputs": { "text": text },
                "top_k": top_k,
            },
            "fields": ["name"],
        });

        let response = self.http.post(self.endpoint("search")?).json(&body).send().await?;
        let parsed: SearchResponse = check_status(response).await?.json().await?;
        Ok(parsed.result.hits.into_iter().map(|hit| hit.id).collect())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PineconeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PineconeError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<String>, PineconeError> {
        self.search(text, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(host: &str) -> PineconeClient {
        PineconeClient::new(host, "test-key", "products", Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn host_without_scheme_defaults_to_https() {
        let c = client("products-abc.svc.pinecone.io");
        assert_eq!(
            c.endpoint("upsert").unwrap().as_str(),
            "https://products-abc.svc.pinecone.io/records/namespaces/products/upsert"
        );
    }

    #[test]
    fn rejects_unusable_host() {
        let err = PineconeClient::new("ftp://x", "k", "ns", Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, PineconeError::InvalidHost(_)));
    }

    #[tokio::test]
    async fn upsert_sends_ndjson_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/records/namespaces/products/upsert"))
            .and(header("api-key", "test-key"))
            .and(header("content-type", "application/x-ndjson"))
            .and(body_string_contains(r#""_id":"lamp""#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let record = IndexRecord {
            id: "lamp".into(),
            text: "Lamp".into(),
            name: "Lamp".into(),
            category: "home".into(),
            price_cents: 100,
        };
        client(&server.uri()).upsert_records(&[record]).await.unwrap();
    }

    #[tokio::test]
    async fn search_returns_hit_ids_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/records/namespaces/products/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "hits": [
                    { "_id": "b", "_score": 0.9, "fields": {} },
                    { "_id": "a", "_score": 0.4, "fields": {} }
                ]},
                "usage": { "read_units": 1 }
            })))
            .mount(&server)
            .await;

        let ids = client(&server.uri()).search("warm hat", 5).await.unwrap();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).search("x", 1).await.unwrap_err();
        match err {
            PineconeError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
