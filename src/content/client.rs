use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::{PageSource, RawDocument, RawPage};

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors talking to the CMS.
///
/// Nothing here is retried; the caller decides whether to try again.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body was not the JSON shape expected
    #[error("Invalid response body: {0}")]
    Decode(String),
    /// API endpoint or continuation token is not an http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    /// The API root listed no master ref to query against
    #[error("CMS API returned no master ref")]
    NoMasterRef,
}

#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Client for the CMS document search API.
///
/// `endpoint` is the API root (for example
/// `https://my-repo.cdn.prismic.io/api/v2`). Every search first resolves the
/// repository's master ref from the root, then queries
/// `{endpoint}/documents/search`.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    endpoint: Url,
    page_size: u32,
    timeout: Duration,
}

impl CmsClient {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self, FetchError> {
        let endpoint = parse_http_url(endpoint.trim_end_matches('/'))?;
        Ok(Self {
            http,
            endpoint,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Looks up the ref marked `isMasterRef` on the API root.
    pub async fn master_ref(&self) -> Result<String, FetchError> {
        let info: ApiInfo = self.get_json(self.endpoint.clone()).await?;
        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(FetchError::NoMasterRef)
    }

    /// First page of every document of type `kind`.
    pub async fn get_by_type(&self, kind: &str) -> Result<RawPage, FetchError> {
        let predicate = format!("[[at(document.type,\"{}\")]]", escape_literal(kind));
        let page: RawPage = self.search(&predicate).await?;
        tracing::debug!(
            kind = %kind,
            results = page.results.as_ref().map_or(0, Vec::len),
            total = ?page.total_results_size,
            has_more = page.next_page.is_some(),
            "Fetched first page"
        );
        Ok(page)
    }

    /// The single document of type `kind` whose UID field equals `uid`.
    pub async fn get_by_uid(&self, kind: &str, uid: &str) -> Result<RawDocument, FetchError> {
        let predicate = format!(
            "[[at(my.{}.uid,\"{}\")]]",
            escape_literal(kind),
            escape_literal(uid)
        );
        let page = self.search(&predicate).await?;
        page.results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::NotFound(uid.to_string()))
    }

    /// Fetches the page behind a continuation token.
    ///
    /// The token is the opaque `next_page` URL from a previous page and is
    /// requested as-is.
    pub async fn get_next_page(&self, token: &str) -> Result<RawPage, FetchError> {
        let url = parse_http_url(token)?;
        self.get_json(url).await
    }

    async fn search(&self, predicate: &str) -> Result<RawPage, FetchError> {
        let master_ref = self.master_ref().await?;
        let page_size = self.page_size.to_string();

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["documents", "search"]);
        url.query_pairs_mut()
            .append_pair("ref", &master_ref)
            .append_pair("q", predicate)
            .append_pair("pageSize", &page_size);

        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::trace!(url = %url, "CMS request");

        // Deadline covers headers and the whole body.
        let bytes = tokio::time::timeout(self.timeout, self.get_bytes(&url))
            .await
            .map_err(|_| {
                tracing::warn!(
                    url = %url,
                    timeout_ms = self.timeout.as_millis(),
                    "CMS request timed out"
                );
                FetchError::Timeout
            })??;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "CMS request failed");
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }
}

impl PageSource for CmsClient {
    fn fetch_page(&self, token: &str) -> impl Future<Output = Result<RawPage, FetchError>> + Send {
        self.get_next_page(token)
    }
}

fn parse_http_url(s: &str) -> Result<Url, FetchError> {
    let url = Url::parse(s).map_err(|_| FetchError::InvalidUrl(s.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::InvalidUrl(s.to_string())),
    }
}

/// Escapes a value for use inside a double-quoted predicate literal.
fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_api_root(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "refs": [
                    { "id": "preview", "ref": "preview-ref", "isMasterRef": false },
                    { "id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true }
                ]
            })))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> CmsClient {
        CmsClient::new(reqwest::Client::new(), &format!("{}/api/v2", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_master_ref_picks_flagged_ref() {
        let server = MockServer::start().await;
        mount_api_root(&server).await;

        assert_eq!(client(&server).master_ref().await.unwrap(), "master-ref");
    }

    #[tokio::test]
    async fn test_master_ref_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "refs": [] })))
            .mount(&server)
            .await;

        let err = client(&server).master_ref().await.unwrap_err();
        assert!(matches!(err, FetchError::NoMasterRef));
    }

    #[tokio::test]
    async fn test_get_by_type_queries_search() {
        let server = MockServer::start().await;
        mount_api_root(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("ref", "master-ref"))
            .and(query_param("q", "[[at(document.type,\"posts\")]]"))
            .and(query_param("pageSize", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "total_pages": 2,
                "results_size": 2,
                "total_results_size": 3,
                "next_page": "https://cms.example.com/api/v2/documents/search?page=2",
                "results": [
                    { "uid": "a", "first_publication_date": "2021-01-15T00:00:00+0000", "data": { "title": "A" } },
                    { "uid": "b", "data": { "title": "B", "author": "Bia" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .with_page_size(2)
            .get_by_type("posts")
            .await
            .unwrap();

        let results = page.results.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].uid.as_deref(), Some("a"));
        assert_eq!(page.total_results_size, Some(3));
        assert!(page.next_page.is_some());
    }

    #[tokio::test]
    async fn test_get_by_uid_returns_first_match() {
        let server = MockServer::start().await;
        mount_api_root(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("q", "[[at(my.posts.uid,\"como-utilizar-hooks\")]]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "uid": "como-utilizar-hooks", "data": { "title": "Como utilizar Hooks" } }
                ],
                "next_page": null
            })))
            .mount(&server)
            .await;

        let doc = client(&server)
            .get_by_uid("posts", "como-utilizar-hooks")
            .await
            .unwrap();
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
    }

    #[tokio::test]
    async fn test_get_by_uid_not_found() {
        let server = MockServer::start().await;
        mount_api_root(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "results": [], "next_page": null })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .get_by_uid("posts", "nao-existe")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(uid) if uid == "nao-existe"));
    }

    #[tokio::test]
    async fn test_next_page_fetches_token_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [ { "uid": "c", "data": {} } ],
                "next_page": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = format!("{}/api/v2/documents/search?page=2", server.uri());
        let page = client(&server).fetch_page(&token).await.unwrap();
        assert_eq!(page.results.unwrap()[0].uid.as_deref(), Some("c"));
        assert!(page.next_page.is_none());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1) // no retry
            .mount(&server)
            .await;

        let token = format!("{}/page2", server.uri());
        let err = client(&server).get_next_page(&token).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let token = format!("{}/page2", server.uri());
        let err = client(&server).get_next_page(&token).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "results": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let token = format!("{}/page2", server.uri());
        let err = client(&server)
            .with_timeout(Duration::from_millis(50))
            .get_next_page(&token)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Headers and part of the body arrive, then the server goes quiet.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"results\": [",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = CmsClient::new(reqwest::Client::new(), &format!("http://{addr}/api/v2"))
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        let token = format!("http://{addr}/api/v2/documents/search?page=2");

        let result = tokio::time::timeout(Duration::from_secs(3), client.get_next_page(&token))
            .await
            .expect("request deadline must cover the response body");
        assert!(matches!(result, Err(FetchError::Timeout)));

        server.abort();
    }

    #[tokio::test]
    async fn test_non_http_token_rejected() {
        let client = CmsClient::new(reqwest::Client::new(), "https://cms.example.com/api/v2")
            .unwrap();
        let err = client.get_next_page("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));

        let err = client.get_next_page("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(CmsClient::new(reqwest::Client::new(), "ftp://cms.example.com").is_err());
        assert!(CmsClient::new(reqwest::Client::new(), "").is_err());
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("a\"b\\c"), "a\\\"b\\\\c");
    }
}
