use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// A request intercepted from the controlled scope.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The cache key for this request: method plus full URL.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    pub fn is_retrieval(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    pub fn accepts(&self, mime: &str) -> bool {
        self.headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|accept| accept.contains(mime))
            .unwrap_or(false)
    }

    pub fn same_origin_as(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}

/// A response on its way back to the controlled scope.
#[derive(Clone, Debug)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn is_plain_text(&self) -> bool {
        self.content_type()
            .map(|ct| ct.starts_with("text/plain"))
            .unwrap_or(false)
    }

    pub fn to_stored(&self) -> StoredResponse {
        StoredResponse {
            status: self.status.as_u16(),
            headers: self
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.to_string(), v.to_string()))
                })
                .collect(),
            body: self.body.to_vec(),
        }
    }
}

/// Serde-friendly captured response, the form partitions persist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
}

impl StoredResponse {
    pub fn into_response(self) -> FetchResponse {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        FetchResponse {
            status: StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK),
            headers,
            body: Bytes::from(self.body),
        }
    }
}

/// Identifies the currently active cache generation. The partition name embeds
/// the version tag so a bump forces the activation sweep to evict everything
/// from older generations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    pub namespace: String,
    pub version: String,
}

impl Generation {
    pub fn new(namespace: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            version: version.into(),
        }
    }

    /// Name of the current generation's partition, e.g. `"2.1.0::bunker-site"`.
    pub fn partition_name(&self) -> String {
        format!("{}::{}", self.version, self.namespace)
    }

    /// Whether a partition name belongs to this component's naming scheme.
    /// Partitions created by anyone else are never touched by the sweep.
    pub fn owns(&self, partition_name: &str) -> bool {
        partition_name.ends_with(&format!("::{}", self.namespace))
    }

    pub fn is_current(&self, partition_name: &str) -> bool {
        partition_name == self.partition_name()
    }
}

/// How an incoming request is handled. Computed fresh for every request,
/// never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestClass {
    /// Any non-retrieval method. Forwarded, never cached.
    NonIdempotent,
    /// Same-origin retrieval that expects an HTML document.
    Navigation,
    /// Retrieval that expects text/plain. Excluded from the caching policy.
    PlainText,
    /// Any other same-origin retrieval (images, styles, scripts, ...).
    Resource,
    /// Cross-origin retrieval. Left to default network behavior.
    External,
}

impl RequestClass {
    /// Classification predicate, evaluated in priority order. When
    /// `same_origin_only` is false the origin restriction is lifted and
    /// cross-origin retrievals classify like local ones.
    pub fn classify(request: &FetchRequest, origin: &Url, same_origin_only: bool) -> Self {
        if !request.is_retrieval() {
            return RequestClass::NonIdempotent;
        }
        let in_scope = !same_origin_only || request.same_origin_as(origin);
        if request.method == Method::GET && request.accepts("text/html") && in_scope {
            return RequestClass::Navigation;
        }
        if request.accepts("text/plain") {
            return RequestClass::PlainText;
        }
        if in_scope {
            return RequestClass::Resource;
        }
        RequestClass::External
    }
}

pub mod response {

    /// Outcome of a successful install: the partition that now holds the seed
    /// set and the cache keys written into it.
    #[derive(Clone, Debug)]
    pub struct InstallReport {
        pub partition: String,
        pub seeded: Vec<String>,
    }

    impl InstallReport {
        pub fn new(partition: impl Into<String>, seeded: Vec<String>) -> Self {
            Self {
                partition: partition.into(),
                seeded,
            }
        }
    }

    /// Outcome of the activation sweep.
    #[derive(Clone, Debug)]
    pub struct SweepReport {
        pub deleted: Vec<String>,
        pub retained: Vec<String>,
    }

    impl SweepReport {
        pub fn new(deleted: Vec<String>, retained: Vec<String>) -> Self {
            Self { deleted, retained }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.org").unwrap()
    }

    fn html_request(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
            .with_header(ACCEPT, "text/html,application/xhtml+xml")
    }

    #[test]
    fn post_classifies_as_non_idempotent() {
        let request = FetchRequest::new(Method::POST, Url::parse("https://example.org/api").unwrap());
        assert_eq!(
            RequestClass::classify(&request, &origin(), true),
            RequestClass::NonIdempotent
        );
    }

    #[test]
    fn same_origin_html_classifies_as_navigation() {
        let request = html_request("https://example.org/blog/");
        assert_eq!(
            RequestClass::classify(&request, &origin(), true),
            RequestClass::Navigation
        );
    }

    #[test]
    fn cross_origin_html_is_external_when_restricted() {
        let request = html_request("https://elsewhere.net/page");
        assert_eq!(
            RequestClass::classify(&request, &origin(), true),
            RequestClass::External
        );
    }

    #[test]
    fn cross_origin_html_is_navigation_when_unrestricted() {
        let request = html_request("https://elsewhere.net/page");
        assert_eq!(
            RequestClass::classify(&request, &origin(), false),
            RequestClass::Navigation
        );
    }

    #[test]
    fn plain_text_accept_wins_over_resource() {
        let request = FetchRequest::get(Url::parse("https://example.org/robots.txt").unwrap())
            .with_header(ACCEPT, "text/plain");
        assert_eq!(
            RequestClass::classify(&request, &origin(), true),
            RequestClass::PlainText
        );
    }

    #[test]
    fn same_origin_asset_classifies_as_resource() {
        let request = FetchRequest::get(Url::parse("https://example.org/css/site.css").unwrap())
            .with_header(ACCEPT, "text/css,*/*");
        assert_eq!(
            RequestClass::classify(&request, &origin(), true),
            RequestClass::Resource
        );
    }

    #[test]
    fn generation_partition_naming_and_ownership() {
        let generation = Generation::new("ns", "v2");
        assert_eq!(generation.partition_name(), "v2::ns");
        assert!(generation.owns("v1::ns"));
        assert!(generation.owns("v2::ns"));
        assert!(!generation.owns("other"));
        assert!(generation.is_current("v2::ns"));
        assert!(!generation.is_current("v1::ns"));
    }

    #[test]
    fn stored_response_preserves_status_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/css"));
        let response = FetchResponse::new(StatusCode::OK, headers, "body { margin: 0 }");

        let restored = response.to_stored().into_response();
        assert_eq!(restored.status, StatusCode::OK);
        assert_eq!(restored.content_type(), Some("text/css"));
        assert_eq!(restored.body, Bytes::from("body { margin: 0 }"));
    }

    #[test]
    fn cache_key_includes_method_and_url() {
        let request = FetchRequest::get(Url::parse("https://example.org/a.png").unwrap());
        assert_eq!(request.cache_key(), "GET https://example.org/a.png");
    }
}
