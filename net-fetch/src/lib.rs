//! reqwest-backed implementation of the `NetworkFetch` port.

use async_trait::async_trait;
use bunker::domain::{FetchRequest, FetchResponse};
use bunker::ports::NetworkFetch;
use shared::{Error, Result};

/// Forwards requests to the origin over HTTP. Timeouts and connection
/// pooling are left to reqwest's defaults; HTTP error statuses come back as
/// responses, only transport failures are errors.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkFetch for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(FetchResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunker::domain::FetchRequest;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_a_page_from_the_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>home</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let request = FetchRequest::get(Url::parse(&server.uri()).unwrap());
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(&response.body[..], &b"<html>home</html>"[..]);
    }

    #[tokio::test]
    async fn http_error_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let response = fetcher.fetch(&FetchRequest::get(url)).await.unwrap();

        assert_eq!(response.status.as_u16(), 404);
    }

    #[tokio::test]
    async fn unreachable_origin_is_a_network_error() {
        let fetcher = HttpFetcher::new();
        // Reserved port 9 on localhost, nothing listens there.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = fetcher.fetch(&FetchRequest::get(url)).await;

        assert!(matches!(result, Err(Error::Network(_))));
    }
}
