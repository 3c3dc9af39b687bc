//! HTTP transport for the desk's `/api/method/<name>` endpoints.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use super::{RemoteError, Transport, decode_failure, decode_success};
use crate::config::ServerConfig;
use crate::constants::{CSRF_HEADER, CSRF_PLACEHOLDER, SITE_NAME_HEADER};

/// Posts JSON bodies to remote procedures over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Create a transport from the server section of the configuration.
    pub fn new(server: &ServerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), server)
    }

    /// Create a transport reusing an existing client.
    pub fn with_client(client: reqwest::Client, server: &ServerConfig) -> Self {
        Self {
            client,
            base_url: server.base_url.trim_end_matches('/').to_string(),
            headers: default_headers(server.site_name.as_deref(), server.csrf_token.as_deref()),
        }
    }

    /// Headers attached to every call.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Endpoint URL for a procedure.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }

    /// Resolve a site-relative URL (`/files/...`) against the base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url.to_string()
        }
    }
}

/// Build the header set: JSON content negotiation, the site name, and the
/// CSRF token when one was rendered into the page.
pub fn default_headers(site_name: Option<&str>, csrf_token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );

    if let Some(site) = site_name.filter(|s| !s.is_empty()) {
        match HeaderValue::from_str(site) {
            Ok(value) => {
                headers.insert(SITE_NAME_HEADER, value);
            }
            Err(e) => log::warn!("Skipping site name header: {}", e),
        }
    }

    if let Some(token) = csrf_token.filter(|t| !t.is_empty() && *t != CSRF_PLACEHOLDER) {
        match HeaderValue::from_str(token) {
            Ok(value) => {
                headers.insert(CSRF_HEADER, value);
            }
            Err(e) => log::warn!("Skipping CSRF header: {}", e),
        }
    }

    headers
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, args: Value) -> Result<Value, RemoteError> {
        let body = serde_json::to_vec(&args).map_err(|e| RemoteError::invalid_request(method, e))?;
        log::debug!("📡 POST {} ({} bytes)", method, body.len());

        let response = self
            .client
            .post(self.method_url(method))
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ {} request failed: {}", method, e);
                RemoteError::network(method, e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::network(method, e))?;

        if status.is_success() {
            decode_success(method, &text)
        } else {
            Err(decode_failure(method, status.as_u16(), &text))
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let url = self.resolve_url(url);
        log::debug!("📥 GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::network(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::rejected(
                &url,
                status.as_u16(),
                None,
                status.canonical_reason().map(str::to_string),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::network(&url, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(csrf: Option<&str>) -> ServerConfig {
        ServerConfig {
            base_url: "https://clinic.example.org/".to_string(),
            site_name: Some("clinic.example.org".to_string()),
            csrf_token: csrf.map(str::to_string),
        }
    }

    #[test]
    fn test_method_url_strips_trailing_slash() {
        let transport = HttpTransport::new(&server(None));
        assert_eq!(
            transport.method_url("annotation.api.annotations_records"),
            "https://clinic.example.org/api/method/annotation.api.annotations_records"
        );
    }

    #[test]
    fn test_csrf_header_attached_when_rendered() {
        let transport = HttpTransport::new(&server(Some("abc123")));
        assert_eq!(transport.headers().get(CSRF_HEADER).unwrap(), "abc123");
        assert_eq!(
            transport.headers().get(SITE_NAME_HEADER).unwrap(),
            "clinic.example.org"
        );
        assert_eq!(
            transport.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_csrf_placeholder_is_not_sent() {
        let transport = HttpTransport::new(&server(Some("{{ csrf_token }}")));
        assert!(transport.headers().get(CSRF_HEADER).is_none());

        let transport = HttpTransport::new(&server(None));
        assert!(transport.headers().get(CSRF_HEADER).is_none());
    }

    #[test]
    fn test_resolve_relative_file_url() {
        let transport = HttpTransport::new(&server(None));
        assert_eq!(
            transport.resolve_url("/files/front.png"),
            "https://clinic.example.org/files/front.png"
        );
        assert_eq!(
            transport.resolve_url("https://cdn.example.org/a.png"),
            "https://cdn.example.org/a.png"
        );
    }
}
