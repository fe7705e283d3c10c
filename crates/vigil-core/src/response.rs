use crate::error::{ProbeError, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// An HTTP response observed by a probe
///
/// Immutable once built. Headers keep the order and spelling they arrived
/// with; lookups by name are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseSnapshot {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl HttpResponseSnapshot {
    /// Create a snapshot with the given status, no headers and an empty body
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Materialize a live reqwest response, reading its full body
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::transport(format!("Failed to read response body: {}", e)))?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value with a matching name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

impl Serialize for HttpResponseSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("HttpResponseSnapshot", 3)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("headers", &self.headers)?;
        state.serialize_field("body", &self.text())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = HttpResponseSnapshot::new(200)
            .with_header("Content-Type", "text/html")
            .with_header("X-Request-Id", "abc");
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_json_body() {
        #[derive(Deserialize)]
        struct Health {
            ok: bool,
        }

        let response = HttpResponseSnapshot::new(200).with_body(r#"{"ok":true}"#);
        let health: Health = response.json().unwrap();
        assert!(health.ok);
    }

    #[test]
    fn test_invalid_json_body_is_logic_error() {
        let response = HttpResponseSnapshot::new(200).with_body("not json");
        let result = response.json::<serde_json::Value>();
        assert!(matches!(result, Err(ProbeError::Logic { .. })));
    }

    #[test]
    fn test_serialize_renders_body_as_text() {
        let response = HttpResponseSnapshot::new(503)
            .with_header("Retry-After", "10")
            .with_body("down");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], 503);
        assert_eq!(value["body"], "down");
        assert_eq!(value["headers"][0][0], "Retry-After");
    }

    #[tokio::test]
    async fn test_from_reqwest_reads_status_headers_and_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = "HTTP/1.1 418 I'm a teapot\r\nX-Brew: earl-grey\r\nContent-Length: 5\r\nConnection: close\r\n\r\nshort";
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        let resp = reqwest::get(format!("http://127.0.0.1:{}/", port))
            .await
            .unwrap();
        let snapshot = HttpResponseSnapshot::from_reqwest(resp).await.unwrap();

        assert_eq!(snapshot.status(), 418);
        assert_eq!(snapshot.header("x-brew"), Some("earl-grey"));
        assert_eq!(snapshot.text(), "short");

        server.abort();
    }
}
