use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Outbound transport a response event renders itself into.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Replace a header; values that are not valid header text are dropped.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set the body; strings render as text, everything else as JSON.
    pub fn set_body(&mut self, body: Value) {
        let content_type = match body {
            Value::String(_) => "text/plain",
            _ => "application/json",
        };
        self.set_header(CONTENT_TYPE, content_type);
        self.body = Some(body);
    }

    /// Render as an HTTP/1.1 response message.
    #[must_use]
    pub fn to_wire(&self) -> String {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            status_reason(self.status)
        );
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value.to_str().unwrap_or_default()));
        }
        out.push_str("\r\n");
        match &self.body {
            Some(Value::String(s)) => out.push_str(s),
            Some(other) => out.push_str(&other.to_string()),
            None => {}
        }
        out
    }
}

fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::LOCATION;
    use serde_json::json;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(StatusCode::OK), "OK");
        assert_eq!(status_reason(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(status_reason(StatusCode::SEE_OTHER), "See Other");
    }

    #[test]
    fn test_body_sets_content_type() {
        let mut res = HttpResponse::default();
        res.set_body(json!({"ok": true}));
        assert_eq!(res.header("content-type"), Some("application/json"));
        res.set_body(json!("hello"));
        assert_eq!(res.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_wire_format() {
        let mut res = HttpResponse::new(StatusCode::FOUND);
        res.set_header(LOCATION, "http://example.com/next");
        let wire = res.to_wire();
        assert!(wire.starts_with("HTTP/1.1 302 Found\r\n"));
        assert!(wire.contains("location: http://example.com/next\r\n"));
        assert!(wire.ends_with("\r\n\r\n"));
    }
}
