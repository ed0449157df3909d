use crate::error::RequestError;
use crate::ids::RequestId;
use crate::input::{Channel, Input};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, HOST, USER_AGENT};
use http::HeaderMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// The fixed set of HTTP methods the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Propfind,
    Put,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 10] = [
        HttpMethod::Connect,
        HttpMethod::Delete,
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Patch,
        HttpMethod::Post,
        HttpMethod::Propfind,
        HttpMethod::Put,
        HttpMethod::Trace,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Propfind => "PROPFIND",
            HttpMethod::Put => "PUT",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| RequestError::UnknownMethod(s.to_string()))
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = RequestError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Connect => http::Method::CONNECT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Post => http::Method::POST,
            // Extension method: always a valid token
            HttpMethod::Propfind => http::Method::from_bytes(b"PROPFIND").unwrap_or_default(),
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Trace => http::Method::TRACE,
        }
    }
}

/// Already-parsed description of an inbound request.
///
/// Produced by whatever ingests HTTP (a server, a raw request string, a test)
/// and turned into a [`Request`] with [`Request::from_descriptor`].
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    /// Method token (`GET`, `POST`, ...)
    pub method: String,
    /// Absolute URI, or an origin-form target resolved against the `Host` header
    pub uri: String,
    /// Header name/value pairs in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Option<String>,
    /// Peer address, when known
    pub remote_addr: Option<String>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}

/// An inbound HTTP request with its per-channel parameter containers.
///
/// Built once per request. The URI channel starts empty and is filled by the
/// action matcher with the named captures of the winning pattern.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: HttpMethod,
    uri: Url,
    hostname: String,
    port: u16,
    headers: HeaderMap,
    body: Option<String>,
    remote_addr: Option<String>,
    get_input: Input,
    post_input: Option<Input>,
    cookie_input: Input,
    uri_input: Input,
}

impl Request {
    /// Shorthand for a body-less request.
    pub fn new(method: HttpMethod, uri: &str) -> Result<Self, RequestError> {
        Self::from_descriptor(RequestDescriptor::new(method.as_str(), uri))
    }

    /// Build a request from an already-parsed descriptor.
    pub fn from_descriptor(desc: RequestDescriptor) -> Result<Self, RequestError> {
        let method: HttpMethod = desc.method.parse()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &desc.headers {
            let name = HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|e| RequestError::Malformed(format!("header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value.trim())
                .map_err(|e| RequestError::Malformed(format!("header value for `{name}`: {e}")))?;
            headers.append(name, value);
        }

        let uri = resolve_uri(&desc.uri, &headers)?;
        let hostname = uri.host_str().unwrap_or_default().to_string();
        let port = uri.port_or_known_default().unwrap_or(80);

        let get_input = Input::from_pairs(uri.query_pairs().map(|(k, v)| (k, v.into_owned())));
        let cookie_input = Input::from_pairs(parse_cookies(&headers));

        let post_input = if method == HttpMethod::Post {
            Some(parse_post_body(desc.body.as_deref(), &headers)?)
        } else {
            None
        };

        debug!(
            method = %method,
            uri = %uri,
            get_params = get_input.len(),
            cookies = cookie_input.len(),
            "Request constructed"
        );

        Ok(Self {
            id: RequestId::from_header_or_new(
                headers.get("x-request-id").and_then(|v| v.to_str().ok()),
            ),
            method,
            uri,
            hostname,
            port,
            headers,
            body: desc.body,
            remote_addr: desc.remote_addr,
            get_input,
            post_input,
            cookie_input,
            uri_input: Input::new(),
        })
    }

    /// Parse a raw HTTP/1.x request (request line, headers, blank line, body).
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let (head, body) = split_head_body(raw);
        let mut lines = head.lines();
        let request_line = lines
            .next()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| RequestError::Malformed("missing request line".to_string()))?;

        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
            return Err(RequestError::Malformed(format!(
                "invalid request line `{request_line}`"
            )));
        };

        let mut desc = RequestDescriptor::new(method, target);
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| RequestError::Malformed(format!("invalid header line `{line}`")))?;
            desc = desc.header(name.trim(), value.trim());
        }
        if !body.is_empty() {
            desc = desc.body(body);
        }
        Self::from_descriptor(desc)
    }

    /// Read and parse a raw request stored in a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// URI path, percent-encoded as received.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn get_input(&self) -> &Input {
        &self.get_input
    }

    /// POST data; only present for POST requests.
    #[must_use]
    pub fn post_input(&self) -> Option<&Input> {
        self.post_input.as_ref()
    }

    #[must_use]
    pub fn cookie_input(&self) -> &Input {
        &self.cookie_input
    }

    #[must_use]
    pub fn uri_input(&self) -> &Input {
        &self.uri_input
    }

    /// Container for one channel. A missing POST channel reads as empty.
    #[must_use]
    pub fn channel(&self, channel: Channel) -> Option<&Input> {
        match channel {
            Channel::Get => Some(&self.get_input),
            Channel::Post => self.post_input.as_ref(),
            Channel::Cookie => Some(&self.cookie_input),
            Channel::Uri => Some(&self.uri_input),
        }
    }

    /// Merge parameters extracted by the matcher into the URI channel.
    pub(crate) fn merge_uri_input(&mut self, captures: &Input) {
        self.uri_input.merge(captures);
    }

    /// Build the controller-input view by merging `channels` in order; later
    /// channels win on key collisions.
    #[must_use]
    pub fn controller_input(&self, channels: &[Channel]) -> Input {
        let mut view = Input::new();
        for channel in channels {
            if let Some(input) = self.channel(*channel) {
                view.merge(input);
            }
        }
        view
    }
}

fn resolve_uri(raw: &str, headers: &HeaderMap) -> Result<Url, RequestError> {
    let invalid = |source| RequestError::InvalidUri {
        uri: raw.to_string(),
        source,
    };

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Url::parse(raw).map_err(invalid);
    }
    if !raw.starts_with('/') {
        return Err(RequestError::Malformed(format!(
            "request target `{raw}` is neither absolute nor origin-form"
        )));
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    Url::parse(&format!("http://{host}{raw}")).map_err(invalid)
}

fn split_head_body(raw: &str) -> (&str, &str) {
    if let Some(pos) = raw.find("\r\n\r\n") {
        (&raw[..pos], &raw[pos + 4..])
    } else if let Some(pos) = raw.find("\n\n") {
        (&raw[..pos], &raw[pos + 2..])
    } else {
        (raw, "")
    }
}

/// Parse `name=value` pairs from every `Cookie` header.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|c| c.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((name.to_string(), value))
        })
        .collect()
}

fn parse_post_body(body: Option<&str>, headers: &HeaderMap) -> Result<Input, RequestError> {
    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return Ok(Input::new());
    };

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/x-www-form-urlencoded");

    if content_type.starts_with("application/json") {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Ok(Input::from_value(value))
    } else {
        Ok(Input::from_pairs(
            url::form_urlencoded::parse(body.trim().as_bytes()).map(|(k, v)| (k, v.into_owned())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_roundtrip_through_http_crate() {
        for method in HttpMethod::ALL {
            let http_method: http::Method = method.into();
            assert_eq!(HttpMethod::try_from(&http_method).unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(matches!(
            "BREW".parse::<HttpMethod>(),
            Err(RequestError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_origin_form_uses_host_header() {
        let req = Request::from_descriptor(
            RequestDescriptor::new("GET", "/user/42?tab=info").header("Host", "example.com:8080"),
        )
        .unwrap();
        assert_eq!(req.hostname(), "example.com");
        assert_eq!(req.port(), 8080);
        assert_eq!(req.path(), "/user/42");
        assert_eq!(req.get_input().get_str("tab"), Some("info"));
    }

    #[test]
    fn test_post_input_only_for_post() {
        let get = Request::from_descriptor(
            RequestDescriptor::new("GET", "http://example.com/").body("a=1"),
        )
        .unwrap();
        assert!(get.post_input().is_none());

        let post = Request::from_descriptor(
            RequestDescriptor::new("POST", "http://example.com/").body("a=1&b[c]=2"),
        )
        .unwrap();
        let post_input = post.post_input().unwrap();
        assert_eq!(post_input.get_str("a"), Some("1"));
        assert_eq!(post_input.get_str("b.c"), Some("2"));
    }

    #[test]
    fn test_json_post_body() {
        let req = Request::from_descriptor(
            RequestDescriptor::new("POST", "http://example.com/")
                .header("Content-Type", "application/json")
                .body(r#"{"user": {"email": "a@b.c"}}"#),
        )
        .unwrap();
        assert_eq!(
            req.post_input().unwrap().get("user.email"),
            Some(&json!("a@b.c"))
        );
    }

    #[test]
    fn test_cookies_parsed() {
        let req = Request::from_descriptor(
            RequestDescriptor::new("GET", "http://example.com/")
                .header("Cookie", "SID=abc; theme=dark%20blue"),
        )
        .unwrap();
        assert_eq!(req.cookie_input().get_str("SID"), Some("abc"));
        assert_eq!(req.cookie_input().get_str("theme"), Some("dark blue"));
    }

    #[test]
    fn test_parse_raw_request() {
        let raw = "POST /login HTTP/1.1\r\nHost: app.local\r\nContent-Type: application/x-www-form-urlencoded\r\n\r\nuser=ada&pass=secret";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.method(), HttpMethod::Post);
        assert_eq!(req.hostname(), "app.local");
        assert_eq!(req.post_input().unwrap().get_str("user"), Some("ada"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Request::parse(""), Err(RequestError::Malformed(_))));
        assert!(matches!(
            Request::parse("GET\r\n\r\n"),
            Err(RequestError::Malformed(_))
        ));
        assert!(matches!(
            Request::parse("GET relative HTTP/1.1\r\n\r\n"),
            Err(RequestError::Malformed(_))
        ));
    }

    #[test]
    fn test_controller_input_precedence() {
        let mut req = Request::from_descriptor(
            RequestDescriptor::new("GET", "http://example.com/?id=from-get&page=2")
                .header("Cookie", "id=from-cookie"),
        )
        .unwrap();
        req.merge_uri_input(&Input::from_pairs([("id", "from-uri")]));

        let view = req.controller_input(&Channel::DEFAULT_ORDER);
        assert_eq!(view.get_str("id"), Some("from-uri"));
        assert_eq!(view.get_str("page"), Some("2"));

        let view = req.controller_input(&[Channel::Uri, Channel::Cookie]);
        assert_eq!(view.get_str("id"), Some("from-cookie"));
        assert!(view.get("page").is_none());
    }
}
