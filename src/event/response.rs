use crate::server::HttpResponse;
use http::header::LOCATION;
use http::StatusCode;
use serde_json::Value;

use super::core::EventType;

/// Redirect flavour for [`Event::redirect`](super::Event::redirect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectCode {
    /// 302 temporary redirect
    Found,
    /// 303 see other
    SeeOther,
}

/// Response decisions. Each maps to a fixed status code and is dispatched as
/// its own event cycle before being rendered with [`ResponseEvent::output`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// 200, carries the execution result
    Ok { body: Option<Value> },
    /// 302, carries the target URI
    Found { location: String },
    /// 303, carries the target URI
    SeeOther { location: String },
    /// 404, no action matched
    NotFound,
    /// 500, unhandled execution error
    ServerError { message: Option<String> },
}

impl ResponseEvent {
    #[must_use]
    pub fn ok(body: Option<Value>) -> Self {
        ResponseEvent::Ok { body }
    }

    #[must_use]
    pub fn redirect(location: impl Into<String>, code: RedirectCode) -> Self {
        let location = location.into();
        match code {
            RedirectCode::Found => ResponseEvent::Found { location },
            RedirectCode::SeeOther => ResponseEvent::SeeOther { location },
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ResponseEvent::Ok { .. } => StatusCode::OK,
            ResponseEvent::Found { .. } => StatusCode::FOUND,
            ResponseEvent::SeeOther { .. } => StatusCode::SEE_OTHER,
            ResponseEvent::NotFound => StatusCode::NOT_FOUND,
            ResponseEvent::ServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            ResponseEvent::Ok { .. } => EventType::Response200,
            ResponseEvent::Found { .. } => EventType::Response302,
            ResponseEvent::SeeOther { .. } => EventType::Response303,
            ResponseEvent::NotFound => EventType::Response404,
            ResponseEvent::ServerError { .. } => EventType::Response500,
        }
    }

    /// Target URI of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            ResponseEvent::Found { location } | ResponseEvent::SeeOther { location } => {
                Some(location)
            }
            _ => None,
        }
    }

    /// Render onto the outbound transport.
    ///
    /// Sets the status code; 200 writes the result as body, redirects write
    /// a `Location` header, 404 and 500 write no body.
    pub fn output(&self, out: &mut HttpResponse) {
        out.set_status(self.status());
        match self {
            ResponseEvent::Ok { body: Some(body) } => out.set_body(body.clone()),
            ResponseEvent::Found { location } | ResponseEvent::SeeOther { location } => {
                out.set_header(LOCATION, location);
            }
            _ => {}
        }
    }
}
