//! Request handlers selected by the dispatcher.
//!
//! Handlers never fail: every error is logged and mapped to a status response here.
pub mod echo;
pub mod mock;
pub mod proxy;
pub mod static_content;

use axum::body::Body as AxumBody;
use hyper::{Response, StatusCode, header, header::HeaderValue};

pub use echo::EchoHandler;
pub use mock::{MockError, MockHandler, discover_endpoints};
pub use proxy::ReverseProxyHandler;
pub use static_content::{ContentSource, StaticContentHandler};

/// Short plain-text error response, `message` followed by a newline.
pub(crate) fn plain_error(status: StatusCode, message: &str) -> Response<AxumBody> {
    let mut response = Response::new(AxumBody::from(format!("{message}\n")));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}
