//! Raw HTTP transport seam under the gateway.
//!
//! Client-side (csr): real HTTP calls via `gloo-net`, raced against a
//! `gloo-timers` timeout.
//! Native builds and tests plug in their own `Transport` implementation.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL without the query string.
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body.
    pub body: Option<String>,
    /// Send browser cookies along with the request.
    pub include_cookies: bool,
    pub timeout_ms: u32,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a received response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures where no response was received.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request could not be sent: {0}")]
    Unreachable(String),
    #[error("request timed out after {0} ms")]
    Timeout(u32),
    #[error("request could not be built: {0}")]
    Invalid(String),
}

/// Sends one request and yields its response.
///
/// Futures are not required to be `Send`; everything runs on the browser's
/// single UI thread.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `fetch`-backed transport for the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport;

impl Transport for BrowserTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        #[cfg(feature = "csr")]
        {
            use futures::future::{Either, select};
            use gloo_net::http::{Method as GlooMethod, RequestBuilder};

            let method = match request.method {
                Method::Get => GlooMethod::GET,
                Method::Post => GlooMethod::POST,
                Method::Put => GlooMethod::PUT,
                Method::Delete => GlooMethod::DELETE,
            };
            let mut builder = RequestBuilder::new(&request.url).method(method);
            if !request.query.is_empty() {
                builder = builder.query(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if request.include_cookies {
                builder = builder.credentials(web_sys::RequestCredentials::Include);
            }
            let built = match request.body {
                Some(body) => builder.body(body),
                None => builder.build(),
            }
            .map_err(|e| TransportError::Invalid(e.to_string()))?;

            let send = Box::pin(built.send());
            let timeout = Box::pin(gloo_timers::future::TimeoutFuture::new(request.timeout_ms));
            match select(send, timeout).await {
                Either::Left((Ok(resp), _)) => {
                    let status = resp.status();
                    let body = resp.text().await.map_err(|e| TransportError::Unreachable(e.to_string()))?;
                    Ok(HttpResponse { status, body })
                }
                Either::Left((Err(e), _)) => Err(TransportError::Unreachable(e.to_string())),
                Either::Right(((), _)) => Err(TransportError::Timeout(request.timeout_ms)),
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = request;
            Err(TransportError::Unreachable("not available outside the browser".to_owned()))
        }
    }
}
