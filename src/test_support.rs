//! Shared fixtures for unit tests: token builders and a scripted transport.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::config::ApiConfig;
use crate::net::gateway::{Credential, CredentialSource, Gateway};
use crate::net::transport::{HttpRequest, HttpResponse, Transport, TransportError};

pub const NOW: i64 = 1_700_000_000;

/// Unsigned compact JWT carrying `claims`.
pub fn make_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}

pub fn token_for(username: &str, role: &str, exp: i64) -> String {
    make_token(&serde_json::json!({
        "sub": username,
        "userId": 7,
        "role": role,
        "iat": exp - 3600,
        "exp": exp,
    }))
}

pub fn live_token(username: &str, role: &str) -> String {
    token_for(username, role, NOW + 3600)
}

pub fn json_response(status: u16, body: &serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse { status, body: body.to_string() })
}

/// Returns `Pending` on its first poll so sibling futures get to run.
#[derive(Default)]
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Replays canned results in order and records every request it sees.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
    yields: bool,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self { replies: Arc::new(Mutex::new(replies.into())), seen: Arc::default(), yields: false }
    }

    /// Like `new`, but every send suspends once after recording the request,
    /// so joined calls are all in flight before any reply lands.
    pub fn yielding(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self { yields: true, ..Self::new(replies) }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        if self.yields {
            YieldOnce::default().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("no scripted reply".to_owned())))
    }
}

/// Fixed credential for gateway tests.
pub struct StaticCredential(pub Option<Credential>);

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

pub fn gateway(transport: &ScriptedTransport) -> Gateway<ScriptedTransport> {
    Gateway::new(transport.clone(), ApiConfig::default())
}
