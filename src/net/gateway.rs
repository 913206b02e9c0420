//! HTTP gateway: credential attachment plus response/error normalization.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every REST call in the app goes through a `Gateway`. It reads the current
//! token through [`CredentialSource`] and reports rejected tokens through an
//! injected [`UnauthorizedHook`], so it never touches session storage or
//! navigation itself.
//!
//! ERROR HANDLING
//! ==============
//! Public methods never fail: network, HTTP, application and auth failures
//! all resolve to a `success = false` [`NormalizedResponse`]. The crate-level
//! `try_*` variants keep the [`GatewayError`] for callers that branch on it.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use std::sync::Arc;

use serde::Serialize;

use super::envelope::{NormalizedResponse, error_details, failure_message, normalize_body};
use super::error::GatewayError;
use super::transport::{HttpRequest, Method, Transport};
use crate::config::ApiConfig;
use crate::util::jwt;

/// Token available for the next request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    /// Present but already past its `exp`.
    Expired(String),
}

/// Read-only view of the session used for credential attachment.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Invoked with the rejected token when the server answers 401 or the token
/// is found expired before sending.
pub type UnauthorizedHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Credentialed,
    Public,
}

pub struct Gateway<T> {
    transport: Arc<T>,
    config: Arc<ApiConfig>,
    credentials: Option<Arc<dyn CredentialSource>>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl<T> Clone for Gateway<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            credentials: self.credentials.clone(),
            on_unauthorized: self.on_unauthorized.clone(),
        }
    }
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T, config: ApiConfig) -> Self {
        Self { transport: Arc::new(transport), config: Arc::new(config), credentials: None, on_unauthorized: None }
    }

    #[must_use]
    pub fn with_credentials(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(source);
        self
    }

    #[must_use]
    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> NormalizedResponse {
        self.call(Method::Get, path, query, Ok(None), Access::Credentialed).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> NormalizedResponse {
        self.call(Method::Post, path, &[], encode(body), Access::Credentialed).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> NormalizedResponse {
        self.call(Method::Put, path, &[], encode(body), Access::Credentialed).await
    }

    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> NormalizedResponse {
        self.call(Method::Delete, path, query, Ok(None), Access::Credentialed).await
    }

    /// GET without credentials, for health and other public endpoints.
    pub async fn get_public(&self, path: &str, query: &[(&str, &str)]) -> NormalizedResponse {
        self.call(Method::Get, path, query, Ok(None), Access::Public).await
    }

    /// POST without credentials. A 401 here never invalidates the session.
    pub async fn post_public<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> NormalizedResponse {
        self.call(Method::Post, path, &[], encode(body), Access::Public).await
    }

    pub(crate) async fn try_post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<NormalizedResponse, GatewayError> {
        self.dispatch(Method::Post, path, &[], encode(body)?, Access::Credentialed).await
    }

    pub(crate) async fn try_post_public<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<NormalizedResponse, GatewayError> {
        self.dispatch(Method::Post, path, &[], encode(body)?, Access::Public).await
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Result<Option<String>, GatewayError>,
        access: Access,
    ) -> NormalizedResponse {
        let result = match body {
            Ok(body) => self.dispatch(method, path, query, body, access).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(NormalizedResponse::from)
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
        access: Access,
    ) -> Result<NormalizedResponse, GatewayError> {
        let mut headers = vec![("Accept".to_owned(), "application/json".to_owned())];
        if body.is_some() {
            headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
        }

        let mut sent_token = None;
        if access == Access::Credentialed {
            match self.credentials.as_ref().and_then(|source| source.credential()) {
                Some(Credential::Bearer(token)) => {
                    headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
                    sent_token = Some(token);
                }
                Some(Credential::Expired(token)) => {
                    log::warn!("api: {method} {path} skipped, token {} expired", jwt::redact(&token));
                    self.notify_unauthorized(&token);
                    return Err(GatewayError::AuthExpired);
                }
                None => {}
            }
        }

        let request = HttpRequest {
            method,
            url: self.config.url(path),
            query: query.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
            headers,
            body,
            include_cookies: self.config.with_credentials,
            timeout_ms: self.config.timeout_ms,
        };
        log::debug!("api request: {method} {path} has_token={}", sent_token.is_some());

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("api error: {method} {path}: {e}");
                return Err(e.into());
            }
        };
        log::debug!("api response: {method} {path} status={}", response.status);

        if response.is_success() {
            let normalized = normalize_body(&response.body);
            if normalized.success {
                return Ok(normalized);
            }
            return Err(GatewayError::Application {
                message: failure_message(&normalized.message),
                code: normalized.code,
            });
        }

        if response.status == 401 {
            if let Some(token) = sent_token {
                log::warn!("api: {method} {path} rejected token {}", jwt::redact(&token));
                self.notify_unauthorized(&token);
                return Err(GatewayError::AuthExpired);
            }
        }

        let (message, code) = error_details(&response.body);
        log::warn!("api error: {method} {path} status={}", response.status);
        Err(GatewayError::http(response.status, message, code))
    }

    fn notify_unauthorized(&self, token: &str) {
        if let Some(hook) = &self.on_unauthorized {
            hook(token);
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Option<String>, GatewayError> {
    serde_json::to_string(body)
        .map(Some)
        .map_err(|e| GatewayError::Request(e.to_string()))
}
