//! Session manager: sole owner of the authentication token and identity.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionManager` is the only writer of the persisted token/user pair.
//! The gateway reads credentials through `CredentialSource`, the route guard
//! reads the `AuthState` snapshot pushed to listeners, and navigation side
//! effects go through an injected `Navigator`.
//!
//! ERROR HANDLING
//! ==============
//! `login` reports failures to its caller and leaves the previous session in
//! place. `logout` and `expire` never fail: local state is cleared whatever
//! the backend says.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, PoisonError};

use crate::net::api;
use crate::net::error::GatewayError;
use crate::net::gateway::{Credential, CredentialSource, Gateway};
use crate::net::transport::Transport;
use crate::net::types::{LoginRequest, LoginResponse, Role, SessionUser, UserDto};
use crate::routing::AUTH_PATH;
use crate::util::clock;
use crate::util::jwt::{self, JwtClaims};
use crate::util::storage::{StorageError, TokenStore};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Navigates the app to a path.
pub type Navigator = Arc<dyn Fn(&str) + Send + Sync>;
/// Observes every session transition.
pub type SessionListener = Arc<dyn Fn(&Session) + Send + Sync>;
/// Current time in Unix seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Token plus the identity derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user: SessionUser,
    pub claims: JwtClaims,
}

/// Client-held authentication status. A user exists only alongside a token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(AuthSession),
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(auth) => Some(&auth.token),
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(auth) => Some(&auth.user),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    pub fn expires_at(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(auth) => auth.claims.exp,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Server(String),
    #[error("login returned an unusable token: {0}")]
    InvalidToken(String),
    #[error("could not persist session: {0}")]
    Storage(#[from] StorageError),
}

impl From<GatewayError> for AuthError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(_) => Self::Network(err.user_message()),
            GatewayError::Http { status: 400 | 401 | 403, .. } | GatewayError::AuthExpired => {
                Self::InvalidCredentials(INVALID_CREDENTIALS_MESSAGE.to_owned())
            }
            GatewayError::Application { message, .. } => Self::InvalidCredentials(message),
            GatewayError::Http { message, .. } => Self::Server(message),
            GatewayError::Request(detail) => Self::Server(detail),
        }
    }
}

struct Inner {
    store: TokenStore,
    session: Mutex<Session>,
    navigator: Navigator,
    clock: Clock,
    listeners: Mutex<Vec<SessionListener>>,
}

/// Cloneable handle to the single session owner.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(store: TokenStore, navigator: Navigator) -> Self {
        Self::with_clock(store, navigator, Arc::new(clock::now_unix_secs))
    }

    pub fn with_clock(store: TokenStore, navigator: Navigator, clock: Clock) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                session: Mutex::new(Session::Anonymous),
                navigator,
                clock,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a listener; it is called immediately with the current
    /// session and then after every transition.
    pub fn subscribe(&self, listener: SessionListener) {
        listener(&self.current());
        self.inner.listeners.lock().unwrap_or_else(PoisonError::into_inner).push(listener);
    }

    pub fn current(&self) -> Session {
        self.inner.session.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current().token().map(str::to_owned)
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.current().user().cloned()
    }

    /// Role from the decoded token claims.
    pub fn role(&self) -> Option<Role> {
        self.current().role()
    }

    pub fn now(&self) -> i64 {
        (self.inner.clock)()
    }

    pub fn is_expired(&self, token: &str) -> bool {
        jwt::is_expired(token, self.now())
    }

    /// Rehydrate from persisted storage. Malformed or expired tokens are
    /// cleared silently.
    pub fn initialize(&self) {
        let Some(token) = self.inner.store.get_token() else {
            log::debug!("session: no persisted token");
            self.replace(Session::Anonymous);
            return;
        };
        if !jwt::has_valid_shape(&token) {
            log::warn!("session: discarding malformed token");
            self.discard();
            return;
        }
        if self.is_expired(&token) {
            log::info!("session: persisted token expired");
            self.discard();
            return;
        }
        let Ok(claims) = jwt::decode_claims(&token) else {
            self.discard();
            return;
        };

        let user = match self.inner.store.get_user() {
            Some(mut user) => {
                if let Some(role) = claims.role {
                    user.role = role;
                }
                user
            }
            None => {
                let Some(user) = claims.to_user() else {
                    log::warn!("session: token carries no subject and no user info is stored");
                    self.discard();
                    return;
                };
                if let Err(e) = self.inner.store.save_pair(&token, &user) {
                    log::error!("session: could not restore user info: {e}");
                    self.replace(Session::Anonymous);
                    return;
                }
                user
            }
        };

        log::info!("session: restored for {} ({})", user.username, user.role);
        self.replace(Session::Authenticated(AuthSession { token, user, claims }));
    }

    /// Authenticate against the backend and persist the new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the backend rejects the credentials, cannot
    /// be reached, returns an unusable token, or the session cannot be
    /// persisted. The previous session is left in place.
    pub async fn login<T: Transport>(
        &self,
        gateway: &Gateway<T>,
        credentials: &LoginRequest,
    ) -> Result<Session, AuthError> {
        let response = gateway.try_post_public(LOGIN_PATH, credentials).await.map_err(|e| {
            log::warn!("session: login for {} failed: {e}", credentials.username);
            AuthError::from(e)
        })?;
        let payload: LoginResponse = response.into_data().map_err(AuthError::InvalidToken)?;
        let session = self.establish(payload.token, payload.user.as_ref())?;
        log::info!("session: logged in as {}", credentials.username);
        Ok(session)
    }

    /// Notify the backend (best effort), clear local state, go to `/auth`.
    pub async fn logout<T: Transport>(&self, gateway: &Gateway<T>) {
        if let Some(Credential::Bearer(_)) = self.credential() {
            match gateway.try_post(LOGOUT_PATH, &serde_json::json!({})).await {
                Ok(_) => log::debug!("session: backend acknowledged logout"),
                Err(e) => log::warn!("session: backend logout failed, clearing locally: {e}"),
            }
        }
        self.discard();
        (self.inner.navigator)(AUTH_PATH);
    }

    /// Invalidate the session if it still holds `stale_token`. Returns
    /// whether anything was cleared; a repeat call for the same token is a
    /// no-op.
    pub fn expire(&self, stale_token: &str) -> bool {
        {
            let mut session = self.inner.session.lock().unwrap_or_else(PoisonError::into_inner);
            if session.token() != Some(stale_token) {
                return false;
            }
            *session = Session::Anonymous;
            self.inner.store.clear_token();
        }
        log::warn!("session: token {} rejected, signing out", jwt::redact(stale_token));
        self.notify(&Session::Anonymous);
        (self.inner.navigator)(AUTH_PATH);
        true
    }

    /// Expire the current token if its `exp` has passed.
    pub fn expire_if_stale(&self) -> bool {
        match self.token() {
            Some(token) if self.is_expired(&token) => self.expire(&token),
            _ => false,
        }
    }

    /// Startup check of a restored session against the backend. Signs out if
    /// `GET /api/auth/check` says the token is no longer authenticated,
    /// otherwise refreshes the identity from `GET /api/auth/current`. An
    /// unreachable backend leaves the session as restored.
    pub async fn revalidate<T: Transport>(&self, gateway: &Gateway<T>) {
        let Some(token) = self.token() else {
            return;
        };
        match api::check_session(gateway).await {
            Ok(status) if !status.authenticated => {
                log::info!("session: backend no longer recognizes the session");
                self.expire(&token);
                return;
            }
            Ok(_) => {}
            Err(e) => log::debug!("session: session check unavailable: {e}"),
        }
        if self.token().as_deref() != Some(token.as_str()) {
            return;
        }
        match api::current_user(gateway).await {
            Ok(user) => {
                if let Err(e) = self.update_user(&user) {
                    log::warn!("session: could not refresh user info: {e}");
                }
            }
            Err(e) => log::debug!("session: current user unavailable: {e}"),
        }
    }

    /// Refresh the stored identity from a backend user record, keeping the
    /// token. No-op when signed out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the pair cannot be rewritten.
    pub fn update_user(&self, dto: &UserDto) -> Result<(), AuthError> {
        let Session::Authenticated(mut auth) = self.current() else {
            return Ok(());
        };
        auth.user = SessionUser {
            id: dto.id.clone().or(auth.user.id),
            username: dto.username.clone(),
            role: auth.claims.role.or(dto.role).unwrap_or(auth.user.role),
        };
        self.inner.store.save_pair(&auth.token, &auth.user)?;
        self.replace(Session::Authenticated(auth));
        Ok(())
    }

    fn establish(&self, token: String, wire_user: Option<&UserDto>) -> Result<Session, AuthError> {
        if !jwt::has_valid_shape(&token) {
            return Err(AuthError::InvalidToken("malformed token".to_owned()));
        }
        if self.is_expired(&token) {
            return Err(AuthError::InvalidToken("token already expired".to_owned()));
        }
        let claims = jwt::decode_claims(&token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user = match wire_user {
            Some(dto) => SessionUser {
                id: dto.id.clone().or_else(|| claims.user_id.clone()),
                username: dto.username.clone(),
                role: claims.role.or(dto.role).unwrap_or_default(),
            },
            None => claims
                .to_user()
                .ok_or_else(|| AuthError::InvalidToken("token carries no subject".to_owned()))?,
        };

        let previous = self.current();
        if let Err(e) = self.inner.store.save_pair(&token, &user) {
            if let Session::Authenticated(prev) = &previous {
                if let Err(restore) = self.inner.store.save_pair(&prev.token, &prev.user) {
                    log::error!("session: could not restore previous session: {restore}");
                }
            }
            return Err(e.into());
        }

        let session = Session::Authenticated(AuthSession { token, user, claims });
        self.replace(session.clone());
        Ok(session)
    }

    fn discard(&self) {
        self.inner.store.clear_token();
        self.replace(Session::Anonymous);
    }

    fn replace(&self, next: Session) {
        {
            let mut session = self.inner.session.lock().unwrap_or_else(PoisonError::into_inner);
            *session = next.clone();
        }
        self.notify(&next);
    }

    fn notify(&self, session: &Session) {
        let listeners = self.inner.listeners.lock().unwrap_or_else(PoisonError::into_inner).clone();
        for listener in listeners {
            listener(session);
        }
    }
}

impl CredentialSource for SessionManager {
    fn credential(&self) -> Option<Credential> {
        let token = self.token()?;
        if self.is_expired(&token) {
            Some(Credential::Expired(token))
        } else {
            Some(Credential::Bearer(token))
        }
    }
}
