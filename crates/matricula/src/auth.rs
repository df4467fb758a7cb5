//! Cookie-session auth for the admin area. No process-wide state: a
//! [`SessionManager`] is constructed at startup from config and handed to
//! whatever needs it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Credenciales inválidas")]
    InvalidCredentials,
    #[error("Sesión inválida o expirada")]
    Unauthorized,
    #[error("session store unavailable: {0}")]
    Store(String),
}

/// Storage abstraction for active sessions.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session) -> Result<(), AuthError>;
    fn fetch(&self, token: &SessionToken) -> Result<Option<Session>, AuthError>;
    fn revoke(&self, token: &SessionToken) -> Result<(), AuthError>;
}

pub struct SessionManager<S> {
    store: Arc<S>,
    admin_email: String,
    admin_password: String,
    ttl: Duration,
}

impl<S: SessionStore + 'static> SessionManager<S> {
    pub fn from_config(store: Arc<S>, config: &AuthConfig) -> Self {
        Self {
            store,
            admin_email: config.admin_email.clone(),
            admin_password: config.admin_password.clone(),
            ttl: Duration::minutes(config.session_ttl_minutes),
        }
    }

    /// Verify credentials and mint a session. Wrong email and wrong password
    /// are indistinguishable to the caller.
    pub fn login(&self, credentials: &Credentials, now: DateTime<Utc>) -> Result<Session, AuthError> {
        if credentials.email.trim() != self.admin_email
            || credentials.password != self.admin_password
        {
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            token: SessionToken::generate(),
            user: SessionUser {
                email: self.admin_email.clone(),
            },
            expires_at: now + self.ttl,
        };
        self.store.insert(session.clone())?;
        Ok(session)
    }

    /// Resolve a cookie token to its user, revoking the session if expired.
    pub fn authenticate(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<SessionUser, AuthError> {
        let session = self.store.fetch(token)?.ok_or(AuthError::Unauthorized)?;
        if session.expires_at <= now {
            self.store.revoke(token)?;
            return Err(AuthError::Unauthorized);
        }
        Ok(session.user)
    }

    pub fn logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.store.revoke(token)
    }
}
