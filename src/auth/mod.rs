//! Authorization for changes to the stored rules.
//!
//! A change needs two things: a [`Principal`] holding
//! [`Capability::ManageShopSettings`], and a one-time anti-forgery token
//! issued by [`TokenIssuer`] for the same [`TokenAction`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageShopSettings,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManageShopSettings => f.write_str("manage_shop_settings"),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl Principal {
    /// The shop administrator.
    pub fn administrator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: vec![Capability::ManageShopSettings],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// The state-changing actions guarded by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAction {
    SaveRules,
    ResetRules,
}

impl TokenAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaveRules => "save_htaccess_file",
            Self::ResetRules => "reset_htaccess_file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("anti-forgery token missing")]
    MissingToken,

    #[error("anti-forgery token invalid")]
    InvalidToken,

    #[error("anti-forgery token expired")]
    ExpiredToken,

    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("caller lacks capability {0}")]
    MissingCapability(Capability),
}

/// What a caller presents with a state-changing request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub token: Option<String>,
    pub principal: Option<Principal>,
}

impl AuthContext {
    pub fn new(token: Option<String>, principal: Option<Principal>) -> Self {
        Self { token, principal }
    }

    /// Check the principal holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<&Principal, AuthError> {
        let principal = self.principal.as_ref().ok_or(AuthError::Unauthenticated)?;
        if principal.can(capability) {
            Ok(principal)
        } else {
            Err(AuthError::MissingCapability(capability))
        }
    }
}

#[derive(Debug)]
struct IssuedToken {
    action: TokenAction,
    expires_at: Instant,
}

/// In-memory issuer of one-time anti-forgery tokens.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    ttl: Duration,
    issued: Arc<Mutex<HashMap<String, IssuedToken>>>,
}

impl TokenIssuer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue a fresh token for `action`.
    pub fn issue(&self, action: TokenAction) -> String {
        let now = Instant::now();
        let token = Uuid::new_v4().simple().to_string();

        let mut issued = self.issued.lock().expect("token lock poisoned");
        issued.retain(|_, t| t.expires_at > now);
        issued.insert(
            token.clone(),
            IssuedToken {
                action,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Verify and consume `token`. A token issued for another action is
    /// rejected and stays unconsumed.
    pub fn verify(&self, action: TokenAction, token: &str) -> Result<(), AuthError> {
        let mut issued = self.issued.lock().expect("token lock poisoned");

        match issued.get(token) {
            None => Err(AuthError::InvalidToken),
            Some(t) if t.action != action => Err(AuthError::InvalidToken),
            Some(t) if t.expires_at <= Instant::now() => {
                issued.remove(token);
                Err(AuthError::ExpiredToken)
            }
            Some(_) => {
                issued.remove(token);
                Ok(())
            }
        }
    }

    /// Number of outstanding tokens, expired ones included.
    pub fn outstanding(&self) -> usize {
        self.issued.lock().expect("token lock poisoned").len()
    }
}
