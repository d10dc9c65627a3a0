//! The override manager: display, save and reset of the administrator's
//! replacement rules, and their substitution into rule generation.

pub mod escape;

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthContext, AuthError, Capability, TokenAction, TokenIssuer};
use crate::db::{SettingsStore, StoreError};
use crate::models::DownloadMethod;
use crate::rules::{ProtectionFiles, RuleFilter, RulePipeline};

/// Settings key holding the encoded override.
pub const HTACCESS_RULES_KEY: &str = "htaccess_rules";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("not authorized: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write protection files: {0}")]
    Files(#[from] std::io::Error),
}

/// The override as held by a settings store.
///
/// Every call goes to the store; nothing is cached between calls.
#[derive(Clone)]
pub struct StoredOverride {
    store: Arc<dyn SettingsStore>,
}

impl StoredOverride {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// The decoded override, if one is stored.
    pub fn load(&self) -> Result<Option<String>, StoreError> {
        let stored = self.store.get(HTACCESS_RULES_KEY)?;
        // An empty value means no override, as with a missing one
        Ok(stored
            .filter(|s| !s.is_empty())
            .map(|s| escape::decode(&s)))
    }

    /// Encode and store `raw`, replacing any previous override.
    pub fn write(&self, raw: &str) -> Result<(), StoreError> {
        self.store.set(HTACCESS_RULES_KEY, &escape::sanitize(raw))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(HTACCESS_RULES_KEY)
    }

    /// The stored value exactly as persisted, still encoded.
    fn snapshot(&self) -> Result<Option<String>, StoreError> {
        self.store.get(HTACCESS_RULES_KEY)
    }

    /// Put back a value taken with [`StoredOverride::snapshot`].
    fn restore(&self, snapshot: Option<String>) -> Result<(), StoreError> {
        match snapshot {
            Some(encoded) => self.store.set(HTACCESS_RULES_KEY, &encoded),
            None => self.store.delete(HTACCESS_RULES_KEY),
        }
    }
}

impl RuleFilter for StoredOverride {
    /// Replace `rules` with the override when one is stored. The override
    /// applies to every delivery method.
    fn filter(&self, rules: String, _method: DownloadMethod) -> String {
        match self.load() {
            Ok(Some(content)) => content,
            Ok(None) => rules,
            Err(e) => {
                tracing::error!("Failed to read rules override, using defaults: {}", e);
                rules
            }
        }
    }
}

pub struct OverrideManager {
    stored: StoredOverride,
    pipeline: Arc<RulePipeline>,
    tokens: TokenIssuer,
    files: ProtectionFiles,
    method: DownloadMethod,
}

impl OverrideManager {
    pub fn new(
        stored: StoredOverride,
        pipeline: Arc<RulePipeline>,
        tokens: TokenIssuer,
        files: ProtectionFiles,
        method: DownloadMethod,
    ) -> Self {
        Self {
            stored,
            pipeline,
            tokens,
            files,
            method,
        }
    }

    pub fn method(&self) -> DownloadMethod {
        self.method
    }

    /// Issue an anti-forgery token for a form or link.
    pub fn issue_token(&self, action: TokenAction) -> String {
        self.tokens.issue(action)
    }

    /// The text to show in the editor: the decoded override, or the
    /// generated default when none is stored.
    pub fn display_content(&self) -> Result<String, StoreError> {
        Ok(match self.stored.load()? {
            Some(content) => content,
            None => self.pipeline.default_rules(self.method),
        })
    }

    /// The stored override without falling back to the default.
    pub fn current_override(&self) -> Result<Option<String>, StoreError> {
        self.stored.load()
    }

    /// Store `raw` as the override and rewrite the protection files.
    ///
    /// Nothing is written unless `auth` carries the capability and a valid
    /// save token. If the protection files cannot be written the previous
    /// override is restored.
    pub fn save(&self, raw: &str, auth: &AuthContext) -> Result<(), EditorError> {
        let principal = self.authorize(TokenAction::SaveRules, auth)?;

        let previous = self.stored.snapshot()?;
        self.stored.write(raw)?;
        self.regenerate_or_restore(previous)?;

        tracing::info!("Rules override saved by {}", principal);
        Ok(())
    }

    /// Remove the override so the generated default applies again.
    ///
    /// Same authorization and rollback as [`OverrideManager::save`].
    pub fn reset(&self, auth: &AuthContext) -> Result<(), EditorError> {
        let principal = self.authorize(TokenAction::ResetRules, auth)?;

        let previous = self.stored.snapshot()?;
        self.stored.clear()?;
        self.regenerate_or_restore(previous)?;

        tracing::info!("Rules override reset by {}", principal);
        Ok(())
    }

    /// Substitute the stored override for `default_rules`.
    pub fn override_rules(&self, default_rules: String, method: DownloadMethod) -> String {
        self.stored.filter(default_rules, method)
    }

    /// Write the protection files with the rules currently in effect.
    pub fn regenerate(&self, force: bool) -> Result<(), EditorError> {
        let rules = self.pipeline.rules(self.method);
        self.files.create(&rules, force)?;
        Ok(())
    }

    fn regenerate_or_restore(&self, previous: Option<String>) -> Result<(), EditorError> {
        let Err(e) = self.regenerate(true) else {
            return Ok(());
        };

        tracing::error!("Protection files not written, restoring previous override: {}", e);
        self.stored.restore(previous)?;
        Err(e)
    }

    fn authorize(&self, action: TokenAction, auth: &AuthContext) -> Result<String, AuthError> {
        let result = auth
            .require(Capability::ManageShopSettings)
            .map(|p| p.name.clone())
            .and_then(|name| {
                let token = auth.token.as_deref().ok_or(AuthError::MissingToken)?;
                self.tokens.verify(action, token)?;
                Ok(name)
            });

        if let Err(e) = &result {
            tracing::warn!("Rejected {}: {}", action.as_str(), e);
        }
        result
    }
}
