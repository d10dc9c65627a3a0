//! Application wiring.
//!
//! [`AppState::wire`] builds every component once and registers the stored
//! override as the only filter on rule generation.

use std::sync::Arc;

use crate::api::SecurityConfig;
use crate::auth::TokenIssuer;
use crate::config::{EditorConfig, ServerEnvironment};
use crate::db::SettingsStore;
use crate::editor::{OverrideManager, StoredOverride};
use crate::models::DownloadMethod;
use crate::rules::{DefaultRuleGenerator, ProtectionFiles, RulePipeline};

#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<OverrideManager>,
    pub pipeline: Arc<RulePipeline>,
    pub security: SecurityConfig,
    pub server: ServerEnvironment,
}

impl AppState {
    pub fn wire(config: &EditorConfig, store: Arc<dyn SettingsStore>) -> Self {
        let stored = StoredOverride::new(store);

        let pipeline = Arc::new(
            RulePipeline::new(Arc::new(DefaultRuleGenerator::new(
                config.allowed_filetypes.clone(),
            )))
            .with_filter(Arc::new(stored.clone())),
        );

        let files = ProtectionFiles::new(config.protected_dir.clone(), config.server.clone());
        let tokens = TokenIssuer::new(config.token_ttl);

        let editor = Arc::new(OverrideManager::new(
            stored,
            pipeline.clone(),
            tokens,
            files,
            config.method,
        ));

        Self {
            editor,
            pipeline,
            security: SecurityConfig::from_config(config),
            server: config.server.clone(),
        }
    }

    pub fn method(&self) -> DownloadMethod {
        self.editor.method()
    }
}
