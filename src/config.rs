//! Runtime configuration loaded from environment variables.
//!
//! - `HTACCESS_EDITOR_API_KEY` - bearer key for administrators (unset: local mode, everyone is admin)
//! - `HTACCESS_EDITOR_SERVER_SOFTWARE` - web server identification (falls back to `SERVER_SOFTWARE`)
//! - `HTACCESS_EDITOR_METHOD` - download method, `direct` or `redirect`
//! - `HTACCESS_EDITOR_PROTECTED_DIR` - directory holding the protected downloads
//! - `HTACCESS_EDITOR_ALLOWED_FILETYPES` - `|`-separated extensions left directly reachable
//! - `HTACCESS_EDITOR_TOKEN_TTL_SECS` - lifetime of anti-forgery tokens

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::models::DownloadMethod;

/// Server software assumed when nothing is configured.
const DEFAULT_SERVER_SOFTWARE: &str = "Apache";

/// Extensions reachable directly even under the `direct` method.
pub const DEFAULT_ALLOWED_FILETYPES: &str = "jpg|jpeg|png|gif|mp3|ogg";

/// Tokens stay valid for a day, matching the lifetime of a rendered admin page.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Identification of the web server in front of the protected directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEnvironment {
    software: String,
}

impl ServerEnvironment {
    pub fn new(software: impl Into<String>) -> Self {
        Self {
            software: software.into(),
        }
    }

    pub fn software(&self) -> &str {
        &self.software
    }

    /// Only Apache honors `.htaccess` files.
    pub fn is_apache(&self) -> bool {
        self.software.to_ascii_lowercase().contains("apache")
    }
}

#[derive(Clone, Debug)]
pub struct EditorConfig {
    pub api_key: Option<String>,
    pub server: ServerEnvironment,
    pub method: DownloadMethod,
    pub protected_dir: PathBuf,
    pub allowed_filetypes: String,
    pub token_ttl: Duration,
}

impl EditorConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("HTACCESS_EDITOR_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let software = std::env::var("HTACCESS_EDITOR_SERVER_SOFTWARE")
            .or_else(|_| std::env::var("SERVER_SOFTWARE"))
            .unwrap_or_else(|_| DEFAULT_SERVER_SOFTWARE.to_string());

        let method = std::env::var("HTACCESS_EDITOR_METHOD")
            .map(|m| DownloadMethod::parse(&m))
            .unwrap_or_default();

        let protected_dir = match std::env::var("HTACCESS_EDITOR_PROTECTED_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_protected_dir()?,
        };

        let allowed_filetypes = std::env::var("HTACCESS_EDITOR_ALLOWED_FILETYPES")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_FILETYPES.to_string());

        let token_ttl = std::env::var("HTACCESS_EDITOR_TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);

        Ok(Self {
            api_key,
            server: ServerEnvironment::new(software),
            method,
            protected_dir,
            allowed_filetypes,
            token_ttl,
        })
    }

    /// Local configuration rooted at `protected_dir`: Apache, direct delivery, no API key.
    pub fn local(protected_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: None,
            server: ServerEnvironment::new(DEFAULT_SERVER_SOFTWARE),
            method: DownloadMethod::Direct,
            protected_dir: protected_dir.into(),
            allowed_filetypes: DEFAULT_ALLOWED_FILETYPES.to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_server_software(mut self, software: impl Into<String>) -> Self {
        self.server = ServerEnvironment::new(software);
        self
    }

    pub fn with_method(mut self, method: DownloadMethod) -> Self {
        self.method = method;
        self
    }
}

fn default_protected_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "htaccess-editor")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("edd"))
}
