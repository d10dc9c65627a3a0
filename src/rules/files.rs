use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ServerEnvironment;

pub const HTACCESS_FILE: &str = ".htaccess";
pub const INDEX_FILE: &str = "index.php";

const INDEX_CONTENTS: &str = "<?php // Silence is golden.";

/// The files that keep the protected download directory closed.
#[derive(Debug, Clone)]
pub struct ProtectionFiles {
    dir: PathBuf,
    server: ServerEnvironment,
}

impl ProtectionFiles {
    pub fn new(dir: impl Into<PathBuf>, server: ServerEnvironment) -> Self {
        Self {
            dir: dir.into(),
            server,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn htaccess_path(&self) -> PathBuf {
        self.dir.join(HTACCESS_FILE)
    }

    /// Write the protection files for `rules`.
    ///
    /// The blank index is only created when missing. `.htaccess` is written
    /// when missing, when `force` is set, or when its contents differ from
    /// `rules`, and only on Apache.
    pub fn create(&self, rules: &str, force: bool) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let index = self.dir.join(INDEX_FILE);
        if !index.exists() {
            fs::write(&index, INDEX_CONTENTS)?;
        }

        if !self.server.is_apache() {
            tracing::debug!(
                "Skipping {} for server {:?}",
                HTACCESS_FILE,
                self.server.software()
            );
            return Ok(());
        }

        let path = self.htaccess_path();
        let stale = force
            || match fs::read_to_string(&path) {
                Ok(current) => current.is_empty() || current != rules,
                Err(e) if e.kind() == io::ErrorKind::NotFound => true,
                Err(e) => return Err(e),
            };

        if stale {
            fs::write(&path, rules)?;
            tracing::info!("Wrote protection rules to {}", path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apache() -> ServerEnvironment {
        ServerEnvironment::new("Apache/2.4")
    }

    #[test]
    fn creates_directory_index_and_rules() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("edd");
        let files = ProtectionFiles::new(&dir, apache());

        files.create("deny from all", false).unwrap();

        assert_eq!(
            fs::read_to_string(dir.join(INDEX_FILE)).unwrap(),
            INDEX_CONTENTS
        );
        assert_eq!(
            fs::read_to_string(dir.join(HTACCESS_FILE)).unwrap(),
            "deny from all"
        );
    }

    #[test]
    fn rewrites_rules_when_contents_differ() {
        let tmp = tempfile::tempdir().unwrap();
        let files = ProtectionFiles::new(tmp.path(), apache());

        files.create("old", false).unwrap();
        files.create("new", false).unwrap();

        assert_eq!(fs::read_to_string(files.htaccess_path()).unwrap(), "new");
    }

    #[test]
    fn leaves_existing_index_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(INDEX_FILE), "custom").unwrap();
        let files = ProtectionFiles::new(tmp.path(), apache());

        files.create("rules", true).unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join(INDEX_FILE)).unwrap(),
            "custom"
        );
    }

    #[test]
    fn skips_rules_on_other_servers() {
        let tmp = tempfile::tempdir().unwrap();
        let files = ProtectionFiles::new(tmp.path(), ServerEnvironment::new("nginx"));

        files.create("rules", true).unwrap();

        assert!(tmp.path().join(INDEX_FILE).exists());
        assert!(!files.htaccess_path().exists());
    }
}
