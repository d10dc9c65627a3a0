use serde::{Deserialize, Serialize};

/// How files are delivered to customers.
///
/// - `Direct`: the file is streamed by the application, so the protected
///   directory denies all direct access except for media previews.
/// - `Redirect`: customers are redirected to the file, so the directory only
///   disables listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownloadMethod {
    #[default]
    Direct,
    Redirect,
}

impl DownloadMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Redirect => "redirect",
        }
    }

    /// Parse a method name. Unknown names deliver directly.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("redirect") {
            Self::Redirect
        } else {
            Self::Direct
        }
    }
}

impl std::fmt::Display for DownloadMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods_case_insensitively() {
        assert_eq!(DownloadMethod::parse("redirect"), DownloadMethod::Redirect);
        assert_eq!(DownloadMethod::parse(" Redirect "), DownloadMethod::Redirect);
        assert_eq!(DownloadMethod::parse("DIRECT"), DownloadMethod::Direct);
    }

    #[test]
    fn unknown_methods_fall_back_to_direct() {
        assert_eq!(DownloadMethod::parse("xsendfile"), DownloadMethod::Direct);
        assert_eq!(DownloadMethod::parse(""), DownloadMethod::Direct);
    }
}
