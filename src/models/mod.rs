//! Domain models for the rules editor.
//!
//! - [`DownloadMethod`]: how purchased files are delivered; selects the default rules.
//! - [`OverrideResponse`]: the stored override as returned by the JSON API.
//! - [`SaveRulesForm`]: the editor form submission.

mod method;
mod rules_override;

pub use method::*;
pub use rules_override::*;
