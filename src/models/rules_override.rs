use serde::{Deserialize, Serialize};

/// The administrator's replacement for the generated rules.
///
/// `content` is the decoded override text, or `None` when the generated
/// default is in effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideResponse {
    pub content: Option<String>,
}

/// Fields posted by the editor form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRulesForm {
    #[serde(default)]
    pub htaccess_contents: String,
    pub edd_action: Option<String>,
    pub edd_save_htaccess_nonce: Option<String>,
}
