//! Generation of the access rules written into the protected directory.
//!
//! A [`RulePipeline`] asks its [`RuleGenerator`] for the default rules and
//! then passes them through every registered [`RuleFilter`] in order. Filters
//! are registered once, when the application is wired, and never afterwards.

mod files;

use std::sync::Arc;

pub use files::*;

use crate::config::DEFAULT_ALLOWED_FILETYPES;
use crate::models::DownloadMethod;

/// Produces the default rules for a delivery method.
pub trait RuleGenerator: Send + Sync {
    fn default_rules(&self, method: DownloadMethod) -> String;
}

/// Rewrites generated rules before they are used.
pub trait RuleFilter: Send + Sync {
    fn filter(&self, rules: String, method: DownloadMethod) -> String;
}

/// The rules the shop ships with.
#[derive(Debug, Clone)]
pub struct DefaultRuleGenerator {
    allowed_filetypes: String,
}

impl DefaultRuleGenerator {
    pub fn new(allowed_filetypes: impl Into<String>) -> Self {
        Self {
            allowed_filetypes: allowed_filetypes.into(),
        }
    }
}

impl Default for DefaultRuleGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_FILETYPES)
    }
}

impl RuleGenerator for DefaultRuleGenerator {
    fn default_rules(&self, method: DownloadMethod) -> String {
        match method {
            // Files are reached through redirects, so only listings are blocked
            DownloadMethod::Redirect => "Options -Indexes".to_string(),
            DownloadMethod::Direct => {
                let mut rules = String::from("Options -Indexes\n");
                rules.push_str("deny from all\n");
                rules.push_str(&format!(
                    "<FilesMatch '\\.({})$'>\n",
                    self.allowed_filetypes
                ));
                rules.push_str("Order Allow,Deny\n");
                rules.push_str("Allow from all\n");
                rules.push_str("</FilesMatch>\n");
                rules
            }
        }
    }
}

/// A generator followed by an ordered list of filters.
pub struct RulePipeline {
    generator: Arc<dyn RuleGenerator>,
    filters: Vec<Arc<dyn RuleFilter>>,
}

impl RulePipeline {
    pub fn new(generator: Arc<dyn RuleGenerator>) -> Self {
        Self {
            generator,
            filters: Vec::new(),
        }
    }

    /// Append a filter; filters run in registration order.
    pub fn with_filter(mut self, filter: Arc<dyn RuleFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// The unfiltered default rules.
    pub fn default_rules(&self, method: DownloadMethod) -> String {
        self.generator.default_rules(method)
    }

    /// The rules in effect for `method`.
    pub fn rules(&self, method: DownloadMethod) -> String {
        self.filters
            .iter()
            .fold(self.generator.default_rules(method), |rules, filter| {
                filter.filter(rules, method)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Append(&'static str);

    impl RuleFilter for Append {
        fn filter(&self, rules: String, _method: DownloadMethod) -> String {
            format!("{}{}", rules, self.0)
        }
    }

    #[test]
    fn redirect_rules_only_block_listings() {
        let rules = DefaultRuleGenerator::default().default_rules(DownloadMethod::Redirect);
        assert_eq!(rules, "Options -Indexes");
    }

    #[test]
    fn direct_rules_deny_everything_but_allowed_types() {
        let rules = DefaultRuleGenerator::default().default_rules(DownloadMethod::Direct);
        assert_eq!(
            rules,
            "Options -Indexes\n\
             deny from all\n\
             <FilesMatch '\\.(jpg|jpeg|png|gif|mp3|ogg)$'>\n\
             Order Allow,Deny\n\
             Allow from all\n\
             </FilesMatch>\n"
        );
    }

    #[test]
    fn direct_rules_use_configured_filetypes() {
        let rules = DefaultRuleGenerator::new("pdf|epub").default_rules(DownloadMethod::Direct);
        assert!(rules.contains("<FilesMatch '\\.(pdf|epub)$'>"));
    }

    #[test]
    fn pipeline_without_filters_returns_default() {
        let pipeline = RulePipeline::new(Arc::new(DefaultRuleGenerator::default()));
        assert_eq!(
            pipeline.rules(DownloadMethod::Redirect),
            pipeline.default_rules(DownloadMethod::Redirect)
        );
    }

    #[test]
    fn pipeline_runs_filters_in_registration_order() {
        let pipeline = RulePipeline::new(Arc::new(DefaultRuleGenerator::default()))
            .with_filter(Arc::new(Append(" a")))
            .with_filter(Arc::new(Append(" b")));

        assert_eq!(
            pipeline.rules(DownloadMethod::Redirect),
            "Options -Indexes a b"
        );
    }
}
