//! HTML for the rules editor.

use crate::auth::TokenAction;
use crate::editor::escape::escape_html;

use super::EDITOR_PATH;

pub const SAVE_NONCE_FIELD: &str = "edd_save_htaccess_nonce";

pub struct EditorPage<'a> {
    pub content: &'a str,
    pub save_token: &'a str,
    pub reset_token: &'a str,
    pub server_supported: bool,
}

impl EditorPage<'_> {
    pub fn render(&self) -> String {
        let body = if self.server_supported {
            self.form()
        } else {
            "<p>The htaccess editor is only useful with the Apache webserver!</p>".to_string()
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Edit htaccess</title></head>
<body>
<div class="postbox">
<h3><span>Edit htaccess</span></h3>
<div class="inside">
{body}
</div>
</div>
</body>
</html>
"#
        )
    }

    fn form(&self) -> String {
        let reset_href = format!(
            "{}?edd-action={}&token={}",
            EDITOR_PATH,
            TokenAction::ResetRules.as_str(),
            self.reset_token
        );

        format!(
            r#"<form method="post" action="{action}">
<p>
<textarea name="htaccess_contents" rows="10" class="large-text">
{content}</textarea>
<span class="description"><strong>Warning!</strong> Incorrectly modifying your htaccess file could result in unexpected site behavior.</span>
</p>
<p>
<input type="hidden" name="edd_action" value="{save_action}" />
<input type="hidden" name="{nonce_field}" value="{save_token}" />
<input type="submit" name="submit" class="button secondary" value="Save" />
<a href="{reset_href}" class="button secondary-button" style="color: #ff0000;">Reset htaccess file</a>
</p>
</form>"#,
            action = EDITOR_PATH,
            content = escape_html(self.content),
            save_action = TokenAction::SaveRules.as_str(),
            nonce_field = SAVE_NONCE_FIELD,
            save_token = escape_html(self.save_token),
            reset_href = escape_html(&reset_href),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &str, server_supported: bool) -> String {
        EditorPage {
            content,
            save_token: "save123",
            reset_token: "reset456",
            server_supported,
        }
        .render()
    }

    #[test]
    fn textarea_content_is_escaped() {
        let html = page("</textarea><script>alert(1)</script>", true);
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn textarea_keeps_leading_newline_of_content() {
        // Parsers drop one newline right after <textarea>, so the content's own survives
        let html = page("\nAllow from all", true);
        assert!(html.contains("class=\"large-text\">\n\nAllow from all</textarea>"));
    }

    #[test]
    fn form_carries_tokens() {
        let html = page("deny from all", true);
        assert!(html.contains(r#"name="edd_save_htaccess_nonce" value="save123""#));
        assert!(html.contains("edd-action=reset_htaccess_file&amp;token=reset456"));
    }

    #[test]
    fn other_servers_get_a_notice_instead_of_the_form() {
        let html = page("deny from all", false);
        assert!(html.contains("only useful with the Apache webserver"));
        assert!(!html.contains("<form"));
    }
}
