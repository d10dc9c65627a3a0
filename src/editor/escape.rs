//! Encoding of override text for storage and HTML output.
//!
//! Stored overrides are slash-escaped and then HTML-escaped, so the stored
//! value is inert markup. [`decode`] reverses both steps exactly, which keeps
//! rule syntax such as `\.` or quoted patterns intact across a save.

/// Escape `&`, `<`, `>`, `"` and `'` for use in HTML text or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode raw override text for storage.
pub fn sanitize(raw: &str) -> String {
    escape_html(&add_slashes(raw))
}

/// Recover raw override text from its stored form.
pub fn decode(stored: &str) -> String {
    decode_entities(&strip_slashes(stored))
}

/// Backslash-escape quotes, backslashes and NUL.
pub fn add_slashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove one level of backslash escaping. `\0` becomes NUL and a trailing
/// lone backslash is dropped.
pub fn strip_slashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

/// Decode named and numeric character references. Unknown references are
/// left as they are.
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        match candidate.find(';').and_then(|end| {
            // References are short; a far-away ';' belongs to something else
            if end > 10 {
                return None;
            }
            decode_reference(&candidate[1..end]).map(|c| (c, end))
        }) {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        // PHP leaves &#0; undecoded; NUL never comes from a reference
        if code == 0 {
            return None;
        }
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_neutralizes_script_markup() {
        let stored = sanitize("<script>alert('x')</script>");
        assert!(!stored.contains('<'));
        assert!(!stored.contains('>'));
        assert_eq!(
            stored,
            "&lt;script&gt;alert(\\&#039;x\\&#039;)&lt;/script&gt;"
        );
    }

    #[test]
    fn plain_rules_survive_unchanged() {
        let rules = "Options -Indexes\ndeny from all\n";
        assert_eq!(sanitize(rules), rules);
        assert_eq!(decode(rules), rules);
    }

    #[test]
    fn decode_reverses_sanitize() {
        for raw in [
            "Allow from all",
            "<FilesMatch '\\.(jpg|png)$'>\nAllow from all\n</FilesMatch>",
            "RewriteRule ^(.*)$ \"/index.php?q=$1\" [L]",
            "literal &amp; entity",
            "trailing backslash \\",
            "nul \0 byte",
            "",
        ] {
            assert_eq!(decode(&sanitize(raw)), raw, "round trip of {:?}", raw);
        }
    }

    #[test]
    fn strip_slashes_handles_escapes() {
        assert_eq!(strip_slashes("a\\'b"), "a'b");
        assert_eq!(strip_slashes("a\\\\b"), "a\\b");
        assert_eq!(strip_slashes("a\\0b"), "a\0b");
        assert_eq!(strip_slashes("end\\"), "end");
    }

    #[test]
    fn decode_entities_handles_numeric_and_unknown_references() {
        assert_eq!(decode_entities("&#60;&#x3E;&#039;"), "<>'");
        assert_eq!(decode_entities("&bogus; & done"), "&bogus; & done");
        assert_eq!(decode_entities("a &amp;amp; b"), "a &amp; b");
    }

    #[test]
    fn nul_references_stay_undecoded() {
        assert_eq!(decode_entities("a&#0;b"), "a&#0;b");
        assert_eq!(decode_entities("a&#x0;b"), "a&#x0;b");
        assert!(!decode("rule&#0;").contains('\0'));
    }
}
