use once_cell::sync::Lazy;
use regex::Regex;

static LATEX_SUBSCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$_\{([^}]*)\}\$").expect("valid regex"));

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Chemical formula in LaTeX form (`H$_{2}$O`) as HTML with subscripts.
/// The text is escaped first, so only the `<sub>` tags are markup.
pub fn formula_markup(formula_latex: &str) -> String {
    LATEX_SUBSCRIPT
        .replace_all(&escape_html(formula_latex), "<sub>$1</sub>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn subscripts_only_from_latex_pattern() {
        assert_eq!(formula_markup("H$_{2}$O"), "H<sub>2</sub>O");
        assert_eq!(
            formula_markup("<b>$_{2}$"),
            "&lt;b&gt;<sub>2</sub>"
        );
        assert_eq!(formula_markup("$_{<i>}$"), "<sub>&lt;i&gt;</sub>");
    }
}
