pub fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn truncate_display(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let kept: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_covers_markup_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn html_escape_leaves_plain_text_alone() {
        assert_eq!(html_escape("alpine:3.18"), "alpine:3.18");
    }

    #[test]
    fn truncate_display_keeps_short_values() {
        assert_eq!(truncate_display("alpine", 10), "alpine");
        assert_eq!(truncate_display("alpine", 6), "alpine");
    }

    #[test]
    fn truncate_display_marks_cut_values() {
        assert_eq!(truncate_display("alpine-nightly", 7), "alpine…");
    }

    #[test]
    fn truncate_display_counts_chars_not_bytes() {
        assert_eq!(truncate_display("héllo-wörld", 20), "héllo-wörld");
        assert_eq!(truncate_display("héllo-wörld", 6), "héllo…");
    }
}
