use lazy_static::lazy_static;
use regex::Regex;

/// Names longer than this are shortened for display.
pub const MONIKER_MAX_CHARS: usize = 30;
const MONIKER_KEEP_CHARS: usize = 26;

lazy_static! {
    // Flags and a few symbols whose terminal width cannot be determined
    static ref UNRENDERABLE: Regex =
        Regex::new("[\u{1F1E0}-\u{1F1FF}\u{269B}\u{FE0F}]+").expect("static pattern");
}

pub fn strip_emoji(text: &str) -> String {
    UNRENDERABLE.replace_all(text, "").into_owned()
}

pub fn truncate_moniker(name: &str) -> String {
    if name.chars().count() > MONIKER_MAX_CHARS {
        let mut short: String = name.chars().take(MONIKER_KEEP_CHARS).collect();
        short.push_str("...");
        short
    } else {
        name.to_string()
    }
}

/// Sanitised, width-limited name for the validator column.
pub fn display_moniker(name: &str) -> String {
    truncate_moniker(&strip_emoji(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_flags() {
        assert_eq!(strip_emoji("Validator \u{1F1E9}\u{1F1EA}"), "Validator ");
        assert_eq!(strip_emoji("Atom\u{269B}\u{FE0F}ic"), "Atomic");
        assert_eq!(strip_emoji("plain"), "plain");
    }

    #[test]
    fn test_truncate_long_names() {
        let long = "a".repeat(31);
        let short = truncate_moniker(&long);
        assert_eq!(short, format!("{}...", "a".repeat(26)));
        assert_eq!(truncate_moniker(&"b".repeat(30)), "b".repeat(30));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let name = "é".repeat(30);
        assert_eq!(truncate_moniker(&name), name);
    }
}
