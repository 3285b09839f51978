//! Message body sanitising.

/// Upper bound on body length in characters when nothing is configured.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 500;

/// Trim, strip angle brackets and cut the body to `max_chars` characters.
///
/// The result may be empty; callers decide whether that is an error.
pub fn sanitize_body(raw: &str, max_chars: usize) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(max_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_brackets_and_whitespace() {
        assert_eq!(sanitize_body("  <b>hello</b>  ", 500), "bhello/b");
    }

    #[test]
    fn truncates_on_character_boundaries() {
        let body = "é".repeat(10);
        assert_eq!(sanitize_body(&body, 3), "ééé");
    }

    #[test]
    fn blank_input_sanitises_to_empty() {
        assert!(sanitize_body("   <>  ", 500).is_empty());
    }
}
