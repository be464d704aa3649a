//! Utility functions

/// Generate a new request ID
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// URL encode a path segment
pub fn encode_path(s: &str) -> String {
    use percent_encoding::{AsciiSet, CONTROLS};

    // Escapes controls, space, quotes, brackets, `%` and the `/ : ? #` delimiters;
    // other sub-delims such as `& + = ; @` are left as is
    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'<')
        .add(b'>')
        .add(b'`')
        .add(b'#')
        .add(b'?')
        .add(b'{')
        .add(b'}')
        .add(b'/')
        .add(b'%')
        .add(b':');

    percent_encoding::utf8_percent_encode(s, SEGMENT).to_string()
}

/// Truncate a response body for use in diagnostics
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("hello world"), "hello%20world");
        assert_eq!(encode_path("test/path"), "test%2Fpath");
        assert_eq!(encode_path("a:b"), "a%3Ab");
        assert_eq!(encode_path("my-project"), "my-project");
        assert_eq!(encode_path("my_key"), "my_key");
        assert_eq!(encode_path("my.key"), "my.key");
        assert_eq!(encode_path("a&b=c;d@e+f"), "a&b=c;d@e+f");
    }

    #[test]
    fn test_body_excerpt() {
        assert_eq!(body_excerpt("short", 10), "short");
        assert_eq!(body_excerpt("abcdef", 3), "abc...");
        assert_eq!(body_excerpt("ééé", 2), "éé...");
    }

    #[test]
    fn test_request_ids_are_uuids() {
        let id = generate_request_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
