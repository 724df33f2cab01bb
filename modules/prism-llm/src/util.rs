/// Truncate `s` to at most `max_bytes`, backing off to the nearest char
/// boundary so multi-byte UTF-8 sequences never get split.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip a ```json ... ``` or bare ``` ... ``` fence some models wrap JSON
/// responses in, returning the inner text trimmed.
pub fn strip_code_blocks(response: &str) -> String {
    let trimmed = response.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        return rest.trim_end_matches("```").trim().to_string();
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        return rest.trim_end_matches("```").trim().to_string();
    }
    trimmed.to_string()
}

/// Extract the first balanced `{...}` object from `text`, scanning past any
/// leading prose a model prepended to the JSON. Returns `None` if braces
/// never balance.
pub fn extract_balanced_json(text: &str) -> Option<&str> {
    let stripped = text;
    let start = stripped.find('{')?;
    let bytes = stripped.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&stripped[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
