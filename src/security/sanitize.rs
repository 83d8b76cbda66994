//! Input cleanup for values that end up in the audit log or in notices.

/// Strip control characters, collapse whitespace runs and trim.
pub fn sanitize_text(input: &str) -> String {
    input
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the first `max_words` whitespace-separated words.
///
/// An ellipsis marks that words were dropped.
pub fn trim_words(input: &str, max_words: usize) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let mut trimmed = words[..max_words].join(" ");
    trimmed.push('…');
    trimmed
}

fn is_local_part_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
}

/// Reduce an address to something that looks like `local@domain.tld`.
///
/// Returns an empty string when nothing usable is left.
pub fn sanitize_email(input: &str) -> String {
    let input = input.trim();
    if input.len() < 6 {
        return String::new();
    }
    let Some((local, domain)) = input.split_once('@') else {
        return String::new();
    };

    let local: String = local.chars().filter(|c| is_local_part_char(*c)).collect();
    if local.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = domain
        .split('.')
        .map(|label| {
            label
                .trim_matches(|c: char| c == '-' || c.is_whitespace())
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|label| !label.is_empty())
        .collect();
    if labels.len() < 2 {
        return String::new();
    }

    format!("{}@{}", local, labels.join("."))
}

fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-~+_.?#=!&;,/:%@$|*'()[]".contains(c) || !c.is_ascii()
}

/// Drop characters that do not belong in a request path or query.
pub fn sanitize_url(input: &str) -> String {
    input.trim().chars().filter(|c| is_url_char(*c)).collect()
}

/// Escape text for inclusion in an HTML notice.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
