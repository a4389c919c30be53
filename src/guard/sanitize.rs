use regex::Regex;
use std::sync::LazyLock;

static INJECTION_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<script\b[^>]*>.*?</script\s*>",
        r"(?i)javascript\s*:",
        r"(?i)on\w+\s*=",
        r"(?i)<iframe\b",
        r"(?i)<object\b",
        r"(?i)<embed\b",
        r"(?i)<link\b",
        r"(?i)\bdata:(?:[a-z]+/[a-z0-9.+-]+)?(?:;[a-z0-9=.+-]+)*,",
        r"(?i)vbscript\s*:",
        r"(?i)expression\s*\(",
        r#"(?i)url\s*\(\s*['"]?\s*data:"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

pub const MAX_EMAIL_LEN: usize = 254;

/// Make raw user input safe to embed in HTML.
///
/// Single-pass only: `&` becomes `&amp;`, so running this over its own output
/// encodes the ampersands again.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\0' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\n' | '\t' => out.push(c),
            c if c.is_ascii_control() && c != '\x7f' => {}
            c => out.push(c),
        }
    }
    out.trim().to_string()
}

/// True if the value carries markup, script, or URI-scheme injection.
pub fn contains_injection(value: &str) -> bool {
    INJECTION_RES.iter().any(|re| re.is_match(value))
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}
