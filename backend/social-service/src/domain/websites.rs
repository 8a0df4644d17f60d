//! Profile website list normalization

use url::Url;

/// Normalize user-entered website entries.
///
/// Entries are trimmed and blanks dropped. Entries without an `http://` or
/// `https://` prefix get `https://`. Whatever does not parse as an absolute
/// URL with a host is dropped. The canonical form is de-duplicated keeping
/// the first occurrence.
pub fn normalize_websites<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();

    for entry in entries {
        let Some(url) = normalize_one(entry.as_ref()) else {
            continue;
        };
        if !normalized.contains(&url) {
            normalized.push(url);
        }
    }

    normalized
}

fn normalize_one(entry: &str) -> Option<String> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url.to_string()),
        _ => None,
    }
}
