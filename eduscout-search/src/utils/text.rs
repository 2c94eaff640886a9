//! Text helpers shared by the scorer, expander and provider clients

/// Lowercase, trim and drop empty entries
pub fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Substitute `{term}`, `{subject}`, `{grade}` and `{topic}` in a template.
///
/// Collapses repeated whitespace so an empty placeholder does not leave a gap.
pub fn render_template(template: &str, term: &str, subject: &str, grade: &str, topic: &str) -> String {
    template
        .replace("{term}", term)
        .replace("{subject}", subject)
        .replace("{grade}", grade)
        .replace("{topic}", topic)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an ISO-8601 duration (`PT1H2M3S`, `P1DT2H`, `PT45S`) into seconds.
///
/// Returns `None` for anything that is not a well-formed duration. Years and
/// months are rejected: video durations never use them.
pub fn parse_iso8601_duration(raw: &str) -> Option<u32> {
    let rest = raw.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' if !in_time && number.is_empty() => in_time = true,
            unit => {
                let value: u64 = number.parse().ok()?;
                number.clear();
                let multiplier = match (in_time, unit) {
                    (false, 'W') => 7 * 86_400,
                    (false, 'D') => 86_400,
                    (true, 'H') => 3_600,
                    (true, 'M') => 60,
                    (true, 'S') => 1,
                    _ => return None,
                };
                total = total.checked_add(value.checked_mul(multiplier)?)?;
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }
    u32::try_from(total).ok()
}

/// Decode the handful of HTML entities the YouTube API leaves in titles
pub fn decode_html_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
