//! Small text helpers shared by the storefront and the admin console:
//! slug derivation, read-time estimates, and content-locale negotiation.

/// Locales the marketing content is maintained in.
pub const SUPPORTED_LOCALES: &[&str] = &["en", "fr", "de"];

/// Fallback when negotiation finds nothing usable.
pub const DEFAULT_LOCALE: &str = "en";

/// Average adult reading speed used for the blog read-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Derives a URL-safe slug from a title: lowercased, alphanumerics kept,
/// every run of anything else collapsed to a single hyphen.
pub fn slugify(input: &str) -> String {
    input
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Estimated reading time in whole minutes, rounded up, never below one.
pub fn reading_time_minutes(body: &str) -> i64 {
    let words = body.split_whitespace().count();
    (words.div_ceil(WORDS_PER_MINUTE).max(1)) as i64
}

/// Picks the content locale for a request from its Accept-Language header.
///
/// Entries are matched on the primary subtag (so `fr-CA` selects `fr`),
/// weighted by their q-values with the header's own order breaking ties.
/// A `*` entry, an absent header, or no supported match all fall back to
/// [`DEFAULT_LOCALE`]. Entries with `q=0` are exclusions and never match.
pub fn preferred_locale(accept_language: Option<&str>) -> &'static str {
    let Some(header) = accept_language else {
        return DEFAULT_LOCALE;
    };

    let mut best: Option<(&'static str, f32)> = None;

    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or("").trim();
        if tag.is_empty() {
            continue;
        }

        let mut quality = 1.0_f32;
        for param in parts {
            if let Some(q) = param.trim().strip_prefix("q=") {
                quality = q.parse().unwrap_or(0.0);
            }
        }
        if quality <= 0.0 {
            continue;
        }

        let matched = if tag == "*" {
            Some(DEFAULT_LOCALE)
        } else {
            let primary = tag.split('-').next().unwrap_or(tag);
            SUPPORTED_LOCALES
                .iter()
                .find(|l| l.eq_ignore_ascii_case(primary))
                .copied()
        };

        if let Some(locale) = matched {
            // Strictly-greater keeps the earliest entry on equal weights.
            let better = match best {
                None => true,
                Some((_, best_q)) => quality > best_q,
            };
            if better {
                best = Some((locale, quality));
            }
        }
    }

    best.map(|(locale, _)| locale).unwrap_or(DEFAULT_LOCALE)
}
