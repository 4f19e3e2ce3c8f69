//! Field normalization shared by every extraction strategy.
//!
//! Nothing in here fails: malformed input degrades to a default value so a
//! single odd card never aborts a scrape run.

use std::sync::LazyLock;

use common::{constants::CATEGORY_MAX_CHARS, record::Price};
use regex::Regex;
use tracing::debug;

static NON_PRICE_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9,]").expect("price character class to compile"));

/// Parses prices written with a comma as decimal separator:
/// 1. "1.234,50" -> 1234.50
/// 2. "€ 12,5" -> 12.50
/// 3. "99" -> 99.00
///
/// Everything but digits and commas is dropped first. The last comma splits
/// whole from fraction, earlier commas are dropped, extra fractional digits
/// round half-up to cents. Anything unparseable is zero.
pub fn parse_price(raw: &str) -> Price {
    let stripped = NON_PRICE_CHARACTERS.replace_all(raw, "");

    let (whole, fraction) = match stripped.rsplit_once(',') {
        Some((whole, fraction)) => (whole.replace(',', ""), fraction),
        None => (stripped.to_string(), ""),
    };

    match to_cents(&whole, fraction) {
        Some(cents) => Price::from_cents(cents),
        None => {
            debug!("Failed to parse price '{raw}', defaulting to zero");
            Price::ZERO
        }
    }
}

fn to_cents(whole: &str, fraction: &str) -> Option<u64> {
    let whole: u64 = match whole.is_empty() {
        true => 0,
        false => whole.parse().ok()?,
    };

    let digits: Vec<u64> = fraction
        .chars()
        .take(3)
        .filter_map(|digit| digit.to_digit(10).map(u64::from))
        .collect();

    let tens = digits.first().copied().unwrap_or(0);
    let units = digits.get(1).copied().unwrap_or(0);
    let round_up = digits.get(2).is_some_and(|digit| *digit >= 5);

    whole
        .checked_mul(100)?
        .checked_add(tens * 10 + units + u64::from(round_up))
}

/// Joins `path` onto the site origin unless it already is absolute.
/// An empty path resolves to the origin itself.
pub fn absolutize_url(origin: &str, path: &str) -> String {
    if path.starts_with("http") {
        return path.to_string();
    }

    let origin = origin.trim_end_matches('/');

    if path.is_empty() {
        return origin.to_string();
    }

    match path.starts_with('/') {
        true => format!("{origin}{path}"),
        false => format!("{origin}/{path}"),
    }
}

/// Absolute image address, or `None` for missing and placeholder images
pub fn resolve_image_url(origin: &str, candidate: Option<&str>) -> Option<String> {
    let candidate = candidate.map(str::trim).filter(|value| !value.is_empty())?;

    if candidate.starts_with("data:") {
        return None;
    }

    Some(absolutize_url(origin, candidate))
}

/// Joins non-empty labels with ", ", clipped to the storage width
pub fn flatten_categories<I, S>(labels: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = labels
        .into_iter()
        .filter_map(|label| {
            let label = label.as_ref().trim();
            (!label.is_empty()).then(|| label.to_string())
        })
        .collect::<Vec<String>>()
        .join(", ");

    truncate_chars(&joined, CATEGORY_MAX_CHARS)
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
