//! Review date normalization.
//!
//! Review dates arrive as locale-specific display strings such as
//! "Reviewed in India on 12 March 2024" or "Rezension aus Deutschland vom 3. Mai 2023".
//! [`normalize`] strips the boilerplate and parses what is left day-first.

use chrono::NaiveDate;
use regex_lite::Regex;
use std::sync::LazyLock;

/// "Reviewed in <country> on" and its storefront translations.
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^.*?(?:reviewed in .*?\bon|rezension aus .*?\bvom|comment.{1,2} en .*?\ble|revisado en .*?\bel|recensito in .*?\bil)\s+",
    )
    .unwrap()
});

static VERIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:\|.*|verified purchase.*)$").unwrap());

/// `<day> <monthName> <year>`, tolerating "12." and Spanish "12 de marzo de 2024".
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})\.?\s+(?:de\s+)?([^\s\d.,]+)\.?,?\s+(?:de\s+)?(\d{4})").unwrap()
});

/// Formats tried in order. Numeric forms are day-first.
const FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B, %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Month names across the supported storefront languages.
const MONTHS: &[(&str, u32)] = &[
    // English
    ("january", 1), ("february", 2), ("march", 3), ("april", 4), ("may", 5), ("june", 6),
    ("july", 7), ("august", 8), ("september", 9), ("october", 10), ("november", 11),
    ("december", 12), ("sept", 9),
    // German
    ("januar", 1), ("jänner", 1), ("februar", 2), ("märz", 3), ("maerz", 3), ("mai", 5),
    ("juni", 6), ("juli", 7), ("oktober", 10), ("dezember", 12),
    // French
    ("janvier", 1), ("février", 2), ("fevrier", 2), ("mars", 3), ("avril", 4), ("juin", 6),
    ("juillet", 7), ("août", 8), ("aout", 8), ("septembre", 9), ("octobre", 10),
    ("novembre", 11), ("décembre", 12), ("decembre", 12),
    // Spanish
    ("enero", 1), ("febrero", 2), ("marzo", 3), ("abril", 4), ("mayo", 5), ("junio", 6),
    ("julio", 7), ("agosto", 8), ("septiembre", 9), ("setiembre", 9), ("octubre", 10),
    ("noviembre", 11), ("diciembre", 12),
    // Italian
    ("gennaio", 1), ("febbraio", 2), ("aprile", 4), ("maggio", 5), ("giugno", 6),
    ("luglio", 7), ("settembre", 9), ("ottobre", 10), ("dicembre", 12),
];

/// Parses a review date display string. Returns `None` when nothing date-like is found.
pub fn normalize(raw: &str) -> Option<NaiveDate> {
    let cleaned = strip_boilerplate(raw);
    if cleaned.is_empty() {
        return None;
    }

    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
        .or_else(|| day_month_year(&cleaned))
}

/// Removes the locale prefix and any trailing "Verified Purchase" badge text.
pub fn strip_boilerplate(raw: &str) -> String {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = BOILERPLATE.replace(&text, "");
    VERIFIED.replace(&text, "").trim().to_string()
}

fn day_month_year(text: &str) -> Option<NaiveDate> {
    let caps = DAY_MONTH_YEAR.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Looks up a month by full name in any supported language, or by English abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if let Some((_, n)) = MONTHS.iter().find(|(m, _)| *m == name) {
        return Some(*n);
    }

    if name.chars().count() >= 3 {
        let prefix: String = name.chars().take(3).collect();
        return MONTHS[..12].iter().find(|(m, _)| m.starts_with(&prefix)).map(|(_, n)| *n);
    }

    None
}
