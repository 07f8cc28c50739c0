//! Identifier slugs derived from business names and addresses.
//!
//! Everything in this module is pure string processing. The slugs produced
//! here seed both the business document ids (`{name-slug}-{postcode}`) and
//! the human-meaningful base ids for tracking links.

use regex::Regex;
use std::sync::LazyLock;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static pattern"));
static AMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*&\s*").expect("static pattern"));
static AT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*@\s*").expect("static pattern"));

/// Legal-entity tokens stripped from business names, compared after
/// lowercasing and punctuation removal. `gmbhundco` is what "GmbH & Co."
/// becomes once the ampersand has been glued into `und`.
const LEGAL_TOKENS: &[&str] = &[
    "gmbh",
    "gmbhundco",
    "mbh",
    "kg",
    "ag",
    "ev",
    "ug",
    "ohg",
    "gbr",
    "inc",
    "ltd",
    "llc",
    "corp",
    "co",
];

/// Normalizes a string to a URL-safe id slug: alphanumeric runs joined by
/// single dashes, no leading/trailing dash.
pub fn sanitize_id(value: &str) -> String {
    NON_ALNUM_RE
        .replace_all(value.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// Derives a short lowercase slug from a raw business name.
///
/// The steps run in a fixed order because several of them feed each other:
///
/// 1. Transliterate German umlauts (`ä`→`ae`, `ß`→`ss`, …) before any
///    splitting, so `Müller` keeps its identity as one token.
/// 2. Glue `&` and `@` into word-joining tokens (`und`, `at`) instead of
///    treating them as separators: `"A & B"` → `"AundB"`.
/// 3. Drop legal-entity tokens (GmbH, KG, AG, e.V., Inc., …) wherever they
///    occur, not only at the end.
/// 4. Split on whitespace/underscore/slash runs.
/// 5. Drop trailing purely-numeric tokens (stray postcodes).
/// 6. Lowercase and strip every token to `[a-z0-9-]`.
/// 7. Keep the first token; append the second when the first is very short
///    (≤ 2 chars) or numeric, or when the joined result stays within 20
///    chars and the first token is not already a hyphenated compound.
///
/// Returns `None` when nothing survives — callers must treat that as "no
/// identity available" and fall back to a sequential id.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_business_name("Müller & Sohn GmbH").as_deref(), Some("muellerundsohn"));
/// assert_eq!(normalize_business_name("4 advice GmbH").as_deref(), Some("4-advice"));
/// assert_eq!(normalize_business_name("GmbH"), None);
/// ```
pub fn normalize_business_name(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let transliterated = transliterate_umlauts(raw);
    let glued = AMP_RE.replace_all(&transliterated, "und");
    let glued = AT_RE.replace_all(&glued, "at");

    let mut tokens: Vec<String> = glued
        .split(|c: char| c.is_whitespace() || c == '_' || c == '/')
        .map(|t| {
            t.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .map(|t| t.trim_matches('-').to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| !LEGAL_TOKENS.contains(&t.as_str()))
        .collect();

    while tokens
        .last()
        .is_some_and(|t| t.chars().all(|c| c.is_ascii_digit()))
    {
        tokens.pop();
    }

    let first = tokens.first()?.clone();
    if let Some(second) = tokens.get(1) {
        let first_is_short = first.chars().count() <= 2;
        let first_is_numeric = first.chars().all(|c| c.is_ascii_digit());
        let joined_fits = first.len() + 1 + second.len() <= 20 && !first.contains('-');
        if first_is_short || first_is_numeric || joined_fits {
            return Some(format!("{first}-{second}"));
        }
    }
    Some(first)
}

/// Builds the stable business document id from name and postcode.
///
/// Both parts are optional in real files; `"biz"` is the last-resort fallback
/// so the id is never empty.
pub fn business_id(business_name: &str, postcode: &str) -> String {
    let base = normalize_business_name(business_name).unwrap_or_default();
    let plz = sanitize_id(postcode).to_lowercase();
    match (base.is_empty(), plz.is_empty()) {
        (false, false) => format!("{base}-{plz}"),
        (false, true) => base,
        (true, false) => plz,
        (true, true) => "biz".to_string(),
    }
}

/// Builds the normalized name+address fingerprint stored on targets for
/// later duplicate detection: `{name}|{street}-{house}|{plz}|{city}`.
pub fn dedupe_key(
    business_name: &str,
    street: &str,
    house_number: &str,
    postcode: &str,
    city: &str,
) -> String {
    format!(
        "{}|{}-{}|{}|{}",
        dedupe_part(business_name),
        dedupe_part(street),
        dedupe_part(house_number),
        postcode.trim().to_lowercase(),
        dedupe_part(city)
    )
}

fn dedupe_part(value: &str) -> String {
    let lowered = value.trim().to_lowercase().replace('ß', "ss");
    let mut out = String::with_capacity(lowered.len());
    let mut last_dash = false;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

fn transliterate_umlauts(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_id_basic() {
        assert_eq!(sanitize_id("Acme Bau GmbH"), "Acme-Bau-GmbH");
        assert_eq!(sanitize_id("  a  b  "), "a-b");
        assert_eq!(sanitize_id("--x--"), "x");
        assert_eq!(sanitize_id(""), "");
    }

    #[test]
    fn test_normalize_umlauts_and_legal_suffix() {
        assert_eq!(
            normalize_business_name("Müller & Sohn GmbH").as_deref(),
            Some("muellerundsohn")
        );
    }

    #[test]
    fn test_normalize_ampersand_glues_words() {
        assert_eq!(normalize_business_name("A & B").as_deref(), Some("aundb"));
        assert_eq!(normalize_business_name("A&B").as_deref(), Some("aundb"));
    }

    #[test]
    fn test_normalize_at_sign() {
        assert_eq!(
            normalize_business_name("Pizza @ Home").as_deref(),
            Some("pizzaathome")
        );
    }

    #[test]
    fn test_normalize_strips_legal_tokens_anywhere() {
        assert_eq!(
            normalize_business_name("GmbH Schmidt Dach").as_deref(),
            Some("schmidt-dach")
        );
        assert_eq!(
            normalize_business_name("Bäcker Krause GmbH & Co. KG").as_deref(),
            Some("baecker-krause")
        );
    }

    #[test]
    fn test_normalize_drops_trailing_numeric_tokens() {
        assert_eq!(
            normalize_business_name("Autohaus Weber 53177").as_deref(),
            Some("autohaus-weber")
        );
    }

    #[test]
    fn test_normalize_keeps_leading_numeric_token_with_second() {
        assert_eq!(
            normalize_business_name("4 advice GmbH").as_deref(),
            Some("4-advice")
        );
    }

    #[test]
    fn test_normalize_short_first_token_takes_second() {
        assert_eq!(
            normalize_business_name("Dr Hofmeister Zahnarztpraxis").as_deref(),
            Some("dr-hofmeister")
        );
    }

    #[test]
    fn test_normalize_length_bound() {
        // Joining would exceed 20 chars, so only the first token is kept.
        assert_eq!(
            normalize_business_name("Gebäudemanagement Nordrhein").as_deref(),
            Some("gebaeudemanagement")
        );
    }

    #[test]
    fn test_normalize_hyphenated_first_token_stays_alone() {
        assert_eq!(
            normalize_business_name("Coca-Cola Erfrischungsgetränke").as_deref(),
            Some("coca-cola")
        );
    }

    #[test]
    fn test_normalize_empty_and_garbage() {
        assert_eq!(normalize_business_name(""), None);
        assert_eq!(normalize_business_name("   "), None);
        assert_eq!(normalize_business_name("GmbH"), None);
        assert_eq!(normalize_business_name("!!! ???"), None);
        assert_eq!(normalize_business_name("53177"), None);
    }

    #[test]
    fn test_business_id_combines_name_and_postcode() {
        assert_eq!(business_id("4 advice GmbH", "53177"), "4-advice-53177");
        assert_eq!(business_id("Müller & Sohn GmbH", ""), "muellerundsohn");
        assert_eq!(business_id("", "53177"), "53177");
        assert_eq!(business_id("", ""), "biz");
    }

    #[test]
    fn test_dedupe_key_shape() {
        let key = dedupe_key("Müller & Sohn", "Hauptstraße", "12a", "53177", "Bonn");
        assert_eq!(key.split('|').count(), 4);
        assert!(key.contains("hauptstra"));
        assert!(key.contains("53177"));
        assert!(!key.contains('ß'));
    }

    #[test]
    fn test_dedupe_key_is_stable_across_case() {
        assert_eq!(
            dedupe_key("ACME", "Hauptstr.", "1", "10115", "Berlin"),
            dedupe_key("acme", "hauptstr.", "1", "10115", "berlin")
        );
    }
}
