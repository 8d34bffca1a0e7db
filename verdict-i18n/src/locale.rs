//! Locales and Accept-Language negotiation.

use crate::{I18nError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language with optional script and region.
///
/// ```
/// use verdict_i18n::Locale;
///
/// let id = Locale::parse("id").unwrap();
/// let en_us: Locale = "en_us".parse().unwrap();
/// assert_eq!(id.tag(), "id");
/// assert_eq!(en_us.tag(), "en-US");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    /// ISO 639 language code, lowercase
    pub language: String,
    /// ISO 15924 script, title case
    pub script: Option<String>,
    /// ISO 3166 region or UN M.49 code, uppercase
    pub region: Option<String>,
}

impl Locale {
    pub fn new(language: impl Into<String>, region: Option<impl Into<String>>) -> Self {
        Self {
            language: language.into().to_lowercase(),
            script: None,
            region: region.map(|r| r.into().to_uppercase()),
        }
    }

    /// Parse a BCP 47 style tag. Both `-` and `_` separate subtags.
    pub fn parse(tag: &str) -> Result<Self> {
        let mut parts = tag.trim().split(['-', '_']);

        let language = parts.next().unwrap_or_default().to_lowercase();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(I18nError::InvalidLocale(tag.to_string()));
        }

        let mut locale = Locale {
            language,
            script: None,
            region: None,
        };

        for part in parts {
            let alpha = part.chars().all(|c| c.is_ascii_alphabetic());
            match part.len() {
                4 if alpha => {
                    let mut chars = part.chars();
                    locale.script = chars.next().map(|first| {
                        first
                            .to_uppercase()
                            .chain(chars.flat_map(|c| c.to_lowercase()))
                            .collect()
                    });
                }
                2 if alpha => locale.region = Some(part.to_uppercase()),
                3 if part.chars().all(|c| c.is_ascii_digit()) => {
                    locale.region = Some(part.to_string())
                }
                _ => return Err(I18nError::InvalidLocale(tag.to_string())),
            }
        }

        Ok(locale)
    }

    /// Canonical tag, e.g. `zh-Hans-CN`.
    pub fn tag(&self) -> String {
        let mut tag = self.language.clone();
        for part in [&self.script, &self.region].into_iter().flatten() {
            tag.push('-');
            tag.push_str(part);
        }
        tag
    }

    /// Same locale without its region.
    pub fn language_only(&self) -> Self {
        Self {
            language: self.language.clone(),
            script: self.script.clone(),
            region: None,
        }
    }

    /// How well `self` serves a request for `other`; 0 means unusable.
    pub fn match_score(&self, other: &Locale) -> u32 {
        if self.language != other.language {
            return 0;
        }
        if self == other {
            return 100;
        }

        let mut score = 10;
        if self.region.is_some() && self.region == other.region {
            score += 40;
        }
        if self.script.is_some() && self.script == other.script {
            score += 15;
        }
        score
    }

    pub fn en() -> Self {
        Self::new("en", None::<&str>)
    }

    /// Indonesian
    pub fn id() -> Self {
        Self::new("id", None::<&str>)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for Locale {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self> {
        Locale::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = I18nError;

    fn try_from(value: String) -> Result<Self> {
        Locale::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.tag()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::en()
    }
}

// ============================================================================
// Accept-Language
// ============================================================================

/// Parse an `Accept-Language` header, best quality first.
///
/// Wildcards and malformed entries are dropped. Entries of equal quality
/// keep their header order.
///
/// ```
/// use verdict_i18n::parse_accept_language;
///
/// let locales = parse_accept_language("id-ID,id;q=0.9,en;q=0.8,*;q=0.1");
/// let tags: Vec<_> = locales.iter().map(|l| l.tag()).collect();
/// assert_eq!(tags, ["id-ID", "id", "en"]);
/// ```
pub fn parse_accept_language(header: &str) -> Vec<Locale> {
    let mut entries: Vec<(Locale, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.trim().splitn(2, ';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let quality = pieces
                .next()
                .and_then(|q| q.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            Locale::parse(tag).ok().map(|locale| (locale, quality))
        })
        .collect();

    // stable sort keeps header order for ties
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(locale, _)| locale).collect()
}

/// Pick the best available locale for the requested preferences.
pub fn negotiate_locale<'a>(
    requested: &[Locale],
    available: &'a [Locale],
    default: &'a Locale,
) -> &'a Locale {
    for wanted in requested {
        let best = available
            .iter()
            .map(|candidate| (candidate, candidate.match_score(wanted)))
            .filter(|(_, score)| *score > 0)
            .max_by_key(|(_, score)| *score);

        if let Some((locale, _)) = best {
            return locale;
        }
    }

    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse() {
        let id = Locale::parse("id").unwrap();
        assert_eq!(id.language, "id");
        assert!(id.region.is_none());

        let en_us = Locale::parse("en_us").unwrap();
        assert_eq!(en_us.region.as_deref(), Some("US"));

        let zh = Locale::parse("zh-hans-CN").unwrap();
        assert_eq!(zh.script.as_deref(), Some("Hans"));
        assert_eq!(zh.tag(), "zh-Hans-CN");
    }

    #[test]
    fn test_locale_parse_rejects_garbage() {
        assert!(Locale::parse("").is_err());
        assert!(Locale::parse("english").is_err());
        assert!(Locale::parse("en-toolongpart").is_err());
    }

    #[test]
    fn test_locale_serde_as_tag() {
        let locale: Locale = serde_json::from_str("\"id-ID\"").unwrap();
        assert_eq!(locale, Locale::new("id", Some("ID")));
        assert_eq!(serde_json::to_string(&locale).unwrap(), "\"id-ID\"");
    }

    #[test]
    fn test_parse_accept_language_orders_by_quality() {
        let locales = parse_accept_language("en;q=0.5, id-ID, fr;q=0.8");
        let tags: Vec<_> = locales.iter().map(Locale::tag).collect();
        assert_eq!(tags, ["id-ID", "fr", "en"]);
    }

    #[test]
    fn test_negotiate_locale_prefers_language_match() {
        let available = vec![Locale::en(), Locale::id()];
        let requested = parse_accept_language("id-ID,en;q=0.5");
        let default = Locale::en();

        assert_eq!(negotiate_locale(&requested, &available, &default), &Locale::id());
    }

    #[test]
    fn test_negotiate_locale_falls_back_to_default() {
        let available = vec![Locale::en(), Locale::id()];
        let requested = parse_accept_language("de,ja");
        let default = Locale::en();

        assert_eq!(negotiate_locale(&requested, &available, &default), &Locale::en());
    }

    #[test]
    fn test_match_score() {
        let en_us = Locale::new("en", Some("US"));
        assert_eq!(en_us.match_score(&en_us), 100);
        assert!(Locale::en().match_score(&en_us) > 0);
        assert_eq!(Locale::id().match_score(&en_us), 0);
    }
}
