// Validation configuration

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use verdict_i18n::{I18nError, Locale};

/// Prefix shared by every environment variable read here.
pub const ENV_PREFIX: &str = "VERDICT";

/// Defaults for validators built by a [`ValidatorFactory`](crate::ValidatorFactory).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Locale used when a validator does not pick one
    pub locale: Locale,

    /// Locale consulted when a key is missing from `locale`
    pub fallback_locale: Locale,

    /// Directory of `<locale>.json` files merged over the built-in tables
    pub lang_dir: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            locale: Locale::en(),
            fallback_locale: Locale::en(),
            lang_dir: None,
        }
    }
}

impl ValidationConfig {
    /// Read `VERDICT_LOCALE`, `VERDICT_FALLBACK_LOCALE` and `VERDICT_LANG_DIR`.
    pub fn from_env() -> Result<Self, I18nError> {
        Self::from_lookup(|key| env::var(format!("{}_{}", ENV_PREFIX, key)).ok())
    }

    /// Build from a key lookup; keys are given without the prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, I18nError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(locale) = lookup("LOCALE") {
            config.locale = Locale::parse(&locale)?;
        }
        if let Some(fallback) = lookup("FALLBACK_LOCALE") {
            config.fallback_locale = Locale::parse(&fallback)?;
        }
        config.lang_dir = lookup("LANG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_fallback_locale(mut self, locale: Locale) -> Self {
        self.fallback_locale = locale;
        self
    }

    pub fn with_lang_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lang_dir = Some(dir.into());
        self
    }
}
