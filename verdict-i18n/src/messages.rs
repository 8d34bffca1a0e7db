//! Message bundles and translation lookup.

use crate::{I18nError, Locale, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Messages for a single locale, keyed by dotted message ID.
#[derive(Debug, Clone, Default)]
pub struct MessageBundle {
    messages: HashMap<String, String>,
}

impl MessageBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON object. Nested objects are flattened into dotted
    /// keys, so `{"min": {"string": "..."}}` yields `min.string`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(root) = value else {
            return Err(I18nError::ParseError(
                "message file must contain a JSON object".to_string(),
            ));
        };

        let mut bundle = Self::new();
        bundle.flatten("", root);
        Ok(bundle)
    }

    fn flatten(&mut self, prefix: &str, object: serde_json::Map<String, serde_json::Value>) {
        for (key, value) in object {
            let key = if prefix.is_empty() {
                key
            } else {
                format!("{}.{}", prefix, key)
            };

            match value {
                serde_json::Value::String(message) => {
                    self.messages.insert(key, message);
                }
                serde_json::Value::Object(nested) => self.flatten(&key, nested),
                // numbers, arrays and nulls carry no message text
                _ => {}
            }
        }
    }

    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(key.into(), message.into());
    }

    /// Builder form of [`MessageBundle::add`].
    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(key, message);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Merge `other` into this bundle; `other` wins on conflicts.
    pub fn merge(&mut self, other: MessageBundle) {
        self.messages.extend(other.messages);
    }
}

/// Bundles for several locales.
#[derive(Debug, Default, Clone)]
pub struct Messages {
    bundles: HashMap<String, MessageBundle>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or extend the bundle for `locale`.
    pub fn add_bundle(&mut self, locale: &Locale, bundle: MessageBundle) {
        self.bundles.entry(locale.tag()).or_default().merge(bundle);
    }

    /// Exact tag first, then the language-only locale.
    pub fn get_bundle(&self, locale: &Locale) -> Option<&MessageBundle> {
        self.bundles.get(&locale.tag()).or_else(|| {
            locale
                .region
                .as_ref()
                .and_then(|_| self.bundles.get(&locale.language_only().tag()))
        })
    }

    /// Locales that have a bundle.
    pub fn locales(&self) -> Vec<Locale> {
        let mut locales: Vec<Locale> = self
            .bundles
            .keys()
            .filter_map(|tag| Locale::parse(tag).ok())
            .collect();
        locales.sort_by_key(Locale::tag);
        locales
    }

    /// Load every `<locale>.json` file in `dir`.
    pub fn load_from_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| I18nError::ParseError(format!("invalid filename: {:?}", path)))?;

            let locale = Locale::parse(stem)?;
            let bundle = MessageBundle::from_json(&fs::read_to_string(&path)?)?;
            verdict_log::debug!(
                target: "verdict::i18n",
                "Loaded {} messages for {} from {:?}",
                bundle.len(),
                locale,
                path
            );
            self.add_bundle(&locale, bundle);
        }

        Ok(())
    }
}

/// Read-only translator with a fallback locale.
///
/// Cheap to clone; the bundles are shared.
#[derive(Debug, Clone)]
pub struct Translator {
    messages: Arc<Messages>,
    fallback: Locale,
}

impl Translator {
    pub fn new(messages: Messages, fallback: Locale) -> Self {
        Self {
            messages: Arc::new(messages),
            fallback,
        }
    }

    pub fn fallback(&self) -> &Locale {
        &self.fallback
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Look up `key` in `locale`, then in the fallback locale.
    pub fn lookup(&self, key: &str, locale: &Locale) -> Option<&str> {
        self.messages
            .get_bundle(locale)
            .and_then(|bundle| bundle.get(key))
            .or_else(|| {
                self.messages
                    .get_bundle(&self.fallback)
                    .and_then(|bundle| bundle.get(key))
            })
    }

    /// Translate `key`, returning the key itself when nothing matches.
    pub fn t(&self, key: &str, locale: &Locale) -> String {
        self.lookup(key, locale).unwrap_or(key).to_string()
    }
}
