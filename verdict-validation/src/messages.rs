// Message rendering

use crate::{Failure, FailureMessage};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use verdict_i18n::{Locale, MessageBundle, Messages, Translator};

/// Used when nothing else matches a failure key.
pub const DEFAULT_MESSAGE: &str = "The :attribute field is invalid.";

static BUILTIN: Lazy<Messages> = Lazy::new(|| {
    let mut messages = Messages::new();
    for (locale, source) in [
        (Locale::en(), include_str!("../lang/en.json")),
        (Locale::id(), include_str!("../lang/id.json")),
    ] {
        let bundle = MessageBundle::from_json(source).expect("embedded locale table is valid JSON");
        messages.add_bundle(&locale, bundle);
    }
    messages
});

/// Locales with a built-in table
pub fn builtin_locales() -> Vec<Locale> {
    BUILTIN.locales()
}

/// Per-validator overrides consulted before the locale tables.
#[derive(Debug, Clone, Copy)]
pub struct MessageTarget<'a> {
    /// Concrete path, e.g. `address.0.city`
    pub attribute: &'a str,
    /// Pattern the path was expanded from
    pub pattern: &'a str,
    /// Name of the rule that failed
    pub rule: &'a str,
    pub messages: &'a HashMap<String, String>,
    pub attributes: &'a HashMap<String, String>,
}

/// Turns failures into text using locale tables and overrides.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    translator: Translator,
}

impl MessageFormatter {
    pub fn new(translator: Translator) -> Self {
        Self { translator }
    }

    /// English and Indonesian tables, falling back to English
    pub fn builtin() -> Self {
        Self::new(Translator::new(BUILTIN.clone(), Locale::en()))
    }

    /// Built-in tables with `extra` merged over them.
    pub fn builtin_with(extra: Messages, fallback: Locale) -> Self {
        let mut messages = BUILTIN.clone();
        for locale in extra.locales() {
            if let Some(bundle) = extra.get_bundle(&locale) {
                messages.add_bundle(&locale, bundle.clone());
            }
        }
        Self::new(Translator::new(messages, fallback))
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Render one failure for `target` in `locale`.
    pub fn render(&self, failure: &Failure, target: &MessageTarget<'_>, locale: &Locale) -> String {
        let template = match &failure.message {
            FailureMessage::Text(text) => text.clone(),
            FailureMessage::Key(key) => self.template(key, target, locale),
        };

        let display = self.display_name(target.attribute, target.pattern, target.attributes, locale);
        let mut replacements = vec![
            ("attribute".to_string(), display.clone()),
            ("Attribute".to_string(), upper_first(&display)),
            ("ATTRIBUTE".to_string(), display.to_uppercase()),
        ];
        for (name, value) in &failure.replacements {
            let value = if name == "other" {
                self.display_name(value, value, target.attributes, locale)
            } else {
                value.clone()
            };
            replacements.push((name.clone(), value));
        }

        substitute(&template, &replacements)
    }

    /// Template for `key`, honouring custom messages first.
    ///
    /// A keyed sub-failure such as `min.string` also matches overrides for
    /// its family `min`, even when raised by another rule.
    fn template(&self, key: &str, target: &MessageTarget<'_>, locale: &Locale) -> String {
        let family = key.split_once('.').map_or(key, |(family, _)| family);
        let candidates = [
            format!("{}.{}", target.attribute, key),
            format!("{}.{}", target.attribute, family),
            format!("{}.{}", target.attribute, target.rule),
            format!("{}.{}", target.pattern, key),
            format!("{}.{}", target.pattern, family),
            format!("{}.{}", target.pattern, target.rule),
            key.to_string(),
            family.to_string(),
            target.rule.to_string(),
        ];

        if let Some(custom) = candidates.iter().find_map(|c| target.messages.get(c)) {
            return custom.clone();
        }

        self.translator
            .lookup(key, locale)
            .or_else(|| self.translator.lookup("invalid", locale))
            .unwrap_or(DEFAULT_MESSAGE)
            .to_string()
    }

    /// Human form of a field path.
    pub fn display_name(
        &self,
        attribute: &str,
        pattern: &str,
        attributes: &HashMap<String, String>,
        locale: &Locale,
    ) -> String {
        if let Some(name) = attributes.get(attribute).or_else(|| attributes.get(pattern)) {
            return name.clone();
        }
        if let Some(name) = self.translator.lookup(&format!("attributes.{}", attribute), locale) {
            return name.to_string();
        }
        attribute.replace('_', " ")
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::builtin()
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace `:name` placeholders in one pass, longest name first.
fn substitute(template: &str, replacements: &[(String, String)]) -> String {
    let mut ordered: Vec<&(String, String)> = replacements.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match ordered.iter().find(|(name, _)| after.starts_with(name.as_str())) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len()..];
            }
            None => {
                out.push(':');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
