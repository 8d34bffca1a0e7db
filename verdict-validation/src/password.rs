// Password policy rule

use crate::{Failure, RuleImplementation, ValidationContext};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static LETTER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").unwrap());
static LOWER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Ll}").unwrap());
static UPPER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Lu}").unwrap());
static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{N}").unwrap());
static SYMBOL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{Z}\p{S}\p{P}]").unwrap());

/// Default minimum length of [`Password::defaults`].
pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Password policy. Every enabled facet that fails reports its own message.
///
/// ```
/// use verdict_validation::Password;
///
/// let policy = Password::min(6).letters().numbers().symbols();
/// assert_eq!(policy.min_length(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Password {
    min: usize,
    letters: bool,
    mixed_case: bool,
    numbers: bool,
    symbols: bool,
}

impl Password {
    pub fn min(min: usize) -> Self {
        Self {
            min,
            letters: false,
            mixed_case: false,
            numbers: false,
            symbols: false,
        }
    }

    pub fn defaults() -> Self {
        Self::min(DEFAULT_MIN_LENGTH)
    }

    /// At least one letter
    pub fn letters(mut self) -> Self {
        self.letters = true;
        self
    }

    /// At least one uppercase and one lowercase letter
    pub fn mixed_case(mut self) -> Self {
        self.mixed_case = true;
        self
    }

    /// At least one number
    pub fn numbers(mut self) -> Self {
        self.numbers = true;
        self
    }

    /// At least one symbol
    pub fn symbols(mut self) -> Self {
        self.symbols = true;
        self
    }

    pub fn min_length(&self) -> usize {
        self.min
    }

    /// Build from `password:N,letters,mixed,numbers,symbols` parameters.
    pub fn from_params(params: &[&str]) -> Result<Self, String> {
        let mut policy = Self::defaults();
        for (position, param) in params.iter().map(|p| p.trim()).enumerate() {
            policy = match param {
                "letters" => policy.letters(),
                "mixed" | "mixed_case" => policy.mixed_case(),
                "numbers" => policy.numbers(),
                "symbols" => policy.symbols(),
                length if position == 0 => match length.parse::<usize>() {
                    Ok(min) => Self { min, ..policy },
                    Err(_) => return Err(format!("`{}` is not a valid minimum length", length)),
                },
                other => return Err(format!("unknown password option `{}`", other)),
            };
        }
        Ok(policy)
    }

    /// Failure keys for `candidate`, in facet order.
    fn check(&self, candidate: &str) -> Vec<Failure> {
        let mut failures = Vec::new();

        if candidate.chars().count() < self.min {
            failures.push(Failure::key("min.string").with("min", self.min.to_string()));
        }
        if self.letters && !LETTER_REGEX.is_match(candidate) {
            failures.push(Failure::key("password.letters"));
        }
        if self.mixed_case && !(LOWER_REGEX.is_match(candidate) && UPPER_REGEX.is_match(candidate)) {
            failures.push(Failure::key("password.mixed"));
        }
        if self.numbers && !NUMBER_REGEX.is_match(candidate) {
            failures.push(Failure::key("password.numbers"));
        }
        if self.symbols && !SYMBOL_REGEX.is_match(candidate) {
            failures.push(Failure::key("password.symbols"));
        }

        failures
    }
}

impl Default for Password {
    fn default() -> Self {
        Self::defaults()
    }
}

impl RuleImplementation for Password {
    fn name(&self) -> &str {
        "password"
    }

    fn evaluate(&self, value: Option<&Value>, _ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        match value.and_then(Value::as_str) {
            Some(candidate) => failures.extend(self.check(candidate)),
            None => failures.push(Failure::key("string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(policy: &Password, candidate: &str) -> Vec<String> {
        policy
            .check(candidate)
            .into_iter()
            .map(|f| match f.message {
                crate::FailureMessage::Key(key) => key,
                crate::FailureMessage::Text(text) => text,
            })
            .collect()
    }

    #[test]
    fn test_policy_passes() {
        let policy = Password::min(6).letters().numbers().symbols();
        assert!(keys(&policy, "rahmat123@test.com").is_empty());
    }

    #[test]
    fn test_each_facet_reports_separately() {
        let policy = Password::min(10).letters().mixed_case().numbers().symbols();
        assert_eq!(
            keys(&policy, "abc"),
            vec!["min.string", "password.mixed", "password.numbers", "password.symbols"]
        );
        assert_eq!(keys(&policy, "123456789!"), vec!["password.letters", "password.mixed"]);
    }

    #[test]
    fn test_unicode_classes() {
        let policy = Password::min(1).letters().mixed_case();
        assert!(keys(&policy, "Ñandú").is_empty());
        assert!(keys(&Password::min(1).symbols(), "a b").is_empty());
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(keys(&Password::min(4), "ñañá").is_empty());
        assert_eq!(keys(&Password::defaults(), "short"), vec!["min.string"]);
    }

    #[test]
    fn test_from_params() {
        assert_eq!(Password::from_params(&[]).unwrap(), Password::defaults());
        assert_eq!(
            Password::from_params(&["6", "letters", "mixed"]).unwrap(),
            Password::min(6).letters().mixed_case()
        );
        assert_eq!(
            Password::from_params(&["numbers"]).unwrap(),
            Password::defaults().numbers()
        );
        assert!(Password::from_params(&["six"]).is_err());
        assert!(Password::from_params(&["6", "emoji"]).is_err());
    }
}
