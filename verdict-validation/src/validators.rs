// Built-in rules

use crate::{Failure, RuleImplementation, ValidationContext};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// Common regex patterns
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{M}]+$").unwrap());

static ALPHA_NUM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}\p{N}]+$").unwrap());

/// Absent, `null`, blank string, or an empty sequence/mapping.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}

/// String form of a scalar, as used for membership and display.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `6` rather than `6.0` in messages.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Measured size of a value for the size family of rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub amount: f64,
    /// `numeric`, `string` or `array`; selects the message variant
    pub kind: &'static str,
}

/// Numbers by value, sequences and mappings by length, everything else by
/// character count. Numeric strings count as numbers when the field also
/// carries `numeric` or `integer`.
pub fn measure(value: &Value, ctx: &ValidationContext<'_>) -> Measure {
    let numeric_field = ctx.has_rule("numeric") || ctx.has_rule("integer");
    match value {
        Value::Number(n) => Measure {
            amount: n.as_f64().unwrap_or_default(),
            kind: "numeric",
        },
        Value::String(s) => match parse_number(s).filter(|_| numeric_field) {
            Some(amount) => Measure {
                amount,
                kind: "numeric",
            },
            None => Measure {
                amount: s.chars().count() as f64,
                kind: "string",
            },
        },
        Value::Array(items) => Measure {
            amount: items.len() as f64,
            kind: "array",
        },
        Value::Object(map) => Measure {
            amount: map.len() as f64,
            kind: "array",
        },
        Value::Bool(b) => Measure {
            amount: b.to_string().len() as f64,
            kind: "string",
        },
        Value::Null => Measure {
            amount: 0.0,
            kind: "string",
        },
    }
}

// Presence

/// Value must be present and non-empty. `false` and `0` count as present.
pub struct Required;

impl RuleImplementation for Required {
    fn name(&self) -> &str {
        "required"
    }

    fn is_implicit(&self) -> bool {
        true
    }

    fn evaluate(&self, value: Option<&Value>, _ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        if is_empty_value(value) {
            failures.push(Failure::key("required"));
        }
    }
}

/// Rules that only change how the engine treats a field
/// (`bail`, `nullable`, `sometimes`).
pub struct Marker(pub &'static str);

impl RuleImplementation for Marker {
    fn name(&self) -> &str {
        self.0
    }

    fn evaluate(&self, _value: Option<&Value>, _ctx: &ValidationContext<'_>, _failures: &mut Vec<Failure>) {}
}

// Formats

/// A string check backed by a regex.
pub struct Pattern {
    name: &'static str,
    regex: &'static Lazy<Regex>,
}

impl Pattern {
    pub fn email() -> Self {
        Self { name: "email", regex: &EMAIL_REGEX }
    }

    pub fn url() -> Self {
        Self { name: "url", regex: &URL_REGEX }
    }

    pub fn uuid() -> Self {
        Self { name: "uuid", regex: &UUID_REGEX }
    }

    pub fn alpha() -> Self {
        Self { name: "alpha", regex: &ALPHA_REGEX }
    }

    pub fn alpha_num() -> Self {
        Self { name: "alpha_num", regex: &ALPHA_NUM_REGEX }
    }
}

impl RuleImplementation for Pattern {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, value: Option<&Value>, _ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let matched = value
            .and_then(Value::as_str)
            .is_some_and(|s| self.regex.is_match(s));
        if !matched {
            failures.push(Failure::key(self.name));
        }
    }
}

/// User supplied pattern for `regex:` / `not_regex:`.
pub struct Matches {
    regex: Regex,
    negate: bool,
}

impl Matches {
    /// Accepts a bare pattern or a delimited one such as `/^[a-z]+$/i`.
    pub fn new(pattern: &str, negate: bool) -> Result<Self, regex::Error> {
        let source = match pattern.strip_prefix('/').and_then(|p| p.rfind('/').map(|end| (p, end))) {
            Some((body, end)) => {
                let flags = &body[end + 1..];
                let inner = &body[..end];
                if flags.is_empty() {
                    inner.to_string()
                } else {
                    format!("(?{}){}", flags, inner)
                }
            }
            None => pattern.to_string(),
        };

        Ok(Self {
            regex: Regex::new(&source)?,
            negate,
        })
    }
}

impl RuleImplementation for Matches {
    fn name(&self) -> &str {
        if self.negate { "not_regex" } else { "regex" }
    }

    fn evaluate(&self, value: Option<&Value>, _ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let passed = match value.and_then(Value::as_str) {
            Some(s) => self.regex.is_match(s) != self.negate,
            None => false,
        };
        if !passed {
            failures.push(Failure::key(self.name()));
        }
    }
}

// Types

/// Type checks: `string`, `numeric`, `integer`, `boolean`, `array`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCheck {
    String,
    Numeric,
    Integer,
    Boolean,
    Array,
}

impl TypeCheck {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeCheck::String => value.is_string(),
            TypeCheck::Numeric => match value {
                Value::Number(_) => true,
                Value::String(s) => parse_number(s).is_some(),
                _ => false,
            },
            TypeCheck::Integer => match value {
                Value::Number(n) => n.is_i64() || n.is_u64(),
                Value::String(s) => s.trim().parse::<i64>().is_ok(),
                _ => false,
            },
            TypeCheck::Boolean => match value {
                Value::Bool(_) => true,
                Value::Number(n) => n.as_u64().is_some_and(|n| n <= 1),
                Value::String(s) => s == "0" || s == "1",
                _ => false,
            },
            TypeCheck::Array => value.is_array() || value.is_object(),
        }
    }
}

impl RuleImplementation for TypeCheck {
    fn name(&self) -> &str {
        match self {
            TypeCheck::String => "string",
            TypeCheck::Numeric => "numeric",
            TypeCheck::Integer => "integer",
            TypeCheck::Boolean => "boolean",
            TypeCheck::Array => "array",
        }
    }

    fn evaluate(&self, value: Option<&Value>, _ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        if !value.is_some_and(|v| self.accepts(v)) {
            failures.push(Failure::key(self.name()));
        }
    }
}

// Size

/// Minimum length, count or value
pub struct Min(pub f64);

/// Maximum length, count or value
pub struct Max(pub f64);

/// Exact length, count or value
pub struct Size(pub f64);

/// Inclusive range of length, count or value
pub struct Between {
    pub min: f64,
    pub max: f64,
}

fn size_failure(rule: &str, kind: &str) -> Failure {
    Failure::key(format!("{}.{}", rule, kind))
}

impl RuleImplementation for Min {
    fn name(&self) -> &str {
        "min"
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let measure = measure(value.unwrap_or(&Value::Null), ctx);
        if measure.amount < self.0 {
            failures.push(size_failure("min", measure.kind).with("min", format_number(self.0)));
        }
    }
}

impl RuleImplementation for Max {
    fn name(&self) -> &str {
        "max"
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let measure = measure(value.unwrap_or(&Value::Null), ctx);
        if measure.amount > self.0 {
            failures.push(size_failure("max", measure.kind).with("max", format_number(self.0)));
        }
    }
}

impl RuleImplementation for Size {
    fn name(&self) -> &str {
        "size"
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let measure = measure(value.unwrap_or(&Value::Null), ctx);
        if measure.amount != self.0 {
            failures.push(size_failure("size", measure.kind).with("size", format_number(self.0)));
        }
    }
}

impl RuleImplementation for Between {
    fn name(&self) -> &str {
        "between"
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let measure = measure(value.unwrap_or(&Value::Null), ctx);
        if measure.amount < self.min || measure.amount > self.max {
            failures.push(
                size_failure("between", measure.kind)
                    .with("min", format_number(self.min))
                    .with("max", format_number(self.max)),
            );
        }
    }
}

// Membership

/// Value must be one of a fixed set.
///
/// ```
/// use verdict_validation::In;
///
/// let rule = In::new(["Rahmat", "Budi", "Joko"]);
/// assert!(rule.contains("Budi"));
/// ```
pub struct In {
    values: Vec<String>,
    negate: bool,
}

impl In {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            negate: false,
        }
    }

    /// Value must not be one of the set
    pub fn not<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            negate: true,
            ..Self::new(values)
        }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.values.iter().any(|v| v == candidate)
    }
}

impl RuleImplementation for In {
    fn name(&self) -> &str {
        if self.negate { "not_in" } else { "in" }
    }

    fn evaluate(&self, value: Option<&Value>, _ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let passed = match value.and_then(scalar_string) {
            Some(s) => self.contains(&s) != self.negate,
            None => false,
        };
        if !passed {
            failures.push(Failure::key(self.name()).with("values", self.values.join(", ")));
        }
    }
}

// Cross-field

/// Compares the value with another field: `same`, `different`, `confirmed`.
pub struct Compare {
    name: &'static str,
    other: Option<String>,
    equal: bool,
}

impl Compare {
    pub fn same(other: impl Into<String>) -> Self {
        Self { name: "same", other: Some(other.into()), equal: true }
    }

    pub fn different(other: impl Into<String>) -> Self {
        Self { name: "different", other: Some(other.into()), equal: false }
    }

    /// Compares against `<attribute>_confirmation`
    pub fn confirmed() -> Self {
        Self { name: "confirmed", other: None, equal: true }
    }
}

impl RuleImplementation for Compare {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let other = match &self.other {
            Some(other) => other.clone(),
            None => format!("{}_confirmation", ctx.attribute()),
        };

        if (ctx.get(&other) == value) != self.equal {
            let failure = Failure::key(self.name);
            failures.push(match self.other {
                Some(_) => failure.with("other", other),
                None => failure,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(rule: &dyn RuleImplementation, value: Value) -> Vec<Failure> {
        check_with(rule, value, &[])
    }

    fn check_with(rule: &dyn RuleImplementation, value: Value, rules: &[&str]) -> Vec<Failure> {
        let data = json!({});
        let rules: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        let ctx = ValidationContext::new(&data, "field", "field", &rules);
        let mut failures = Vec::new();
        rule.evaluate(Some(&value), &ctx, &mut failures);
        failures
    }

    #[test]
    fn test_required() {
        let data = json!({});
        let ctx = ValidationContext::new(&data, "field", "field", &[]);
        let mut failures = Vec::new();
        Required.evaluate(None, &ctx, &mut failures);
        assert_eq!(failures, vec![Failure::key("required")]);

        assert!(!check(&Required, json!("  ")).is_empty());
        assert!(!check(&Required, json!(null)).is_empty());
        assert!(!check(&Required, json!([])).is_empty());
        assert!(check(&Required, json!("Rahmat")).is_empty());
        assert!(check(&Required, json!(false)).is_empty());
        assert!(check(&Required, json!(0)).is_empty());
    }

    #[test]
    fn test_email() {
        assert!(check(&Pattern::email(), json!("rahmat@test.com")).is_empty());
        assert!(check(&Pattern::email(), json!("user+tag@example.co.uk")).is_empty());
        assert_eq!(check(&Pattern::email(), json!("eko")), vec![Failure::key("email")]);
        assert!(!check(&Pattern::email(), json!("@example.com")).is_empty());
        assert!(!check(&Pattern::email(), json!(42)).is_empty());
    }

    #[test]
    fn test_formats() {
        assert!(check(&Pattern::url(), json!("https://example.com/path")).is_empty());
        assert!(!check(&Pattern::url(), json!("//example.com")).is_empty());
        assert!(check(&Pattern::uuid(), json!("550E8400-e29b-41d4-a716-446655440000")).is_empty());
        assert!(!check(&Pattern::uuid(), json!("not-a-uuid")).is_empty());
        assert!(check(&Pattern::alpha(), json!("Rahmat")).is_empty());
        assert!(!check(&Pattern::alpha(), json!("Rahmat1")).is_empty());
        assert!(check(&Pattern::alpha_num(), json!("Rahmat1")).is_empty());
        assert!(!check(&Pattern::alpha_num(), json!("Rahmat 1")).is_empty());
    }

    #[test]
    fn test_matches_with_delimiters_and_flags() {
        let rule = Matches::new("/^[a-z]+$/i", false).unwrap();
        assert!(check(&rule, json!("AbC")).is_empty());
        assert!(!check(&rule, json!("AbC1")).is_empty());

        let rule = Matches::new(r"^\d{3}-\d{4}$", false).unwrap();
        assert!(check(&rule, json!("123-4567")).is_empty());

        let rule = Matches::new("/admin/", true).unwrap();
        assert_eq!(check(&rule, json!("superadmin")), vec![Failure::key("not_regex")]);
        assert!(check(&rule, json!("guest")).is_empty());

        assert!(Matches::new("/(unclosed/", false).is_err());
    }

    #[test]
    fn test_type_checks() {
        assert!(check(&TypeCheck::String, json!("a")).is_empty());
        assert!(!check(&TypeCheck::String, json!(1)).is_empty());
        assert!(check(&TypeCheck::Numeric, json!("12.5")).is_empty());
        assert!(!check(&TypeCheck::Numeric, json!("12a")).is_empty());
        assert!(check(&TypeCheck::Integer, json!("12")).is_empty());
        assert!(!check(&TypeCheck::Integer, json!(1.5)).is_empty());
        assert!(check(&TypeCheck::Boolean, json!("1")).is_empty());
        assert!(check(&TypeCheck::Boolean, json!(false)).is_empty());
        assert!(!check(&TypeCheck::Boolean, json!("yes")).is_empty());
        assert!(check(&TypeCheck::Array, json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_min_max_on_strings_count_characters() {
        assert!(check(&Min(6.0), json!("123456")).is_empty());
        assert_eq!(
            check(&Min(6.0), json!("eko")),
            vec![Failure::key("min.string").with("min", "6")]
        );
        assert!(check(&Max(4.0), json!("ñañá")).is_empty());
        assert_eq!(
            check(&Max(20.0), json!("a".repeat(21))),
            vec![Failure::key("max.string").with("max", "20")]
        );
    }

    #[test]
    fn test_size_rules_on_numbers_and_arrays() {
        assert!(check(&Min(18.0), json!(25)).is_empty());
        assert_eq!(check(&Max(100.0), json!(150))[0].message, crate::FailureMessage::Key("max.numeric".into()));
        assert!(!check(&Max(1.0), json!([1, 2])).is_empty());
        assert!(check(&Size(2.0), json!([1, 2])).is_empty());
        assert!(check(&Between { min: 1.0, max: 10.0 }, json!(10)).is_empty());
        assert!(!check(&Between { min: 1.0, max: 10.0 }, json!(11)).is_empty());
    }

    #[test]
    fn test_numeric_strings_compare_by_value_when_numeric() {
        assert_eq!(
            check(&Min(2.0), json!("9")),
            vec![Failure::key("min.string").with("min", "2")]
        );
        assert_eq!(
            check_with(&Min(18.0), json!("9"), &["numeric"]),
            vec![Failure::key("min.numeric").with("min", "18")]
        );
        assert!(check_with(&Min(18.0), json!("25"), &["integer"]).is_empty());
    }

    #[test]
    fn test_in_and_not_in() {
        let rule = In::new(["Rahmat", "Budi", "Joko"]);
        assert!(check(&rule, json!("Rahmat")).is_empty());
        assert_eq!(
            check(&rule, json!("Eko")),
            vec![Failure::key("in").with("values", "Rahmat, Budi, Joko")]
        );
        assert!(!check(&rule, json!(["Rahmat"])).is_empty());

        let rule = In::not(["root", "admin"]);
        assert!(check(&rule, json!("guest")).is_empty());
        assert!(!check(&rule, json!("admin")).is_empty());
        assert!(check(&In::new(["1", "2"]), json!(2)).is_empty());
    }

    #[test]
    fn test_compare_rules() {
        let data = json!({"username": "rahmat", "password": "rahmat", "password_confirmation": "rahmat"});
        let ctx = ValidationContext::new(&data, "password", "password", &[]);
        let value = json!("rahmat");

        let mut failures = Vec::new();
        Compare::different("username").evaluate(Some(&value), &ctx, &mut failures);
        assert_eq!(failures, vec![Failure::key("different").with("other", "username")]);

        let mut failures = Vec::new();
        Compare::same("username").evaluate(Some(&value), &ctx, &mut failures);
        Compare::confirmed().evaluate(Some(&value), &ctx, &mut failures);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
    }
}
