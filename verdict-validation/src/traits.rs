// Validation traits

use crate::path;
use serde_json::Value;

/// A failure reported by a rule, before it is rendered into a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: FailureMessage,
    /// Placeholder values, e.g. `("min", "6")` for `:min`
    pub replacements: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureMessage {
    /// Translation key such as `required` or `min.string`
    Key(String),
    /// Text written by the rule; only placeholders are substituted
    Text(String),
}

impl Failure {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            message: FailureMessage::Key(key.into()),
            replacements: Vec::new(),
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: FailureMessage::Text(message.into()),
            replacements: Vec::new(),
        }
    }

    pub fn with(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        self.replacements.push((placeholder.into(), value.into()));
        self
    }
}

/// What a rule can see besides its own value.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    data: &'a Value,
    attribute: &'a str,
    pattern: &'a str,
    rules: &'a [String],
}

impl<'a> ValidationContext<'a> {
    pub fn new(data: &'a Value, attribute: &'a str, pattern: &'a str, rules: &'a [String]) -> Self {
        Self {
            data,
            attribute,
            pattern,
            rules,
        }
    }

    /// The whole data tree under validation
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Concrete path of the field being validated
    pub fn attribute(&self) -> &'a str {
        self.attribute
    }

    /// Pattern the field was expanded from
    pub fn pattern(&self) -> &'a str {
        self.pattern
    }

    /// Value of another field by literal dotted path
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        path::lookup(path, self.data)
    }

    /// Whether the field also carries the named rule
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule == name)
    }
}

/// The single interface every compiled rule is dispatched through.
pub trait RuleImplementation: Send + Sync {
    /// Rule identity recorded on failures
    fn name(&self) -> &str;

    /// Implicit rules also run when the value is absent or blank.
    fn is_implicit(&self) -> bool {
        false
    }

    /// Check `value` and push any failures.
    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>);
}

/// A stateful custom rule object.
///
/// ```
/// use serde_json::Value;
/// use verdict_validation::{Rule, ValidationContext};
///
/// struct Uppercase;
///
/// impl Rule for Uppercase {
///     fn validate(&self, value: &Value, _ctx: &ValidationContext<'_>) -> Result<(), String> {
///         match value.as_str() {
///             Some(s) if s == s.to_uppercase() => Ok(()),
///             _ => Err("The :attribute must be UPPERCASE".to_string()),
///         }
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// `Err` carries the message; `:attribute` is substituted afterwards.
    fn validate(&self, value: &Value, ctx: &ValidationContext<'_>) -> Result<(), String>;

    fn name(&self) -> &str {
        "custom"
    }

    /// Run even when the value is absent (seen as `null`) or blank.
    fn implicit(&self) -> bool {
        false
    }
}

/// Handle passed to predicate closures for reporting failures.
pub struct FailReporter<'f> {
    failures: &'f mut Vec<Failure>,
}

impl<'f> FailReporter<'f> {
    pub fn new(failures: &'f mut Vec<Failure>) -> Self {
        Self { failures }
    }

    /// Record a failure. Evaluation continues afterwards.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(Failure::text(message));
    }
}

/// Signature of predicate rules: (attribute, value, reporter).
pub type PredicateFn = dyn Fn(&str, &Value, &mut FailReporter<'_>) + Send + Sync;
