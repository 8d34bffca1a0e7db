// Rule sets and their compilation against a registry

use crate::path::FieldPattern;
use crate::{
    FailReporter, Failure, In, Password, PredicateFn, Rule, RuleImplementation, RuleRegistry,
    RuleSpecError, ValidationContext,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One entry in a field's rule list.
#[derive(Clone)]
pub enum RuleToken {
    /// `name[:params]`, resolved through the registry
    Named(String),
    /// Closure receiving (attribute, value, reporter)
    Predicate(Arc<PredicateFn>),
    /// Custom rule object
    Stateful(Arc<dyn Rule>),
    /// Pre-built rule value
    Instance(Arc<dyn RuleImplementation>),
}

impl RuleToken {
    pub fn named(token: impl Into<String>) -> Self {
        RuleToken::Named(token.into())
    }

    /// Wrap a closure. Calling `fail` marks the field invalid and may happen
    /// more than once.
    ///
    /// ```
    /// use verdict_validation::RuleToken;
    ///
    /// let uppercase = RuleToken::predicate(|attribute, value, fail| {
    ///     if value.as_str() != value.as_str().map(|s| s.to_uppercase()).as_deref() {
    ///         fail.fail(format!("The {} must be UPPERCASE", attribute));
    ///     }
    /// });
    /// # let _ = uppercase;
    /// ```
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &Value, &mut FailReporter<'_>) + Send + Sync + 'static,
    {
        RuleToken::Predicate(Arc::new(f))
    }

    pub fn stateful<R: Rule + 'static>(rule: R) -> Self {
        RuleToken::Stateful(Arc::new(rule))
    }

    pub fn instance<R: RuleImplementation + 'static>(rule: R) -> Self {
        RuleToken::Instance(Arc::new(rule))
    }

    fn compile(&self, registry: &RuleRegistry, field: &str) -> Result<Arc<dyn RuleImplementation>, RuleSpecError> {
        match self {
            RuleToken::Named(token) => registry.resolve(token, field),
            RuleToken::Predicate(f) => Ok(Arc::new(PredicateRule { f: f.clone() })),
            RuleToken::Stateful(rule) => Ok(Arc::new(ObjectRule { rule: rule.clone() })),
            RuleToken::Instance(rule) => Ok(rule.clone()),
        }
    }
}

impl fmt::Debug for RuleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleToken::Named(token) => f.debug_tuple("Named").field(token).finish(),
            RuleToken::Predicate(_) => f.write_str("Predicate(..)"),
            RuleToken::Stateful(rule) => f.debug_tuple("Stateful").field(&rule.name()).finish(),
            RuleToken::Instance(rule) => f.debug_tuple("Instance").field(&rule.name()).finish(),
        }
    }
}

impl From<&str> for RuleToken {
    fn from(token: &str) -> Self {
        RuleToken::named(token)
    }
}

impl From<String> for RuleToken {
    fn from(token: String) -> Self {
        RuleToken::Named(token)
    }
}

impl From<Password> for RuleToken {
    fn from(rule: Password) -> Self {
        RuleToken::instance(rule)
    }
}

impl From<In> for RuleToken {
    fn from(rule: In) -> Self {
        RuleToken::instance(rule)
    }
}

/// Anything usable as a field's rule list.
///
/// A string is split on `|`, so a regex containing `|` must be given in
/// list form.
pub trait IntoRules {
    fn into_rules(self) -> Vec<RuleToken>;
}

fn split_pipes(rules: &str) -> Vec<RuleToken> {
    rules
        .split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(RuleToken::named)
        .collect()
}

impl IntoRules for &str {
    fn into_rules(self) -> Vec<RuleToken> {
        split_pipes(self)
    }
}

impl IntoRules for String {
    fn into_rules(self) -> Vec<RuleToken> {
        split_pipes(&self)
    }
}

impl IntoRules for RuleToken {
    fn into_rules(self) -> Vec<RuleToken> {
        vec![self]
    }
}

impl<T: Into<RuleToken>> IntoRules for Vec<T> {
    fn into_rules(self) -> Vec<RuleToken> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<RuleToken>, const N: usize> IntoRules for [T; N] {
    fn into_rules(self) -> Vec<RuleToken> {
        self.into_iter().map(Into::into).collect()
    }
}

/// Ordered mapping from field pattern to rules.
///
/// ```
/// use verdict_validation::{Password, RuleSet, RuleToken};
///
/// let rules = RuleSet::new()
///     .field("username", "required|email|max:100")
///     .field("password", vec![RuleToken::from("required"), Password::min(6).letters().into()]);
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    entries: Vec<(String, Vec<RuleToken>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for `pattern`. Repeating a pattern appends to its rules.
    pub fn field(mut self, pattern: impl Into<String>, rules: impl IntoRules) -> Self {
        let pattern = pattern.into();
        let rules = rules.into_rules();
        match self.entries.iter_mut().find(|(existing, _)| *existing == pattern) {
            Some((_, existing)) => existing.extend(rules),
            None => self.entries.push((pattern, rules)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field patterns in declaration order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(pattern, _)| pattern.as_str())
    }

    /// Resolve every token and parse every pattern. Nothing is evaluated.
    pub fn compile(&self, registry: &RuleRegistry) -> Result<CompiledRuleSet, RuleSpecError> {
        let fields = self
            .entries
            .iter()
            .map(|(pattern, tokens)| -> Result<CompiledField, RuleSpecError> {
                let rules = tokens
                    .iter()
                    .map(|token| token.compile(registry, pattern))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledField::new(FieldPattern::parse(pattern)?, rules))
            })
            .collect::<Result<Vec<_>, _>>()?;

        verdict_log::debug!("Compiled rule set with {} field pattern(s)", fields.len());

        Ok(CompiledRuleSet { fields })
    }
}

/// Build a [`RuleSet`] from `pattern => rules` pairs.
///
/// ```
/// use verdict_validation::rules;
///
/// let rules = rules! {
///     "username" => "required|email",
///     "address.*.city" => ["required", "max:100"],
/// };
/// assert_eq!(rules.len(), 2);
/// ```
#[macro_export]
macro_rules! rules {
    ($($pattern:expr => $rules:expr),* $(,)?) => {
        $crate::RuleSet::new()$(.field($pattern, $rules))*
    };
}

/// A rule set whose tokens all resolved.
#[derive(Clone)]
pub struct CompiledRuleSet {
    fields: Vec<CompiledField>,
}

impl CompiledRuleSet {
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }
}

/// Compiled rules for one field pattern.
#[derive(Clone)]
pub struct CompiledField {
    pattern: FieldPattern,
    rules: Vec<Arc<dyn RuleImplementation>>,
    names: Vec<String>,
    bail: bool,
    nullable: bool,
    sometimes: bool,
}

impl CompiledField {
    fn new(pattern: FieldPattern, rules: Vec<Arc<dyn RuleImplementation>>) -> Self {
        let names: Vec<String> = rules.iter().map(|rule| rule.name().to_string()).collect();
        let has = |marker: &str| names.iter().any(|name| name == marker);
        Self {
            bail: has("bail"),
            nullable: has("nullable"),
            sometimes: has("sometimes"),
            pattern,
            rules,
            names,
        }
    }

    pub fn pattern(&self) -> &FieldPattern {
        &self.pattern
    }

    pub fn rules(&self) -> &[Arc<dyn RuleImplementation>] {
        &self.rules
    }

    /// Rule names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn bail(&self) -> bool {
        self.bail
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn sometimes(&self) -> bool {
        self.sometimes
    }
}

impl fmt::Debug for CompiledField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledField")
            .field("pattern", &self.pattern.as_str())
            .field("rules", &self.names)
            .finish()
    }
}

/// Adapts a closure to [`RuleImplementation`].
struct PredicateRule {
    f: Arc<PredicateFn>,
}

impl RuleImplementation for PredicateRule {
    fn name(&self) -> &str {
        "closure"
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        let value = value.unwrap_or(&Value::Null);
        let mut reporter = FailReporter::new(failures);
        (self.f)(ctx.attribute(), value, &mut reporter);
    }
}

/// Adapts a [`Rule`] object to [`RuleImplementation`].
struct ObjectRule {
    rule: Arc<dyn Rule>,
}

impl RuleImplementation for ObjectRule {
    fn name(&self) -> &str {
        self.rule.name()
    }

    fn is_implicit(&self) -> bool {
        self.rule.implicit()
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        if let Err(message) = self.rule.validate(value.unwrap_or(&Value::Null), ctx) {
            failures.push(Failure::text(message));
        }
    }
}
