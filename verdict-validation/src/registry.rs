// Rule registry

use crate::validators::{Between, Compare, In, Marker, Matches, Max, Min, Pattern, Size, TypeCheck};
use crate::{Failure, Password, RuleImplementation, RuleSpecError, ValidationContext};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Parameters of a named rule token, e.g. `6` in `min:6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParameters {
    rule: String,
    raw: Option<String>,
}

impl RuleParameters {
    /// Split a `name[:params]` token.
    pub fn parse(token: &str) -> Self {
        match token.split_once(':') {
            Some((rule, raw)) => Self {
                rule: rule.trim().to_string(),
                raw: Some(raw.to_string()),
            },
            None => Self {
                rule: token.trim().to_string(),
                raw: None,
            },
        }
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Everything after the first `:`, untouched
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Comma-separated parameters, trimmed
    pub fn list(&self) -> Vec<&str> {
        match self.raw.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.split(',').map(str::trim).collect(),
            _ => Vec::new(),
        }
    }

    /// Exactly `count` parameters, or an error naming the expected form.
    pub fn expect(&self, count: usize) -> Result<Vec<&str>, String> {
        let list = self.list();
        if list.len() == count {
            Ok(list)
        } else {
            Err(format!(
                "expected {} parameter(s), found {}",
                count,
                list.len()
            ))
        }
    }

    /// Single numeric parameter
    pub fn number(&self) -> Result<f64, String> {
        let list = self.expect(1)?;
        parse_number(list[0])
    }

    /// At least one parameter
    pub fn non_empty(&self) -> Result<Vec<&str>, String> {
        let list = self.list();
        if list.is_empty() {
            Err("at least one parameter is required".to_string())
        } else {
            Ok(list)
        }
    }
}

fn parse_number(param: &str) -> Result<f64, String> {
    param
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("`{}` is not a number", param))
}

/// Builds a rule implementation from its parameters.
pub type RuleFactory =
    Arc<dyn Fn(&RuleParameters) -> Result<Arc<dyn RuleImplementation>, String> + Send + Sync>;

static GLOBAL: Lazy<Arc<RuleRegistry>> = Lazy::new(|| Arc::new(RuleRegistry::with_builtins()));

/// Catalog of named rules.
///
/// Built once, wrapped in an `Arc` and only read afterwards.
///
/// ```
/// use std::sync::Arc;
/// use verdict_validation::{In, RuleRegistry};
///
/// let registry = RuleRegistry::with_builtins()
///     .register_rule("staff", In::new(["Rahmat", "Budi", "Joko"]));
/// let registry = Arc::new(registry);
/// assert!(registry.contains("staff"));
/// assert!(registry.resolve("staff", "username").is_ok());
/// ```
#[derive(Clone, Default)]
pub struct RuleRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set
    pub fn with_builtins() -> Self {
        Self::new()
            .register("required", |_| Ok(Arc::new(crate::validators::Required)))
            .register("bail", |_| Ok(Arc::new(Marker("bail"))))
            .register("nullable", |_| Ok(Arc::new(Marker("nullable"))))
            .register("sometimes", |_| Ok(Arc::new(Marker("sometimes"))))
            .register("email", |_| Ok(Arc::new(Pattern::email())))
            .register("url", |_| Ok(Arc::new(Pattern::url())))
            .register("uuid", |_| Ok(Arc::new(Pattern::uuid())))
            .register("alpha", |_| Ok(Arc::new(Pattern::alpha())))
            .register("alpha_num", |_| Ok(Arc::new(Pattern::alpha_num())))
            .register("string", |_| Ok(Arc::new(TypeCheck::String)))
            .register("numeric", |_| Ok(Arc::new(TypeCheck::Numeric)))
            .register("integer", |_| Ok(Arc::new(TypeCheck::Integer)))
            .register("boolean", |_| Ok(Arc::new(TypeCheck::Boolean)))
            .register("array", |_| Ok(Arc::new(TypeCheck::Array)))
            .register("min", |p| Ok(Arc::new(Min(p.number()?))))
            .register("max", |p| Ok(Arc::new(Max(p.number()?))))
            .register("size", |p| Ok(Arc::new(Size(p.number()?))))
            .register("between", |p| {
                let list = p.expect(2)?;
                let (min, max) = (parse_number(list[0])?, parse_number(list[1])?);
                if min > max {
                    return Err(format!("lower bound {} exceeds upper bound {}", min, max));
                }
                Ok(Arc::new(Between { min, max }))
            })
            .register("in", |p| Ok(Arc::new(In::new(p.non_empty()?))))
            .register("not_in", |p| Ok(Arc::new(In::not(p.non_empty()?))))
            .register("password", |p| Ok(Arc::new(Password::from_params(&p.list())?)))
            .register("regex", |p| regex_rule(p, false))
            .register("not_regex", |p| regex_rule(p, true))
            .register("same", |p| Ok(Arc::new(Compare::same(p.expect(1)?[0]))))
            .register("different", |p| Ok(Arc::new(Compare::different(p.expect(1)?[0]))))
            .register("confirmed", |_| Ok(Arc::new(Compare::confirmed())))
    }

    /// Process-wide registry holding the built-ins
    pub fn global() -> Arc<RuleRegistry> {
        GLOBAL.clone()
    }

    /// Add or replace a named rule factory.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RuleParameters) -> Result<Arc<dyn RuleImplementation>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Add or replace a named rule that takes no parameters.
    pub fn register_rule<R>(self, name: impl Into<String>, rule: R) -> Self
    where
        R: RuleImplementation + 'static,
    {
        let rule: Arc<dyn RuleImplementation> = Arc::new(rule);
        self.register(name, move |_| Ok(rule.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered rule names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a `name[:params]` token for `field`.
    pub fn resolve(&self, token: &str, field: &str) -> Result<Arc<dyn RuleImplementation>, RuleSpecError> {
        let params = RuleParameters::parse(token);

        let Some(factory) = self.factories.get(params.rule()) else {
            verdict_log::warn!("Unknown validation rule `{}` on field `{}`", params.rule(), field);
            return Err(RuleSpecError::UnknownRule {
                field: field.to_string(),
                rule: params.rule().to_string(),
            });
        };

        let rule = factory(&params).map_err(|reason| RuleSpecError::InvalidParameters {
            field: field.to_string(),
            rule: params.rule().to_string(),
            reason,
        })?;

        if rule.name() == params.rule() {
            return Ok(rule);
        }
        Ok(Arc::new(Named {
            name: params.rule().to_string(),
            inner: rule,
        }))
    }
}

/// A rule reported under the name it was registered with.
struct Named {
    name: String,
    inner: Arc<dyn RuleImplementation>,
}

impl RuleImplementation for Named {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_implicit(&self) -> bool {
        self.inner.is_implicit()
    }

    fn evaluate(&self, value: Option<&Value>, ctx: &ValidationContext<'_>, failures: &mut Vec<Failure>) {
        self.inner.evaluate(value, ctx, failures);
    }
}

fn regex_rule(params: &RuleParameters, negate: bool) -> Result<Arc<dyn RuleImplementation>, String> {
    let pattern = params
        .raw()
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| "a pattern is required".to_string())?;
    let rule = Matches::new(pattern, negate).map_err(|e| e.to_string())?;
    Ok(Arc::new(rule))
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters() {
        let params = RuleParameters::parse("between:1, 10");
        assert_eq!(params.rule(), "between");
        assert_eq!(params.list(), vec!["1", "10"]);

        let params = RuleParameters::parse("regex:/^a:b,c$/");
        assert_eq!(params.raw(), Some("/^a:b,c$/"));

        let params = RuleParameters::parse("required");
        assert!(params.list().is_empty());
        assert!(params.number().is_err());
    }

    #[test]
    fn test_builtins_resolve() {
        let registry = RuleRegistry::with_builtins();
        for token in [
            "required", "email", "min:6", "max:100", "size:2", "between:1,5", "in:a,b",
            "not_in:a", "password", "password:6,letters,numbers", "string", "numeric",
            "integer", "boolean", "array", "alpha", "alpha_num", "url", "uuid",
            "regex:/^[a-z]+$/", "not_regex:/x/", "same:username", "different:username",
            "confirmed", "bail", "nullable", "sometimes",
        ] {
            let rule = registry.resolve(token, "field");
            assert!(rule.is_ok(), "{} did not resolve", token);
        }
    }

    #[test]
    fn test_rule_names_match_tokens() {
        let registry = RuleRegistry::with_builtins();
        assert_eq!(registry.resolve("not_in:a", "f").unwrap().name(), "not_in");
        assert_eq!(registry.resolve("min:6", "f").unwrap().name(), "min");
        assert!(registry.resolve("required", "f").unwrap().is_implicit());
    }

    #[test]
    fn test_unknown_rule() {
        let err = RuleRegistry::with_builtins()
            .resolve("uppercase", "username")
            .err()
            .unwrap();
        assert_eq!(
            err,
            RuleSpecError::UnknownRule {
                field: "username".into(),
                rule: "uppercase".into()
            }
        );
    }

    #[test]
    fn test_invalid_parameters() {
        let registry = RuleRegistry::with_builtins();
        for token in ["min", "min:abc", "max:1,2", "between:5,1", "in", "regex", "regex:/(/", "same"] {
            match registry.resolve(token, "field") {
                Err(RuleSpecError::InvalidParameters { .. }) => {}
                _ => panic!("{} should be rejected", token),
            }
        }
    }

    #[test]
    fn test_register_custom_rule() {
        let registry = RuleRegistry::new()
            .register_rule("staff", In::new(["Rahmat"]))
            .register_rule("filled", crate::validators::Required);
        assert_eq!(registry.names(), vec!["filled", "staff"]);
        assert_eq!(registry.resolve("staff", "username").unwrap().name(), "staff");

        let filled = registry.resolve("filled", "username").unwrap();
        assert_eq!(filled.name(), "filled");
        assert!(filled.is_implicit());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&RuleRegistry::global(), &RuleRegistry::global()));
        assert!(RuleRegistry::global().contains("required"));
    }
}
