// Validation engine

use crate::messages::MessageTarget;
use crate::path;
use crate::validators::scalar_string;
use crate::{
    CompiledField, CompiledRuleSet, Failure, MessageFormatter, RuleImplementation, RuleRegistry,
    RuleSet, RuleSpecError, ValidationConfig, ValidationContext, ValidationError,
    ValidationErrors, ValidationFailed,
};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use verdict_i18n::{I18nError, Locale, Messages};

static BUILTIN_FORMATTER: Lazy<Arc<MessageFormatter>> =
    Lazy::new(|| Arc::new(MessageFormatter::builtin()));

/// Cross-field check run after every field rule.
pub type AfterHook<'a> = Box<dyn Fn(&Value, &mut ValidationErrors) + 'a>;

/// Builds validators that share a registry, formatter and default locale.
///
/// Cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct ValidatorFactory {
    registry: Arc<RuleRegistry>,
    formatter: Arc<MessageFormatter>,
    locale: Locale,
}

impl ValidatorFactory {
    /// Global registry, built-in messages, English
    pub fn new() -> Self {
        Self {
            registry: RuleRegistry::global(),
            formatter: BUILTIN_FORMATTER.clone(),
            locale: Locale::en(),
        }
    }

    /// Apply locale settings and load any extra message files.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, I18nError> {
        let mut extra = Messages::new();
        if let Some(dir) = &config.lang_dir {
            extra.load_from_dir(dir)?;
        }

        let formatter = MessageFormatter::builtin_with(extra, config.fallback_locale.clone());
        Ok(Self::new()
            .with_formatter(formatter)
            .with_locale(config.locale.clone()))
    }

    pub fn with_registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Compile `rules` and bind them to `data`. Unknown rules, bad
    /// parameters and malformed patterns fail here.
    pub fn make<'a>(&self, data: &'a Value, rules: &RuleSet) -> Result<Validator<'a>, RuleSpecError> {
        Ok(Validator {
            data,
            rules: rules.compile(&self.registry)?,
            formatter: self.formatter.clone(),
            locale: self.locale.clone(),
            messages: HashMap::new(),
            attributes: HashMap::new(),
            after: Vec::new(),
            result: OnceCell::new(),
        })
    }
}

impl Default for ValidatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one validation run. Never changes once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    errors: ValidationErrors,
    validated: Value,
}

impl ValidationResult {
    pub fn passes(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fails(&self) -> bool {
        !self.passes()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Present input restricted to the fields that carry rules
    pub fn validated(&self) -> &Value {
        &self.validated
    }

    pub fn into_parts(self) -> (ValidationErrors, Value) {
        (self.errors, self.validated)
    }
}

/// One data tree bound to a compiled rule set.
///
/// ```
/// use serde_json::json;
/// use verdict_validation::{rules, Validator};
///
/// let data = json!({"username": "Rahmat", "password": "123456"});
/// let validator = Validator::make(&data, &rules! {
///     "username" => "required",
///     "password" => "required",
/// })
/// .unwrap();
///
/// assert!(validator.passes());
/// ```
pub struct Validator<'a> {
    data: &'a Value,
    rules: CompiledRuleSet,
    formatter: Arc<MessageFormatter>,
    locale: Locale,
    messages: HashMap<String, String>,
    attributes: HashMap<String, String>,
    after: Vec<AfterHook<'a>>,
    result: OnceCell<ValidationResult>,
}

impl<'a> Validator<'a> {
    /// Build with the default factory.
    pub fn make(data: &'a Value, rules: &RuleSet) -> Result<Self, RuleSpecError> {
        ValidatorFactory::new().make(data, rules)
    }

    /// Custom messages keyed by `rule`, `field.rule` or `pattern.rule`.
    pub fn messages<I, K, V>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.messages
            .extend(messages.into_iter().map(|(k, v)| (k.into(), v.into())));
        self.result = OnceCell::new();
        self
    }

    /// Display names keyed by concrete path or pattern.
    pub fn attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(attributes.into_iter().map(|(k, v)| (k.into(), v.into())));
        self.result = OnceCell::new();
        self
    }

    /// Add a hook run after all field rules, in registration order.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &mut ValidationErrors) + 'a,
    {
        self.after.push(Box::new(hook));
        self.result = OnceCell::new();
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self.result = OnceCell::new();
        self
    }

    /// The data under validation
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Evaluate every rule against the data. Each call is a fresh run.
    pub fn run(&self) -> ValidationResult {
        let mut errors = ValidationErrors::default();
        let mut validated = Value::Object(Map::new());
        let mut checked = 0usize;

        for field in self.rules.fields() {
            for concrete in field.pattern().expand(self.data) {
                checked += 1;
                if field.sometimes() && !concrete.is_present() {
                    continue;
                }

                let attribute = concrete.path();
                self.check_field(field, &attribute, concrete.value, &mut errors);

                if let Some(value) = concrete.value {
                    path::insert(&mut validated, &concrete.segments, value.clone());
                }
            }
        }

        for hook in &self.after {
            hook(self.data, &mut errors);
        }

        verdict_log::event(
            verdict_log::Level::Debug,
            module_path!(),
            "Validation run finished",
            &[
                ("fields", checked.to_string()),
                ("failures", errors.len().to_string()),
            ],
        );

        ValidationResult { errors, validated }
    }

    fn check_field(
        &self,
        field: &CompiledField,
        attribute: &str,
        value: Option<&Value>,
        errors: &mut ValidationErrors,
    ) {
        let pattern = field.pattern().as_str();
        let ctx = ValidationContext::new(self.data, attribute, pattern, field.names());
        let skip_optional = match value {
            None => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Null) => field.nullable(),
            Some(_) => false,
        };

        for rule in field.rules() {
            if skip_optional && !rule.is_implicit() {
                continue;
            }

            let mut failures = Vec::new();
            rule.evaluate(value, &ctx, &mut failures);

            for failure in &failures {
                errors.add(self.record(failure, rule.as_ref(), attribute, pattern, value));
            }

            if field.bail() && !failures.is_empty() {
                break;
            }
        }
    }

    fn record(
        &self,
        failure: &Failure,
        rule: &dyn RuleImplementation,
        attribute: &str,
        pattern: &str,
        value: Option<&Value>,
    ) -> ValidationError {
        let target = MessageTarget {
            attribute,
            pattern,
            rule: rule.name(),
            messages: &self.messages,
            attributes: &self.attributes,
        };
        let message = self.formatter.render(failure, &target, &self.locale);
        let error = ValidationError::new(attribute, message).with_constraint(rule.name());

        match value.and_then(scalar_string) {
            Some(value) => error.with_value(value),
            None => error,
        }
    }

    /// Run once and keep the result.
    pub fn result(&self) -> &ValidationResult {
        self.result.get_or_init(|| self.run())
    }

    pub fn passes(&self) -> bool {
        self.result().passes()
    }

    pub fn fails(&self) -> bool {
        self.result().fails()
    }

    pub fn errors(&self) -> &ValidationErrors {
        self.result().errors()
    }

    /// Validated subset, or [`ValidationFailed`] carrying the full result.
    pub fn validate(&self) -> Result<Value, ValidationFailed> {
        let result = self.result();
        if result.fails() {
            return Err(ValidationFailed::new(result.clone()));
        }
        Ok(result.validated().clone())
    }

    /// Validated subset regardless of failures
    pub fn validated(&self) -> &Value {
        self.result().validated()
    }
}
