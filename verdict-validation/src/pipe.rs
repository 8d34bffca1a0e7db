// Validation pipe for request validation

use crate::{RuleSet, RuleSpecError, ValidationFailed, ValidatorFactory};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use thiserror::Error;
use verdict_core::{Error, HttpRequest, HttpResponse};
use verdict_i18n::{Locale, negotiate_locale, parse_accept_language};

/// A payload type that knows its own rules.
pub trait Validate {
    fn rules() -> RuleSet;

    /// Custom messages, keyed like [`Validator::messages`](crate::Validator::messages)
    fn messages() -> HashMap<String, String> {
        HashMap::new()
    }

    /// Display names for fields
    fn attributes() -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Why a request did not produce validated data.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The body could not be decoded
    #[error(transparent)]
    Http(#[from] Error),

    /// The data failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationFailed),

    /// The rules themselves are broken
    #[error(transparent)]
    Rules(#[from] RuleSpecError),
}

/// Runs validators for incoming requests and turns failures into responses.
#[derive(Debug, Clone, Default)]
pub struct ValidationPipe {
    factory: ValidatorFactory,
}

impl ValidationPipe {
    pub fn new(factory: ValidatorFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &ValidatorFactory {
        &self.factory
    }

    /// Locale from `Accept-Language`, limited to locales with messages.
    pub fn locale_for(&self, req: &HttpRequest) -> Locale {
        let default = self.factory.locale();
        let Some(header) = req.header("Accept-Language") else {
            return default.clone();
        };

        let available = self.factory.formatter().translator().messages().locales();
        negotiate_locale(&parse_accept_language(header), &available, default).clone()
    }

    /// Decode the body and validate it, returning the validated subset.
    pub fn validate_request(&self, req: &HttpRequest, rules: &RuleSet) -> Result<Value, RequestError> {
        self.validate_with(req, rules, HashMap::new(), HashMap::new())
    }

    /// [`validate_request`](Self::validate_request) with custom messages and
    /// attribute names.
    pub fn validate_with(
        &self,
        req: &HttpRequest,
        rules: &RuleSet,
        messages: HashMap<String, String>,
        attributes: HashMap<String, String>,
    ) -> Result<Value, RequestError> {
        let data = req.data_tree()?;
        let validator = self
            .factory
            .make(&data, rules)?
            .locale(self.locale_for(req))
            .messages(messages)
            .attributes(attributes);

        validator.validate().map_err(|failed| {
            verdict_log::info!(
                "{} {} failed validation on field(s): {}",
                req.method,
                req.path,
                failed.errors().keys().join(", ")
            );
            RequestError::Invalid(failed)
        })
    }

    /// Validate a typed payload and deserialize its validated fields.
    pub fn parse<T>(&self, req: &HttpRequest) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Validate,
    {
        let validated = self.validate_with(req, &T::rules(), T::messages(), T::attributes())?;
        serde_json::from_value(validated)
            .map_err(|e| RequestError::Http(Error::Deserialization(e.to_string())))
    }

    /// Run `handler` with validated data, or answer with the failure.
    pub fn handle<F>(&self, req: &HttpRequest, rules: &RuleSet, handler: F) -> HttpResponse
    where
        F: FnOnce(Value) -> HttpResponse,
    {
        match self.validate_request(req, rules) {
            Ok(data) => handler(data),
            Err(error) => self.error_response(req, error),
        }
    }

    /// Map any [`RequestError`] to a response.
    pub fn error_response(&self, req: &HttpRequest, error: RequestError) -> HttpResponse {
        match error {
            RequestError::Invalid(failed) => Self::failure_response(req, &failed),
            RequestError::Http(error) => error.into(),
            RequestError::Rules(error) => {
                verdict_log::error!("Invalid rules for {} {}: {}", req.method, req.path, error);
                Error::Internal("Server error".to_string()).into()
            }
        }
    }

    /// 422 JSON for clients that accept JSON, otherwise a 302 back to the
    /// referring page.
    pub fn failure_response(req: &HttpRequest, failed: &ValidationFailed) -> HttpResponse {
        if !req.wants_json() {
            let back = req.header("Referer").unwrap_or("/");
            return HttpResponse::redirect(back);
        }

        let errors = failed.errors();
        let body = json!({
            "message": summary(errors.errors.first().map(|e| e.message.as_str()), errors.len()),
            "errors": errors.to_json(),
        });

        HttpResponse::unprocessable_entity()
            .with_json(&body)
            .unwrap_or_else(HttpResponse::from)
    }
}

/// `The username field is required. (and 2 more errors)`
fn summary(first: Option<&str>, total: usize) -> String {
    let first = first.unwrap_or("The given data was invalid.");
    match total.saturating_sub(1) {
        0 => first.to_string(),
        1 => format!("{} (and 1 more error)", first),
        more => format!("{} (and {} more errors)", first, more),
    }
}
