// Verdict - a declarative validation engine for Rust
//
// Per-field rules over nested data, wildcard rules for arrays, custom rules
// and localized error messages, plus the request plumbing to run them on
// submitted forms.

// Re-export core functionality
pub use verdict_core::*;

pub use verdict_log as log;

// Re-export optional crates
#[cfg(feature = "i18n")]
pub use verdict_i18n;

#[cfg(feature = "validation")]
pub use verdict_validation;

#[cfg(feature = "validation")]
pub use verdict_validation::rules;

// Prelude for common imports
pub mod prelude {
    pub use crate::{Error, HttpRequest, HttpResponse, parse_form_tree};

    #[cfg(feature = "i18n")]
    pub use verdict_i18n::Locale;

    #[cfg(feature = "validation")]
    pub use verdict_validation::{
        In, Password, RequestError, Rule, RuleRegistry, RuleSet, RuleSpecError, RuleToken,
        Validate, ValidationConfig, ValidationContext, ValidationErrors, ValidationFailed,
        ValidationPipe, ValidationResult, Validator, ValidatorFactory,
    };
}
