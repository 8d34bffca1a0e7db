//! Internationalization support for Verdict
//!
//! - **Locales**: parse and print BCP 47 style tags
//! - **Accept-Language**: rank and negotiate client preferences
//! - **Message bundles**: JSON message tables with locale fallback
//!
//! # Quick Start
//!
//! ```rust
//! use verdict_i18n::{Locale, MessageBundle, Messages, Translator};
//!
//! let mut messages = Messages::new();
//! messages.add_bundle(&Locale::en(), MessageBundle::new().with("required", "The :attribute field is required."));
//! messages.add_bundle(&Locale::id(), MessageBundle::new().with("required", ":attribute wajib diisi."));
//!
//! let translator = Translator::new(messages, Locale::en());
//! assert_eq!(translator.t("required", &Locale::id()), ":attribute wajib diisi.");
//! ```

mod error;
mod locale;
mod messages;

pub use error::I18nError;
pub use locale::{Locale, negotiate_locale, parse_accept_language};
pub use messages::{MessageBundle, Messages, Translator};

/// Result type for i18n operations
pub type Result<T> = std::result::Result<T, I18nError>;
