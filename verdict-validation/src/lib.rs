//! Declarative validation for Verdict
//!
//! Rules are declared per field pattern, compiled once against a
//! [`RuleRegistry`], and evaluated against an arbitrary JSON data tree.
//! Failures are rendered into localized messages and collected in a
//! [`ValidationErrors`] bag.
//!
//! # Examples
//!
//! ## Basic Validation
//!
//! ```
//! use serde_json::json;
//! use verdict_validation::{rules, Validator};
//!
//! let data = json!({"username": "eko", "password": "eko"});
//! let validator = Validator::make(&data, &rules! {
//!     "username" => "required|email|max:100",
//!     "password" => ["required", "min:6", "max:20"],
//! })
//! .unwrap();
//!
//! assert!(validator.fails());
//! assert_eq!(
//!     validator.errors().first("password"),
//!     Some("The password field must be at least 6 characters.")
//! );
//! ```
//!
//! ## Nested Arrays
//!
//! ```
//! use serde_json::json;
//! use verdict_validation::{rules, Validator};
//!
//! let data = json!({
//!     "address": [
//!         {"street": "Jalan Belum Ada", "city": "Jakarta"},
//!         {"street": "Jalan Sudah Ada", "city": "Bandung"}
//!     ]
//! });
//! let validator = Validator::make(&data, &rules! {
//!     "address.*.street" => "max:200",
//!     "address.*.city" => "required|max:100",
//! })
//! .unwrap();
//!
//! assert!(validator.passes());
//! ```
//!
//! ## Custom Rules
//!
//! ```
//! use serde_json::json;
//! use verdict_validation::{rules, Password, RuleToken, Validator};
//!
//! let uppercase = RuleToken::predicate(|attribute, value, fail| {
//!     let text = value.as_str().unwrap_or_default();
//!     if text != text.to_uppercase() {
//!         fail.fail(format!("The {} must be UPPERCASE", attribute));
//!     }
//! });
//!
//! let data = json!({"username": "rahmat", "password": "rahmat123@test.com"});
//! let validator = Validator::make(&data, &rules! {
//!     "username" => vec![RuleToken::from("required"), uppercase],
//!     "password" => vec![RuleToken::from("required"), Password::min(6).letters().numbers().into()],
//! })
//! .unwrap();
//!
//! assert_eq!(validator.errors().first("username"), Some("The username must be UPPERCASE"));
//! ```

mod config;
mod errors;
mod messages;
mod password;
mod path;
mod pipe;
mod registry;
mod rules;
mod traits;
mod validator;
pub mod validators;

pub use config::*;
pub use errors::*;
pub use messages::{DEFAULT_MESSAGE, MessageFormatter, MessageTarget, builtin_locales};
pub use password::*;
pub use path::{ConcreteField, FieldPattern, PathSegment, expand, lookup};
pub use pipe::*;
pub use registry::*;
pub use rules::*;
pub use traits::*;
pub use validator::*;
pub use validators::In;
