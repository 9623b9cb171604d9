//! Embeddable rule scripts that inspect and rewrite host objects.
//!
//! A host lends its values to an [`Environment`] under root names, then runs
//! a script against it:
//!
//! ```
//! use rulekit::http::Request;
//! use rulekit::{parse, Environment};
//!
//! let mut request = Request::new("GET", "http://localhost/old/path");
//! let mut env = Environment::new();
//! env.insert("request", &mut request);
//!
//! let script = br#"
//!     if $(request.url.path) match_regex ^/old/ {
//!         request.url.path replace_regex ^/old/ /new/
//!         request.header.x-rewritten = "true"
//!     }
//! "#;
//! parse(&mut env, script).unwrap();
//! drop(env);
//!
//! assert_eq!(request.url.unwrap().path, "/new/path");
//! assert_eq!(request.header["x-rewritten"], vec!["true".to_string()]);
//! ```
//!
//! Statements are `if`/`elseif`/`else` chains guarding `{ }` blocks,
//! `var name value`, `log word`, and assignments (`path = value`,
//! `path unset`, `path replace_regex pattern replacement`). Words may
//! reference values with `$(root.segment...)`. Comments are `//`, `#` and
//! `/* */`.

pub mod access;
pub mod comments;
pub mod env;
pub mod error;
pub mod http;
pub mod interpreter;
pub mod lexer;
pub mod sink;
pub mod substitute;
pub mod validator;
pub mod value;

pub use env::Environment;
pub use error::{AccessError, ErrorKind, RuleError};
pub use interpreter::{parse, Config, Interpreter};
pub use sink::{LogSink, NoopSink, TracingSink};
pub use value::{Access, FromScript, Indexed, Keyed, Optional, Record, Slot, Value};

#[cfg(test)]
mod tests;
