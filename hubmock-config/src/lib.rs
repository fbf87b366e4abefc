// Configuration for the hubmock backend
//
// Settings come from the process environment, optionally seeded from a
// `.env` file, and are validated once at startup.

pub mod env;
pub mod error;
pub mod settings;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use settings::{LogFormat, Settings};
pub use validation::{ConfigValidator, Validate};
