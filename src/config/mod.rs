//! Server settings: schema, dynamic key access, and YAML persistence.
//!
//! - Schema definitions and key access in [`schema`]
//! - File loading and saving in [`loader`]
//!
//! # Example
//!
//! ```
//! use cellhost::config::Settings;
//!
//! let mut settings = Settings::default();
//! settings.set("server_frequency", serde_json::json!(40)).unwrap();
//! assert_eq!(settings.server_frequency, 40);
//! assert!(settings.get("no_such_key").is_none());
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_settings, parse_settings, save_settings};
pub use schema::Settings;
