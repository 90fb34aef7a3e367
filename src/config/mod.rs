//! Configuration for the development host server.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DevServerConfig (validated, immutable)
//!     → ProxyRuleConfig::build → one ProxyMiddleware per rule
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Library users can skip this module and call `make_proxy` directly

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, LoadError};
pub use schema::{DevServerConfig, ListenerConfig, ObservabilityConfig, ProxyRuleConfig};
pub use validation::{validate_config, ValidationError};
