//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SentinelConfig (validated, immutable)
//!     → handed to Sentinel::new, which hands each section to its component
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → Sentinel::reload swaps rule tables atomically
//!     → recorded windows and incidents survive the swap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AntiRaidConfig, AuditConfig, FieldKind, FieldRule, GateConfig, IncidentConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, RateLimitRule, SentinelConfig, ValidationConfig,
    SECS_PER_DAY,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::{changed_sections, ConfigWatcher};
