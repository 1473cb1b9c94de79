//! Input validation subsystem.
//!
//! # Data Flow
//! ```text
//! Free text:
//!     → validator.rs (length → code → markup → links → scam)
//!     → sanitize.rs (strip, collapse, trim, escape)
//!
//! Calculator expression:
//!     → math.rs (tokenizer with a closed identifier set)
//!     → patterns.rs (code patterns)
//! ```
//!
//! Every check is pure. A rejection carries a user-facing reason and is an
//! ordinary value, not a fault.

pub mod math;
pub mod patterns;
pub mod rejection;
pub mod sanitize;
pub mod validator;

pub use math::{tokenize, MathError, MathToken};
pub use rejection::{Rejection, RejectionKind};
pub use sanitize::{excerpt, sanitize, truncate};
pub use validator::{InputValidator, ValidateOptions};
