//! Read-only SQL sandbox over CSV data files

pub mod executor;
pub mod validate;

pub use executor::{QueryOutput, SqlSandbox, TableBinding, NO_RESULTS_MESSAGE};
pub use validate::{enforce_limit, normalize, validate, FORBIDDEN_KEYWORDS};
