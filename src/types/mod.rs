//! Type definitions for the fraud check service

pub mod record;
pub mod transaction;
pub mod verdict;

pub use record::LogRecord;
pub use transaction::{Gender, TransactionInput};
pub use verdict::Verdict;
