//! HTTP boundary types.
//!
//! Only the envelope-to-HTTP mapping lives in the library; route wiring is
//! deployment concern and intentionally absent.

pub mod error;

pub use error::{ApiResult, ErrorBody};
