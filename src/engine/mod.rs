//! Bidding and evaluation engines
//!
//! `BidAdmission` owns the submission path; `Evaluation` owns winner
//! selection and the exactly-once award.

pub mod admission;
pub mod evaluation;

pub use admission::BidAdmission;
pub use evaluation::Evaluation;
