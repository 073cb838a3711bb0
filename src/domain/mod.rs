//! Domain entities and DTOs for tenders and bids.

pub mod bids;
pub mod tenders;

pub use bids::*;
pub use tenders::*;
