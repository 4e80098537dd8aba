//! Quote provider contracts

pub mod traits;

pub use traits::{QuoteContext, QuoteProvider, QuoteSimulator};
