mod models;
mod symbol;
mod timestamp;

pub use models::{Fundamentals, SymbolListing};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
