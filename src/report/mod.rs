//! Report module - summary tables and JSON export

pub mod evaluation;
pub mod export;
pub mod summary;

pub use evaluation::*;
pub use export::*;
pub use summary::*;
