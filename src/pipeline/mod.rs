//! Pipeline module - splitting, feature preparation and evaluation

pub mod correlation;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod matrix;
pub mod metrics;
pub mod recipe;
pub mod split;
pub mod steps;

pub use correlation::*;
pub use dataset::*;
pub use error::*;
pub use loader::*;
pub use matrix::*;
pub use metrics::*;
pub use recipe::*;
pub use split::*;
pub use steps::*;
