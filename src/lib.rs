//! churnprep: churn-model preparation library
//!
//! Splits a customer table into training and testing partitions, learns
//! feature transformations from the training partition only, replays them on
//! any dataset to produce a numeric matrix, and scores classifier output.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
