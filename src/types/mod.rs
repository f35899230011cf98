//! Type definitions for the risk decision engine

pub mod audit;
pub mod prediction;
pub mod rule;
pub mod transaction;
