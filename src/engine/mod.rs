//! The risk decision engine: rule evaluation, adaptive thresholds, and
//! heuristic scoring. All three are pure functions over their arguments.

pub mod rules;
pub mod scoring;
pub mod threshold;
