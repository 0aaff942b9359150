//! Baseline policies that do not learn

pub mod random;

pub use random::RandomPolicy;
