pub mod distribution;
pub mod random;
pub mod simulation;
