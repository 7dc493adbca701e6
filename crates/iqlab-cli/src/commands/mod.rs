//! Command implementations, one per binary.

pub mod iqgen;
pub mod run;
pub mod survey;
