//! Command handlers.

pub mod replay;
pub mod run;
