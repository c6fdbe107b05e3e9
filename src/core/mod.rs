//! Parsing and job bookkeeping, independent of process control.

pub mod job;
pub mod parser;
