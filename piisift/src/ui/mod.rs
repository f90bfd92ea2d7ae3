// piisift/src/ui/mod.rs
//! Terminal presentation helpers: colored status lines and tables.

pub mod output;
pub mod tables;
