// piisift-context/src/lib.rs
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod context;
pub mod scoring;

pub use context::{ContextBuildError, ContextScanner};
pub use scoring::{boost_score, ContextBoost};

