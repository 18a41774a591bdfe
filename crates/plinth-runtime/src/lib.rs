#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod ingest;
pub mod retrieve;

mod error;

pub use error::{RuntimeError, RuntimeResult};

/// Tracing target for the runtime pipelines.
pub const TRACING_TARGET: &str = "plinth_runtime";
