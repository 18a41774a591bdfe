#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod timing;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use timing::{StageTimer, Timing};

/// Tracing target for the core library.
pub const TRACING_TARGET: &str = "plinth_core";
