#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod chat;

mod error;
mod prompt;
mod service;

pub use error::{ServiceError, ServiceResult};
pub use prompt::{RenderError, extract_placeholders, render_template};
pub use service::{PlatformConfig, PlatformService};

/// Tracing target for the service layer.
pub const TRACING_TARGET: &str = "plinth_service";
