#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod client;
pub mod provider;

mod error;
mod gateway;
mod registry;
mod structured;
mod usage;

pub use error::{LlmError, LlmResult};
pub use gateway::GatewayConfig;
pub use registry::{ModelRef, ProviderRegistry};
pub use structured::parse_structured;
pub use usage::UsageStats;

/// Tracing target for the model layer.
pub const TRACING_TARGET: &str = "plinth_inference";
