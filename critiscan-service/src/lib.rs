//! HTTP intake service: report photographs and manual entries in, ICU interpretation out.

pub mod config;
pub mod flow;
pub mod models;
pub mod recognition;
pub mod service;
pub mod tasks;
pub mod workflow;

pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use service::{AppState, build_router, create_app};
pub use workflow::{build_intake_workflow, create_flow_runner, create_intake_session};
