pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::{portal::PortalClient, storage::LocalStorage};
pub use crate::app::pipelines::{courses::CourseShape, departments::DepartmentShape};
pub use crate::config::{toml_config::TomlConfig, JobConfig};
pub use crate::core::{
    etl::{EtlEngine, RunReport},
    pipeline::NormalizePipeline,
};
pub use crate::utils::error::{CleanError, Result};
