use crate::config::toml_config::TomlConfig;
use crate::config::JobConfig;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "course-clean")]
#[command(about = "Deduplicate and sort scraped course data", version)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file supplying defaults for anything not given on the command line
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Flatten term records, drop duplicate courses, sort by code, name and termInd
    Courses(CleanArgs),

    /// Collect unique department names from sections[*].deptName
    Departments {
        #[command(flatten)]
        args: CleanArgs,

        /// Output file stem (default: depts)
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CleanArgs {
    /// Input JSON document
    pub input: Option<PathBuf>,

    /// Directory for the cleaned file (default: ../courses)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Appended to the output file stem (default: _clean)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Spaces per indentation level (default: 4)
    #[arg(long)]
    pub indent: Option<usize>,
}

impl CleanArgs {
    /// 命令列參數優先，其次是 TOML，最後是預設值
    pub fn resolve(&self, file: &TomlConfig) -> Result<JobConfig> {
        let mut job = file.job_config(self.input.clone())?;

        if let Some(dir) = &self.output_dir {
            job.output_dir = dir.clone();
        }
        if let Some(suffix) = &self.suffix {
            job.output_suffix = suffix.clone();
        }
        if let Some(indent) = self.indent {
            job.indent = indent;
        }

        Ok(job)
    }
}
