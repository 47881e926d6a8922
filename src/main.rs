use clap::Parser;
use course_clean::config::cli::Command;
use course_clean::utils::{logger, validation::Validate};
use course_clean::{
    CleanError, CliConfig, CourseShape, DepartmentShape, EtlEngine, LocalStorage,
    NormalizePipeline, RunReport, TomlConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI config: {:?}", cli);

    match run(&cli).await {
        Ok(report) => {
            println!("✅ {} unique records written", report.unique_records);
            println!("📁 Output saved to: {}", report.output_path.display());
        }
        Err(e) => {
            tracing::error!(
                "❌ Normalization failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: &CliConfig) -> Result<RunReport, CleanError> {
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            TomlConfig::from_file(path)?
        }
        None => TomlConfig::default(),
    };
    file_config.validate()?;

    let monitor_enabled = cli.monitor || file_config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match &cli.command {
        Command::Courses(args) => {
            let job = args.resolve(&file_config)?;
            job.validate()?;

            let storage = LocalStorage::new(job.output_dir.clone());
            let pipeline = NormalizePipeline::new(storage, job, CourseShape);
            EtlEngine::new_with_monitoring(pipeline, monitor_enabled)
                .run()
                .await
        }
        Command::Departments { args, name } => {
            let job = args.resolve(&file_config)?;
            job.validate()?;

            let name = name
                .clone()
                .unwrap_or_else(|| file_config.departments_name().to_string());
            let storage = LocalStorage::new(job.output_dir.clone());
            let pipeline = NormalizePipeline::new(storage, job, DepartmentShape::new(name));
            EtlEngine::new_with_monitoring(pipeline, monitor_enabled)
                .run()
                .await
        }
    }
}
