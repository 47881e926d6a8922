use chrono::Local;
use clap::Parser;
use course_clean::core::{CourseSource, Storage};
use course_clean::utils::{logger, validation::Validate};
use course_clean::{
    CleanError, CourseShape, EtlEngine, JobConfig, LocalStorage, NormalizePipeline, PortalClient,
    TomlConfig,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portal_fetch")]
#[command(about = "Fetch course-search results from the scheduling portal")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "portal.toml")]
    config: PathBuf,

    /// Run the course normalizer on the fetched file
    #[arg(long)]
    clean: bool,

    /// Show the query that would be sent without contacting the portal
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    if let Err(e) = run(&args).await {
        tracing::error!(
            "❌ Portal fetch failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(args: &Args) -> Result<(), CleanError> {
    tracing::info!("📁 Loading configuration from: {}", args.config.display());
    let config = TomlConfig::from_file(&args.config)?;
    config.validate()?;

    let portal = config.portal()?.clone();
    let query = config.query.clone().unwrap_or_default();

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the portal will not be contacted");
        println!("Portal: {}", portal.base_url);
        for (key, value) in query.to_params(0) {
            if !value.is_empty() {
                println!("  {} = {}", key, value);
            }
        }
        return Ok(());
    }

    let client = PortalClient::new(portal)?;
    let payload = client.fetch(&query).await?;

    // 檔名沿用既有資料的格式，例如 UF_Jun-30-2023_2238.json
    let file_name = format!(
        "UF_{}_{}.json",
        Local::now().format("%b-%d-%Y"),
        query.term_label()
    );
    let storage = LocalStorage::new(config.output_dir());
    let raw_path = storage.write_file(&file_name, &payload).await?;
    println!("📁 Raw course data saved to: {}", raw_path.display());

    if args.clean {
        let mut job = JobConfig::new(raw_path, config.output_dir());
        job.output_suffix = config.output_suffix().to_string();
        job.indent = config.indent();
        job.validate()?;

        let pipeline = NormalizePipeline::new(storage, job, CourseShape);
        let report = EtlEngine::new_with_monitoring(pipeline, config.monitoring_enabled())
            .run()
            .await?;
        println!("✅ {} unique courses written", report.unique_records);
        println!("📁 Output saved to: {}", report.output_path.display());
    }

    Ok(())
}
