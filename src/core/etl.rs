use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;

/// 一次執行的結果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub input_records: usize,
    pub unique_records: usize,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let label = self.pipeline.label().to_string();
        tracing::info!("🚀 Starting {} normalization", label);

        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} {}", raw_data.len(), label);
        self.monitor.log_stats("Extract");

        let result = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "🔧 Removed {} duplicate {}",
            result.duplicates_removed(),
            label
        );
        self.monitor.log_stats("Transform");

        let input_records = result.input_count;
        let unique_records = result.unique_count();
        tracing::info!("Number of unique {}: {}", label, unique_records);

        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {}", output_path.display());
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunReport {
            output_path,
            input_records,
            unique_records,
        })
    }
}
