use crate::core::normalize;
use crate::core::{ConfigProvider, NormalizeResult, Pipeline, Record, RecordShape, Storage};
use crate::utils::error::{CleanError, Result};
use std::path::PathBuf;

/// 讀檔 → 攤平 → 去重 → 排序 → 寫檔，由 `RecordShape` 決定抽取與排序方式
pub struct NormalizePipeline<S: Storage, C: ConfigProvider, R: RecordShape> {
    storage: S,
    config: C,
    shape: R,
}

impl<S: Storage, C: ConfigProvider, R: RecordShape> NormalizePipeline<S, C, R> {
    pub fn new(storage: S, config: C, shape: R) -> Self {
        Self {
            storage,
            config,
            shape,
        }
    }

    pub fn output_file_name(&self) -> Result<String> {
        let stem = self.shape.output_stem(self.config.input_path())?;
        Ok(format!("{}{}.json", stem, self.config.output_suffix()))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: RecordShape> Pipeline for NormalizePipeline<S, C, R> {
    fn label(&self) -> &str {
        self.shape.label()
    }

    async fn extract(&self) -> Result<Vec<Record>> {
        let path = self.config.input_path();
        tracing::debug!("Reading {}", path.display());

        let bytes = self.storage.read_file(path).await?;
        let document: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| CleanError::MalformedInputError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let records = self.shape.extract(path, document)?;
        tracing::debug!(
            "Flattened {} {} from {}",
            records.len(),
            self.shape.label(),
            path.display()
        );
        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<NormalizeResult> {
        let input_count = data.len();
        let unique = normalize::dedup_structural(data);
        tracing::debug!(
            "Deduplicated {} -> {} {}",
            input_count,
            unique.len(),
            self.shape.label()
        );

        let records = normalize::sort_records(unique, &self.shape)?;
        self.shape.log_unique(&records);
        Ok(NormalizeResult {
            records,
            input_count,
        })
    }

    async fn load(&self, result: NormalizeResult) -> Result<PathBuf> {
        let file_name = self.output_file_name()?;
        let data = normalize::to_pretty_json(&result.records, self.config.indent())?;

        tracing::debug!("Writing {} bytes to {}", data.len(), file_name);
        self.storage.write_file(&file_name, &data).await
    }
}
