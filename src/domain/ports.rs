use crate::domain::model::{CourseQuery, NormalizeResult, Record};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Writes `name` under the storage root; either the whole file lands or nothing does.
    fn write_file(
        &self,
        name: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &Path;
    fn output_dir(&self) -> &Path;
    fn output_suffix(&self) -> &str;
    fn indent(&self) -> usize;
}

/// 抽取函式與排序鍵，決定一種輸入要如何被攤平、去重與排序
pub trait RecordShape: Send + Sync {
    /// Plural noun used in logs ("courses", "departments").
    fn label(&self) -> &'static str;

    /// Flattens the parsed document into the records to deduplicate.
    fn extract(&self, source: &Path, document: Value) -> Result<Vec<Record>>;

    /// Sort key fields in priority order. `None` marks a missing field.
    fn sort_key<'a>(&self, record: &'a Record) -> Vec<(&'static str, Option<&'a Value>)>;

    /// Output file stem, before the configured suffix.
    fn output_stem(&self, input: &Path) -> Result<String>;

    /// Called with the sorted unique records before they are written.
    fn log_unique(&self, _records: &[Record]) {}
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn label(&self) -> &str;
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<NormalizeResult>;
    async fn load(&self, result: NormalizeResult) -> Result<PathBuf>;
}

/// 課程資料來源（入口網站或任何能回傳同格式 JSON 的來源）
#[async_trait]
pub trait CourseSource: Send + Sync {
    async fn fetch(&self, query: &CourseQuery) -> Result<Vec<u8>>;
}
