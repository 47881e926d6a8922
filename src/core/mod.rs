pub mod etl;
pub mod normalize;
pub mod pipeline;

pub use crate::domain::model::{NormalizeResult, Record};
pub use crate::domain::ports::{ConfigProvider, CourseSource, Pipeline, RecordShape, Storage};
pub use crate::utils::error::Result;
