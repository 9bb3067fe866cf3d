pub mod models;
pub mod processor;
pub mod reader;
pub mod report;
pub mod schema;
pub mod services;
pub mod storage;
pub mod writer;

use common::Result;
use common::config::Settings;
use report::RunReport;
use services::PipelineService;
use storage::StorageManager;

/// Runs the song-play pipeline once against the configured locations.
pub async fn run_pipeline(settings: &Settings) -> Result<RunReport> {
    PipelineService::new(settings)?.run().await
}

/// Same as [`run_pipeline`], reusing the object stores held by `storage`.
pub async fn run_pipeline_with(storage: StorageManager, settings: &Settings) -> Result<RunReport> {
    PipelineService::with_storage(storage, settings)?.run().await
}
