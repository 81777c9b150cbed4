pub mod ask;
pub mod classify;
pub mod doctor;
pub mod init;
pub mod serve;

use sheetwise_config::AppConfig;
use std::path::Path;

pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}").into())
}
