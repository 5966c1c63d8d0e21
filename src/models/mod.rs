//! Model downloading and caching via hf-hub.

use crate::config::ModelConfig;
use crate::error::{ClarityError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;

/// Downloads model files from HuggingFace Hub into a local cache.
pub struct ModelManager {
    cache_dir: PathBuf,
}

impl ModelManager {
    /// Create a new model manager rooted at `config.cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.cache_dir)?;
        info!("model cache directory: {}", config.cache_dir.display());

        Ok(Self {
            cache_dir: config.cache_dir.clone(),
        })
    }

    /// Download a model file with a visible progress bar.
    ///
    /// Cached files are returned immediately without a bar.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails.
    pub fn download_with_progress(&self, repo_id: &str, filename: &str) -> Result<PathBuf> {
        if let Some(path) = self.cached_path(repo_id, filename) {
            println!("  {repo_id}/{filename}  [cached]");
            return Ok(path);
        }

        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .build()
            .map_err(|e| ClarityError::Model(format!("failed to create HF API: {e}")))?;

        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "  {msg} [{bar:30}] {bytes}/{total_bytes} {bytes_per_sec} ETA {eta}",
        ) {
            pb.set_style(style);
        }
        pb.set_message(format!("{repo_id}/{filename}"));

        let repo = api.model(repo_id.to_owned());
        repo.download_with_progress(filename, pb).map_err(|e| {
            ClarityError::Model(format!("failed to download {filename} from {repo_id}: {e}"))
        })
    }

    /// Path of `filename` in the local cache, if it has been downloaded.
    pub fn cached_path(&self, repo_id: &str, filename: &str) -> Option<PathBuf> {
        hf_hub::Cache::new(self.cache_dir.clone())
            .model(repo_id.to_owned())
            .get(filename)
    }

    /// Get the cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
