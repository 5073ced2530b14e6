//! Application state.

use std::sync::Arc;

use sightline_media::{ScanConfig, Scanner, VideoOpener};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::store::Registry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub registry: Arc<Registry>,
    pub scanner: Arc<Scanner>,
    pub opener: Arc<dyn VideoOpener>,
}

impl AppState {
    /// Create state around a ready scanner and video opener.
    ///
    /// Creates the upload and photo directories when missing.
    pub fn new(
        config: ApiConfig,
        scanner: Scanner,
        opener: Arc<dyn VideoOpener>,
    ) -> ApiResult<Self> {
        std::fs::create_dir_all(&config.upload_dir)?;
        std::fs::create_dir_all(&config.photos_dir)?;

        Ok(Self {
            config,
            registry: Arc::new(Registry::new()),
            scanner: Arc::new(scanner),
            opener,
        })
    }

    /// Load the face models and OpenCV video backend from the environment.
    #[cfg(feature = "opencv")]
    pub fn from_env(config: ApiConfig) -> ApiResult<Self> {
        use sightline_media::{Annotator, ModelCapabilities, ModelPaths, OpenCvVideoOpener};

        let paths = ModelPaths::from_env();
        let capabilities = Arc::new(ModelCapabilities::load(&paths)?);
        let scanner = Scanner::new(capabilities, ScanConfig::from_env())
            .with_annotator(Annotator::load(paths.font.as_deref()));

        Self::new(config, scanner, Arc::new(OpenCvVideoOpener))
    }

    /// Scan settings in effect for searches.
    pub fn scan_config(&self) -> &ScanConfig {
        self.scanner.config()
    }
}
