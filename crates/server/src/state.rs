use std::path::Path;

use fileforge_core::{Config, ConversionService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: ConversionService,
}

impl AppState {
    pub fn new(config: Config, service: ConversionService) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &ConversionService {
        &self.service
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        self.service.output_dir()
    }
}
