use std::path::Path;

use anyhow::{Context, Result};

use lexis_lib::{Config, VocabularyService};

/// Shared application state for CLI commands
pub struct App {
    pub service: VocabularyService,
    pub user_id: i64,
}

impl App {
    /// Load config (explicit path or default location) and open the service
    pub fn new(config_path: Option<&Path>, user_id: i64) -> Result<Self> {
        let config = Config::load(config_path).context("Failed to load config")?;
        let service = VocabularyService::from_config(&config)
            .context("Failed to open vocabulary service")?;

        Ok(Self { service, user_id })
    }
}
