pub mod capture;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod recognition;
pub mod store;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::debug;

use cli::Cli;
use config::ConfigStore;
use db::Database;
use store::CollectionStore;

pub const APP_DIR_NAME: &str = "card-scanner";
pub const DB_FILE_NAME: &str = "card-scanner.sqlite3";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Everything a command needs: the collection, its database and the configuration.
pub struct AppState {
    pub db: Database,
    pub store: CollectionStore,
    pub config: ConfigStore,
    pub data_dir: PathBuf,
}

impl AppState {
    pub async fn open(data_dir: &Path, config_path: Option<PathBuf>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join(DB_FILE_NAME))?;
        let store = CollectionStore::load(db.clone()).await;
        let config_path = config_path.unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
        let config = ConfigStore::new(config_path)?;

        Ok(Self {
            db,
            store,
            config,
            data_dir: data_dir.to_path_buf(),
        })
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("no platform data directory; pass --data-dir"))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::logging::init(cli.verbose);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    debug!("Card scanner starting, data in {}", data_dir.display());

    let state = AppState::open(&data_dir, cli.config).await?;
    commands::dispatch(&state, cli.command).await
}
