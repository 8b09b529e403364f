//! Subcommand implementations.

pub mod bootstrap;
pub mod calc;
pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod facts;

use std::path::PathBuf;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Config file override
    pub config: Option<PathBuf>,
    /// Knowledge file override
    pub knowledge: Option<PathBuf>,
    /// Skip the language model entirely
    pub offline: bool,
}

impl GlobalOpts {
    /// The config file these options point at.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(parley_config::AppConfig::config_path)
    }
}
