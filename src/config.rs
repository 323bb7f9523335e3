//! Configuration locale du client.
//!
//! Fichier global : `~/.garde/config.toml`. Les options de ligne de commande
//! (ou `GARDE_BASE_URL` / `GARDE_TOKEN`) priment sur le fichier.

use crate::calendar::ViewMode;
use crate::model::RoleFilter;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3006/";

/// Répertoire d'état du client : `~/.garde/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".garde"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Cache hors ligne par défaut : `~/.garde/snapshot.json`.
pub fn default_snapshot_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("snapshot.json"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid base url {url}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Racine de l'API REST.
    pub base_url: String,
    /// Jeton bearer ; jamais journalisé.
    pub token: Option<String>,
    pub default_view: ViewMode,
    pub default_role: RoleFilter,
    /// Emplacement du cache hors ligne.
    pub snapshot: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            default_view: ViewMode::Week,
            default_role: RoleFilter::All,
            snapshot: None,
        }
    }
}

impl ClientConfig {
    /// Charge `~/.garde/config.toml`, ou les valeurs par défaut si le fichier
    /// est absent ou illisible.
    pub fn load() -> Self {
        default_config_path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Écrit le fichier (crée les répertoires parents).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Applique les surcharges de la ligne de commande.
    pub fn merge(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot.clone().or_else(default_snapshot_path)
    }

    pub fn session(&self) -> Result<Session, ConfigError> {
        Session::new(&self.base_url, self.token.clone()).map_err(|source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }
}
