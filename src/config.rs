//! Необязательная TOML-конфигурация, поверх которой применяются флаги CLI.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::DEFAULT_DATA_CSV;
use crate::error::{DashboardError, Result};

pub const DEFAULT_CONFIG: &str = "config/dashboard.toml";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data: Option<PathBuf>,
    bind: Option<String>,
    minify_html: Option<bool>,
}

/// Значения из командной строки; `None` оставляет значение из файла или по умолчанию.
#[derive(Debug, Default)]
pub struct Overrides {
    pub data: Option<PathBuf>,
    pub bind: Option<String>,
    pub minify_html: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub data: PathBuf,
    /// Разбирается в [`DashboardConfig::bind_addr`] только при запуске сервера.
    pub bind: String,
    pub minify_html: bool,
}

impl DashboardConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|err| {
            DashboardError::Config(format!("Invalid bind address {}: {err}", self.bind))
        })
    }
}

/// Читает `path` (нет файла по умолчанию — встроенные значения) и применяет `overrides`.
pub fn load_config(path: &Path, overrides: Overrides) -> Result<DashboardConfig> {
    let file = if path.exists() {
        let raw = fs::read_to_string(path).map_err(|err| {
            DashboardError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        toml::from_str::<ConfigFile>(&raw).map_err(|err| {
            DashboardError::Config(format!("Failed to parse {}: {err}", path.display()))
        })?
    } else if path == Path::new(DEFAULT_CONFIG) {
        tracing::info!(
            "Config {} not found, using built-in defaults",
            path.display()
        );
        ConfigFile::default()
    } else {
        return Err(DashboardError::Config(format!(
            "Config {} does not exist",
            path.display()
        )));
    };

    Ok(DashboardConfig {
        data: overrides
            .data
            .or(file.data)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_CSV)),
        bind: overrides
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        minify_html: overrides.minify_html.or(file.minify_html).unwrap_or(true),
    })
}
