use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = ["png", "bmp", "jpg", "jpeg", "gif"];
pub const DEFAULT_LABELS: [&str; 4] = ["Bulbasaur", "Squirtle", "Charmander", "Pikachu"];
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 224;

/// Process-wide settings, built once at startup and never mutated.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```json
/// { "bind_addr": "0.0.0.0:8080", "model_path": "model/pokemon.json" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Transient storage for uploads, one file per accepted image.
    pub upload_dir: PathBuf,
    /// Serialized `Network` used as the classifier.
    pub model_path: PathBuf,
    /// Lowercase, without the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Index-aligned with the classifier's output vector.
    pub labels: Vec<String>,
    pub thumbnail_size: u32,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "127.0.0.1:7878".into(),
            upload_dir: PathBuf::from("temporary"),
            model_path: PathBuf::from("model/classifier.json"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Reads an optional JSON file, applies `FERRITE_VISION_*` environment
    /// overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .map_err(|e| AppError::Config(format!("{}: {}", p.display(), e)))?;
                serde_json::from_str(&raw)
                    .map_err(|e| AppError::Config(format!("{}: {}", p.display(), e)))?
            }
            None => AppConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("FERRITE_VISION_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(dir) = lookup("FERRITE_VISION_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("FERRITE_VISION_MODEL") {
            self.model_path = PathBuf::from(model);
        }
    }

    /// Lowercases extensions and strips any leading dot.
    fn normalize(&mut self) {
        for ext in &mut self.allowed_extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(AppError::Config("label set must not be empty".into()));
        }
        if self.allowed_extensions.iter().all(|e| e.is_empty()) {
            return Err(AppError::Config("allowed_extensions must not be empty".into()));
        }
        if self.thumbnail_size == 0 {
            return Err(AppError::Config("thumbnail_size must be positive".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(AppError::Config("max_upload_bytes must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "thumbnail_size": 128, "allowed_extensions": [".PNG"] }"#).unwrap();

        let mut config: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        config.normalize();
        assert_eq!(config.thumbnail_size, 128);
        assert_eq!(config.allowed_extensions, vec!["png".to_string()]);
        assert_eq!(config.labels.len(), 4);
        assert_eq!(config.upload_dir, PathBuf::from("temporary"));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "FERRITE_VISION_ADDR" => Some("0.0.0.0:9000".into()),
            "FERRITE_VISION_MODEL" => Some("/srv/model.json".into()),
            _ => None,
        });
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.upload_dir, PathBuf::from("temporary"));
    }

    #[test]
    fn rejects_empty_labels() {
        let config = AppConfig { labels: vec![], ..AppConfig::default() };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(Some(path.as_path())), Err(AppError::Config(_))));
    }
}
