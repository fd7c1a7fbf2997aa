use crate::error::{DetectError, Result};
use safety_detect_common::DEFAULT_LOW_CONFIDENCE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// エンドポイントを上書きする環境変数
pub const ENDPOINT_ENV: &str = "SAFETY_DETECT_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/detect";

/// Undo可能時間の上限（秒）
pub const MAX_UNDO_WINDOW_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub undo_window_secs: u64,
    pub low_confidence_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_seconds: 60,
            undo_window_secs: 5,
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DetectError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("safety-detect").join("config.json"))
    }

    /// 実際に使うエンドポイント（CLI引数 > 環境変数 > 設定ファイル）
    pub fn resolve_endpoint(&self, cli_override: Option<&str>) -> String {
        if let Some(endpoint) = cli_override {
            return endpoint.to_string();
        }

        // 環境変数を優先
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                return endpoint;
            }
        }

        self.endpoint.clone()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(DetectError::Config(format!(
                "エンドポイントはhttp(s)のURLで指定してください: {}",
                self.endpoint
            )));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(DetectError::Config(format!(
                "低信頼度の閾値は0.0〜1.0で指定してください: {}",
                self.low_confidence_threshold
            )));
        }
        if self.undo_window_secs > MAX_UNDO_WINDOW_SECS {
            return Err(DetectError::Config(format!(
                "Undo可能時間は{}秒以下にしてください: {}",
                MAX_UNDO_WINDOW_SECS, self.undo_window_secs
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(DetectError::Config("タイムアウトは1秒以上にしてください".into()));
        }
        Ok(())
    }
}
