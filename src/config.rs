use crate::error::{ClientError, Result};
use brainmax_common::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://brainmaxs.zeabur.app";
/// base_url を上書きする環境変数（`--base-url` と同じ）
pub const BASE_URL_ENV: &str = "BRAINMAX_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// アップロード時の uploader 値
    pub uploader: String,
    pub page_size: usize,
    /// チャットの既定モデルID
    pub chat_model: String,
    /// 文書解析の既定モデルID
    pub document_models: Vec<String>,
    /// 管理者とみなすユーザー名
    pub admin_marker: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            uploader: "root".into(),
            page_size: DEFAULT_PAGE_SIZE,
            chat_model: "1".into(),
            document_models: vec!["6".into()],
            admin_marker: "root".into(),
            timeout_seconds: 120,  // OCR・AI生成は時間がかかる
        }
    }
}

impl Config {
    /// 既定パスから読み込み
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("brainmax"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// 末尾スラッシュを除いたベースURL
    pub fn endpoint_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!("URLが不正です: {}", url)));
        }
        self.base_url = url;
        Ok(())
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(ClientError::Config("ページサイズは1以上にしてください".into()));
        }
        self.page_size = size;
        Ok(())
    }
}
