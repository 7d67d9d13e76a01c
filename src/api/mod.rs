//! バックエンドAPI
//!
//! 各エンドポイントを `Backend` トレイトのメソッドとして抽象化する。
//! 実装は HTTP 版（`HttpBackend`）。テストでは差し替え可能。

mod http;
mod wire;

pub use http::HttpBackend;

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use brainmax_common::{Record, UploadedFile};
use std::collections::BTreeMap;
use std::path::Path;

/// モデルID → 生成テキスト
pub type GeneratedResults = BTreeMap<String, String>;

/// アップロードするファイル
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub uploader: String,
}

impl FileUpload {
    pub fn from_path(path: &Path, uploader: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(ClientError::Validation(format!(
                "ファイルが見つかりません: {}",
                path.display()
            )));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let bytes = std::fs::read(path)?;

        Ok(Self {
            file_name,
            mime,
            bytes,
            uploader: uploader.to_string(),
        })
    }
}

/// ログイン応答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReply {
    pub token: String,
    pub full_name: String,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// アップロード済みファイル一覧
    async fn list_files(&self, uploader: Option<&str>) -> Result<Vec<UploadedFile>>;

    /// ファイルをアップロードし、サーバーのメッセージを返す
    async fn upload_file(&self, upload: FileUpload) -> Result<String>;

    /// OCRスキャンし、抽出テキストを返す
    async fn scan_document(&self, file_id: i64) -> Result<String>;

    async fn save_scanned_text(&self, file_id: i64, text: &str) -> Result<()>;

    /// AI生成
    async fn generate_analysis(&self, prompt: &str, model_ids: &[String]) -> Result<GeneratedResults>;

    async fn save_analysis_result(&self, file_id: i64, text: &str) -> Result<()>;

    /// 質問/回答レコード検索（空クエリは全件）
    async fn search_records(&self, query: Option<&str>, username: Option<&str>) -> Result<Vec<Record>>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply>;

    /// チャットの質問と回答をレコードとして保存
    async fn save_generated_copy(&self, full_name: &str, question: &str, answer: &str) -> Result<()>;
}
