//! ワイヤ形式（バックエンドのJSON）

use crate::error::{ClientError, Result};
use brainmax_common::{Record, UploadedFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 全エンドポイント共通の `{success, message?, ...}`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    /// `success: false` をアプリケーションエラーに変換
    pub fn into_payload(self, fallback: &str) -> Result<T> {
        if self.success {
            Ok(self.payload)
        } else {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            Err(ClientError::Application(message))
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ack {}

#[derive(Debug, Deserialize)]
pub(crate) struct FileList {
    #[serde(default)]
    pub data: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordList {
    #[serde(default)]
    pub data: Vec<Record>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScanPayload {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeneratePayload {
    #[serde(default)]
    pub generated_results: BTreeMap<String, serde_json::Value>,
}

impl GeneratePayload {
    /// 文字列以外の値は文字列化、null は除外
    pub fn into_texts(self) -> BTreeMap<String, String> {
        self.generated_results
            .into_iter()
            .filter_map(|(model, value)| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(text) => Some((model, text)),
                other => Some((model, other.to_string())),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SaveScannedTextRequest<'a> {
    pub file_id: i64,
    pub scanned_text: &'a str,
}

#[derive(Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub models: &'a [String],
}

#[derive(Serialize)]
pub(crate) struct SaveAiResultRequest<'a> {
    pub file_id: i64,
    pub ai_generated_text: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SaveGeneratedCopyRequest<'a> {
    pub full_name: &'a str,
    pub question: &'a str,
    pub answer: &'a str,
}
