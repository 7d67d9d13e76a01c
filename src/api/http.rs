//! HTTP版バックエンド（reqwest）

use super::wire::{
    Ack, Envelope, FileList, GeneratePayload, GenerateRequest, LoginPayload, LoginRequest,
    RecordList, SaveAiResultRequest, SaveGeneratedCopyRequest, SaveScannedTextRequest,
    ScanPayload,
};
use super::{Backend, FileUpload, GeneratedResults, LoginReply};
use crate::config::Config;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use brainmax_common::{Record, UploadedFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("HTTPクライアント作成エラー: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint_base(), Duration::from_secs(config.timeout_seconds))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// リクエストを送り、共通エンベロープとして読む
    ///
    /// エラーステータスでもJSON本文があればそちらのメッセージを優先する。
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%status, bytes = bytes.len(), "response received");

        match serde_json::from_slice::<Envelope<T>>(&bytes) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                Err(ClientError::Network(format!("HTTP {}", status)))
            }
            Err(e) => Err(ClientError::Network(format!("レスポンスの解析に失敗: {}", e))),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_files(&self, uploader: Option<&str>) -> Result<Vec<UploadedFile>> {
        let mut request = self.client.get(self.url("list_uploaded_files"));
        if let Some(uploader) = uploader {
            request = request.query(&[("uploader", uploader)]);
        }
        debug!(?uploader, "GET list_uploaded_files");
        let envelope: Envelope<FileList> = self.send(request).await?;
        Ok(envelope.into_payload("ファイル一覧を取得できません")?.data)
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<String> {
        debug!(file = %upload.file_name, size = upload.bytes.len(), "POST upload_file");
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime)?;
        let form = Form::new()
            .part("file", part)
            .text("uploader", upload.uploader);

        let request = self.client.post(self.url("upload_file")).multipart(form);
        let envelope: Envelope<Ack> = self.send(request).await?;
        let message = envelope.message().to_string();
        envelope.into_payload("アップロードに失敗しました")?;
        Ok(message)
    }

    async fn scan_document(&self, file_id: i64) -> Result<String> {
        debug!(file_id, "GET scan_pdf_ocr");
        let request = self.client.get(self.url(&format!("scan_pdf_ocr/{}", file_id)));
        let envelope: Envelope<ScanPayload> = self.send(request).await?;
        Ok(envelope
            .into_payload("スキャンに失敗しました")?
            .content
            .unwrap_or_default())
    }

    async fn save_scanned_text(&self, file_id: i64, text: &str) -> Result<()> {
        debug!(file_id, chars = text.chars().count(), "POST save_scanned_text");
        let request = self
            .client
            .post(self.url("save_scanned_text"))
            .json(&SaveScannedTextRequest { file_id, scanned_text: text });
        let envelope: Envelope<Ack> = self.send(request).await?;
        envelope.into_payload("テキストを保存できません")?;
        Ok(())
    }

    async fn generate_analysis(&self, prompt: &str, model_ids: &[String]) -> Result<GeneratedResults> {
        debug!(?model_ids, chars = prompt.chars().count(), "POST generate_copy");
        let request = self
            .client
            .post(self.url("generate_copy"))
            .json(&GenerateRequest { prompt, models: model_ids });
        let envelope: Envelope<GeneratePayload> = self.send(request).await?;
        Ok(envelope.into_payload("AI生成に失敗しました")?.into_texts())
    }

    async fn save_analysis_result(&self, file_id: i64, text: &str) -> Result<()> {
        debug!(file_id, "POST save_ai_result");
        let request = self
            .client
            .post(self.url("save_ai_result"))
            .json(&SaveAiResultRequest { file_id, ai_generated_text: text });
        let envelope: Envelope<Ack> = self.send(request).await?;
        envelope.into_payload("解析結果を保存できません")?;
        Ok(())
    }

    async fn search_records(&self, query: Option<&str>, username: Option<&str>) -> Result<Vec<Record>> {
        let mut params = vec![("search", query.unwrap_or_default())];
        if let Some(username) = username {
            params.push(("username", username));
        }
        debug!(?query, ?username, "GET get_test_results");
        let request = self.client.get(self.url("get_test_results")).query(&params);
        let envelope: Envelope<RecordList> = self.send(request).await?;
        Ok(envelope.into_payload("データを取得できません")?.data)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply> {
        debug!(username, "POST login");
        let request = self
            .client
            .post(self.url("login"))
            .json(&LoginRequest { username, password });
        let envelope: Envelope<LoginPayload> = self.send(request).await?;
        let payload = envelope.into_payload("ログインに失敗しました")?;

        let token = payload
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Application("トークンが返されませんでした".into()))?;

        Ok(LoginReply {
            token,
            full_name: payload.full_name.unwrap_or_default(),
        })
    }

    async fn save_generated_copy(&self, full_name: &str, question: &str, answer: &str) -> Result<()> {
        debug!(full_name, "POST save_generated_copy");
        let request = self
            .client
            .post(self.url("save_generated_copy"))
            .json(&SaveGeneratedCopyRequest { full_name, question, answer });
        let envelope: Envelope<Ack> = self.send(request).await?;
        envelope.into_payload("保存に失敗しました")?;
        Ok(())
    }
}
