//! 文書取込・注釈パイプライン
//!
//! アップロード → OCRスキャン → 手動編集 → 保存してAI解析 の4段階。
//! 状態遷移:
//! - Idle → Uploading → Idle
//! - Idle → Scanning → Idle
//! - Idle → Saving →（保存成功時のみ）Analyzing →（解析成功時のみ）Saving → Idle
//!
//! どの段階の失敗も Idle に戻り `last_error` を記録する。終端のエラー状態はない。
//! スキャン開始時に前回の解析結果を空にする。

use crate::api::{Backend, FileUpload};
use crate::config::Config;
use crate::error::{ClientError, PipelineStep, Result};
use crate::status::OpStatus;
use brainmax_common::{ModelCatalog, ModelSpec, UploadedFile, combine_replies};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 処理段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    Scanning,
    Saving,
    Analyzing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Idle => "待機中",
            Stage::Uploading => "アップロード中...",
            Stage::Scanning => "スキャン中...",
            Stage::Saving => "保存中...",
            Stage::Analyzing => "AI解析中...",
        }
    }
}

/// モデル選択方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSelection {
    #[default]
    Single,
    Multi,
}

/// パイプラインの構成
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub catalog: ModelCatalog,
    pub selection: ModelSelection,
    pub default_models: Vec<String>,
    /// アップロード時の uploader
    pub uploader: String,
    /// 一覧をアップロード者で絞り込む場合
    pub list_uploader: Option<String>,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: ModelCatalog::Document,
            selection: if config.document_models.len() > 1 {
                ModelSelection::Multi
            } else {
                ModelSelection::Single
            },
            default_models: config.document_models.clone(),
            uploader: config.uploader.clone(),
            list_uploader: None,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// パイプラインの状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    pub selected_file_id: Option<i64>,
    pub editable_text: String,
    pub analysis_result: String,
    pub stage: Stage,
    pub last_error: Option<String>,
    /// 直近の操作結果
    pub status: OpStatus,
    /// 画面表示用メッセージ
    pub status_message: String,
}

pub struct Pipeline<B: Backend + ?Sized> {
    backend: Arc<B>,
    options: PipelineOptions,
    models: Vec<&'static ModelSpec>,
    files: Vec<UploadedFile>,
    state: PipelineState,
}

impl<B: Backend + ?Sized> Pipeline<B> {
    pub fn new(backend: Arc<B>, options: PipelineOptions) -> Result<Self> {
        let mut pipeline = Self {
            backend,
            options,
            models: Vec::new(),
            files: Vec::new(),
            state: PipelineState::default(),
        };
        let defaults = pipeline.options.default_models.clone();
        pipeline.set_models(&defaults)?;
        Ok(pipeline)
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn models(&self) -> &[&'static ModelSpec] {
        &self.models
    }

    pub fn selected_file(&self) -> Option<&UploadedFile> {
        let id = self.state.selected_file_id?;
        self.files.iter().find(|f| f.id == id)
    }

    /// 解析に使うモデルを設定
    pub fn set_models(&mut self, keys: &[String]) -> Result<()> {
        let models = self.options.catalog.resolve(keys)?;
        if models.is_empty() {
            return Err(ClientError::Validation("モデルを選択してください".into()));
        }
        if self.options.selection == ModelSelection::Single && models.len() > 1 {
            return Err(ClientError::Validation("モデルは1つだけ選択できます".into()));
        }
        self.models = models;
        Ok(())
    }

    /// 編集中テキストを置き換える
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.editable_text = text.into();
    }

    /// ファイル一覧を再取得
    pub async fn refresh_files(&mut self) -> Result<&[UploadedFile]> {
        match self.backend.list_files(self.options.list_uploader.as_deref()).await {
            Ok(files) => {
                debug!(count = files.len(), "file list refreshed");
                self.files = files;
                Ok(&self.files)
            }
            Err(e) => {
                self.state.last_error = Some(format!("ファイル一覧を取得できません: {}", e));
                Err(e)
            }
        }
    }

    /// ファイルを選択（None で解除）
    ///
    /// 保存済みのOCRテキストとAI解析結果を編集欄に読み込む。
    pub fn select_file(&mut self, file_id: Option<i64>) -> Result<()> {
        let Some(id) = file_id else {
            self.state.selected_file_id = None;
            self.state.editable_text.clear();
            self.state.analysis_result.clear();
            self.state.status_message.clear();
            self.state.last_error = None;
            return Ok(());
        };

        let file = self
            .files
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| ClientError::Validation(format!("ファイルが見つかりません: {}", id)))?;

        self.state.editable_text = file.scanned_text.clone();
        self.state.analysis_result = file.ai_generated_text.clone();
        self.state.selected_file_id = Some(id);
        self.state.status_message.clear();
        self.state.last_error = None;
        Ok(())
    }

    /// パスからアップロード
    pub async fn upload_path(&mut self, path: &Path) -> Result<String> {
        let upload = match FileUpload::from_path(path, &self.options.uploader) {
            Ok(upload) => upload,
            Err(e) => return Err(self.fail(e.at(PipelineStep::Upload))),
        };
        self.upload(upload).await
    }

    /// アップロード（成功時は一覧を再取得）
    pub async fn upload(&mut self, upload: FileUpload) -> Result<String> {
        let file_name = upload.file_name.clone();
        self.enter(Stage::Uploading);

        let message = match self.backend.upload_file(upload).await {
            Ok(message) => message,
            Err(e) => return Err(self.fail(e.at(PipelineStep::Upload))),
        };
        info!(file = %file_name, "uploaded");
        self.finish(format!("アップロードしました: {}", file_name));

        // 一覧の再取得失敗はアップロード自体の失敗にはしない
        match self.backend.list_files(self.options.list_uploader.as_deref()).await {
            Ok(files) => self.files = files,
            Err(e) => {
                warn!(error = %e, "file list refresh after upload failed");
                self.state.status_message.push_str("（ファイル一覧を更新できませんでした）");
            }
        }
        Ok(message)
    }

    /// 選択中ファイルをOCRスキャン
    pub async fn scan(&mut self) -> Result<&str> {
        let file_id = self.require_selection(PipelineStep::Scan)?;
        self.enter(Stage::Scanning);
        // 前回の解析結果は新しいOCRテキストと対応しない
        self.state.analysis_result.clear();

        match self.backend.scan_document(file_id).await {
            Ok(content) => {
                info!(file_id, chars = content.chars().count(), "scanned");
                self.state.editable_text = content;
                self.finish("スキャンしました");
                Ok(&self.state.editable_text)
            }
            Err(e) => Err(self.fail(e.at(PipelineStep::Scan))),
        }
    }

    /// 保存してAI解析
    ///
    /// (a) テキスト保存 → (b) AI解析 → (c) 解析結果保存 を順に実行。
    /// 失敗したステップ以降は実行しない。
    pub async fn save_and_analyze(&mut self) -> Result<String> {
        let file_id = self.require_selection(PipelineStep::SaveText)?;
        if self.state.editable_text.trim().is_empty() {
            let e = ClientError::Validation("テキストを入力してください".into());
            return Err(self.fail(e.at(PipelineStep::SaveText)));
        }
        let text = self.state.editable_text.clone();

        // (a)
        self.enter(Stage::Saving);
        self.state.analysis_result.clear();
        if let Err(e) = self.backend.save_scanned_text(file_id, &text).await {
            return Err(self.fail(e.at(PipelineStep::SaveText)));
        }
        self.update_file(file_id, |f| f.scanned_text = text.clone());
        self.state.status_message = "保存しました。AI解析を開始します...".into();

        // (b)
        self.enter(Stage::Analyzing);
        let model_ids: Vec<String> = self.models.iter().map(|m| m.id.to_string()).collect();
        let results = match self.backend.generate_analysis(&text, &model_ids).await {
            Ok(results) => results,
            Err(e) => return Err(self.fail(e.at(PipelineStep::Analyze))),
        };
        let combined = combine_replies(&results, &self.models);
        self.state.analysis_result = combined.clone();

        if combined.trim().is_empty() {
            self.finish("AI解析は完了しましたが、結果が空でした");
            return Ok(combined);
        }

        // (c)
        self.enter(Stage::Saving);
        if let Err(e) = self.backend.save_analysis_result(file_id, &combined).await {
            return Err(self.fail(e.at(PipelineStep::SaveAnalysis)));
        }
        self.update_file(file_id, |f| f.ai_generated_text = combined.clone());
        info!(file_id, models = model_ids.len(), "analysis saved");
        self.finish("AI解析が完了しました");
        Ok(combined)
    }

    fn require_selection(&mut self, step: PipelineStep) -> Result<i64> {
        match self.state.selected_file_id {
            Some(id) => Ok(id),
            None => {
                let e = ClientError::Validation("先にファイルを選択してください".into());
                Err(self.fail(e.at(step)))
            }
        }
    }

    fn enter(&mut self, stage: Stage) {
        // 前の処理のFutureが破棄されると段階が残る
        if !Self::continues(self.state.stage, stage) {
            if self.state.stage != Stage::Idle {
                warn!(previous = ?self.state.stage, next = ?stage, "abandoned stage recovered");
            }
            self.state.last_error = None;
            self.state.status_message.clear();
        }
        self.state.stage = stage;
        self.state.status = OpStatus::Pending;
        debug!(?stage, "stage entered");
    }

    /// 保存パイプライン内の連続した遷移か
    fn continues(from: Stage, to: Stage) -> bool {
        matches!(
            (from, to),
            (Stage::Saving, Stage::Analyzing) | (Stage::Analyzing, Stage::Saving)
        )
    }

    fn finish(&mut self, message: impl Into<String>) {
        self.state.stage = Stage::Idle;
        self.state.status = OpStatus::Succeeded;
        self.state.last_error = None;
        self.state.status_message = message.into();
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        let message = error.to_string();
        warn!(stage = ?self.state.stage, error = %message, "pipeline step failed");
        self.state.stage = Stage::Idle;
        self.state.status = OpStatus::Failed(message.clone());
        self.state.status_message = message.clone();
        self.state.last_error = Some(message);
        error
    }

    fn update_file(&mut self, file_id: i64, apply: impl FnOnce(&mut UploadedFile)) {
        if let Some(file) = self.files.iter_mut().find(|f| f.id == file_id) {
            apply(file);
        }
    }
}
