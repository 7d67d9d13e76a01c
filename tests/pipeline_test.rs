//! 文書取込・注釈パイプラインの統合テスト
//!
//! 失敗したステップ以降のリクエストが送られないことを呼び出し回数で確認する。

mod common;

use brainmax_client::api::FileUpload;
use brainmax_client::error::{ClientError, FailureKind, PipelineStep};
use brainmax_client::pipeline::{ModelSelection, Pipeline, PipelineOptions, Stage};
use brainmax_client::status::OpStatus;
use brainmax_common::ModelCatalog;
use common::{FakeBackend, file};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::tempdir;

async fn pipeline_with(files: Vec<brainmax_common::UploadedFile>) -> (Arc<FakeBackend>, Pipeline<FakeBackend>) {
    let backend = Arc::new(FakeBackend::with_files(files));
    let mut pipeline = Pipeline::new(backend.clone(), PipelineOptions::default()).unwrap();
    pipeline.refresh_files().await.unwrap();
    (backend, pipeline)
}

/// テキスト保存が失敗したら解析も結果保存も呼ばない
#[tokio::test]
async fn test_save_text_failure_stops_pipeline() {
    let (backend, mut pipeline) = pipeline_with(vec![file(1, "a.pdf", "", "")]).await;
    pipeline.select_file(Some(1)).unwrap();
    pipeline.set_text("本文");

    FakeBackend::push(&backend.save_text_replies, Err(ClientError::Application("disk full".into())));
    let err = pipeline.save_and_analyze().await.unwrap_err();

    assert_eq!(err.step(), Some(PipelineStep::SaveText));
    assert_eq!(err.kind(), FailureKind::Application);
    assert_eq!(FakeBackend::count(&backend.calls.save_scanned_text), 1);
    assert_eq!(FakeBackend::count(&backend.calls.generate_analysis), 0);
    assert_eq!(FakeBackend::count(&backend.calls.save_analysis_result), 0);

    let state = pipeline.state();
    assert_eq!(state.stage, Stage::Idle);
    assert!(state.last_error.as_deref().unwrap().contains("disk full"));
    assert!(matches!(state.status, OpStatus::Failed(_)));
}

/// 解析が失敗したら結果保存は呼ばない
#[tokio::test]
async fn test_analyze_failure_skips_result_save() {
    let (backend, mut pipeline) = pipeline_with(vec![file(1, "a.pdf", "", "")]).await;
    pipeline.select_file(Some(1)).unwrap();
    pipeline.set_text("本文");

    FakeBackend::push(&backend.generate_replies, Err(ClientError::Network("timeout".into())));
    let err = pipeline.save_and_analyze().await.unwrap_err();

    assert_eq!(err.step(), Some(PipelineStep::Analyze));
    assert_eq!(err.kind(), FailureKind::Network);
    assert_eq!(FakeBackend::count(&backend.calls.save_scanned_text), 1);
    assert_eq!(FakeBackend::count(&backend.calls.generate_analysis), 1);
    assert_eq!(FakeBackend::count(&backend.calls.save_analysis_result), 0);

    // 保存済みのテキストは反映されている
    assert_eq!(pipeline.files()[0].scanned_text, "本文");
    assert_eq!(pipeline.state().stage, Stage::Idle);
}

/// 結果保存の失敗はそのステップとして報告
#[tokio::test]
async fn test_result_save_failure_reported() {
    let (backend, mut pipeline) = pipeline_with(vec![file(1, "a.pdf", "", "")]).await;
    pipeline.select_file(Some(1)).unwrap();
    pipeline.set_text("本文");

    FakeBackend::push(&backend.save_result_replies, Err(ClientError::Application("locked".into())));
    let err = pipeline.save_and_analyze().await.unwrap_err();

    assert_eq!(err.step(), Some(PipelineStep::SaveAnalysis));
    assert!(err.to_string().starts_with("解析結果保存失敗"));
    assert_eq!(pipeline.files()[0].ai_generated_text, "");
    // 解析結果自体は表示できる
    assert_eq!(pipeline.state().analysis_result, "analysis by 6");
}

/// 全ステップ成功
#[tokio::test]
async fn test_save_and_analyze_success() {
    let (backend, mut pipeline) = pipeline_with(vec![file(7, "b.pdf", "old", "")]).await;
    pipeline.select_file(Some(7)).unwrap();
    assert_eq!(pipeline.state().editable_text, "old");
    pipeline.set_text("new text");

    let mut reply = BTreeMap::new();
    reply.insert("google/gemini-2.0-flash-exp:free".to_string(), "要約".to_string());
    FakeBackend::push(&backend.generate_replies, Ok(reply));

    let analysis = pipeline.save_and_analyze().await.unwrap();
    assert_eq!(analysis, "要約");

    assert_eq!(backend.saved_texts.lock().unwrap().clone(), vec![(7, "new text".to_string())]);
    assert_eq!(backend.saved_results.lock().unwrap().clone(), vec![(7, "要約".to_string())]);
    let prompts = backend.prompts.lock().unwrap().clone();
    assert_eq!(prompts, vec![("new text".to_string(), vec!["6".to_string()])]);

    let file = pipeline.selected_file().unwrap();
    assert_eq!(file.scanned_text, "new text");
    assert_eq!(file.ai_generated_text, "要約");
    assert_eq!(pipeline.state().status, OpStatus::Succeeded);
    assert!(pipeline.state().last_error.is_none());
}

/// 解析結果が空なら保存しない
#[tokio::test]
async fn test_empty_analysis_not_saved() {
    let (backend, mut pipeline) = pipeline_with(vec![file(1, "a.pdf", "text", "")]).await;
    pipeline.select_file(Some(1)).unwrap();

    FakeBackend::push(&backend.generate_replies, Ok(BTreeMap::new()));
    let analysis = pipeline.save_and_analyze().await.unwrap();

    assert!(analysis.is_empty());
    assert_eq!(FakeBackend::count(&backend.calls.save_analysis_result), 0);
    assert_eq!(pipeline.state().stage, Stage::Idle);
}

/// 未選択・空テキストは送信前に弾く
#[tokio::test]
async fn test_validation_before_request() {
    let (backend, mut pipeline) = pipeline_with(vec![file(1, "a.pdf", "", "")]).await;

    let err = pipeline.save_and_analyze().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    let err = pipeline.scan().await.unwrap_err();
    assert_eq!(err.step(), Some(PipelineStep::Scan));

    pipeline.select_file(Some(1)).unwrap();
    pipeline.set_text("   \n");
    let err = pipeline.save_and_analyze().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);

    assert_eq!(FakeBackend::count(&backend.calls.save_scanned_text), 0);
    assert_eq!(FakeBackend::count(&backend.calls.scan_document), 0);
    assert!(pipeline.state().last_error.is_some());
}

/// スキャン結果が編集欄に入る
#[tokio::test]
async fn test_scan_populates_text() {
    let (backend, mut pipeline) = pipeline_with(vec![file(3, "c.pdf", "", "old analysis")]).await;
    pipeline.select_file(Some(3)).unwrap();
    assert_eq!(pipeline.state().analysis_result, "old analysis");

    FakeBackend::push(&backend.scan_replies, Ok("抽出テキスト".to_string()));
    let text = pipeline.scan().await.unwrap();
    assert_eq!(text, "抽出テキスト");
    assert_eq!(pipeline.state().editable_text, "抽出テキスト");
    assert_eq!(pipeline.state().analysis_result, "");
    assert_eq!(pipeline.state().stage, Stage::Idle);
}

/// スキャン失敗後も他の操作はできる
#[tokio::test]
async fn test_scan_failure_recoverable() {
    let (backend, mut pipeline) = pipeline_with(vec![file(3, "c.pdf", "keep", "")]).await;
    pipeline.select_file(Some(3)).unwrap();

    FakeBackend::push(&backend.scan_replies, Err(ClientError::Application("スキャン失敗".into())));
    assert!(pipeline.scan().await.is_err());
    assert_eq!(pipeline.state().editable_text, "keep");

    let text = pipeline.scan().await.unwrap().to_string();
    assert_eq!(text, "OCR text");
    assert!(pipeline.state().last_error.is_none());
}

/// 選択の切り替えと解除
#[tokio::test]
async fn test_select_file_loads_and_clears() {
    let (_backend, mut pipeline) =
        pipeline_with(vec![file(1, "a.pdf", "ocr", "ai"), file(2, "b.pdf", "", "")]).await;

    pipeline.select_file(Some(1)).unwrap();
    assert_eq!(pipeline.state().editable_text, "ocr");
    assert_eq!(pipeline.state().analysis_result, "ai");

    pipeline.select_file(Some(2)).unwrap();
    assert_eq!(pipeline.state().editable_text, "");

    pipeline.select_file(None).unwrap();
    assert_eq!(pipeline.state().selected_file_id, None);
    assert!(pipeline.state().analysis_result.is_empty());

    assert!(pipeline.select_file(Some(99)).is_err());
}

/// アップロード成功で一覧を再取得
#[tokio::test]
async fn test_upload_refreshes_list() {
    let (backend, mut pipeline) = pipeline_with(vec![]).await;
    let upload = FileUpload {
        file_name: "new.pdf".into(),
        mime: "application/pdf".into(),
        bytes: b"%PDF".to_vec(),
        uploader: "root".into(),
    };

    pipeline.upload(upload).await.unwrap();
    assert_eq!(FakeBackend::count(&backend.calls.upload_file), 1);
    assert_eq!(FakeBackend::count(&backend.calls.list_files), 2);
    assert_eq!(pipeline.files().len(), 1);
    assert_eq!(pipeline.files()[0].file_name, "new.pdf");
}

/// 一覧の再取得に失敗してもアップロードは成功扱いでエラーを残さない
#[tokio::test]
async fn test_upload_survives_refresh_failure() {
    let (backend, mut pipeline) = pipeline_with(vec![file(1, "a.pdf", "", "")]).await;
    FakeBackend::push(&backend.list_files_replies, Err(ClientError::Network("timeout".into())));
    let upload = FileUpload {
        file_name: "new.pdf".into(),
        mime: "application/pdf".into(),
        bytes: b"%PDF".to_vec(),
        uploader: "root".into(),
    };

    let message = pipeline.upload(upload).await.unwrap();
    assert_eq!(message, "uploaded");
    assert_eq!(FakeBackend::count(&backend.calls.list_files), 2);
    assert_eq!(pipeline.state().status, OpStatus::Succeeded);
    assert_eq!(pipeline.state().last_error, None);
    assert!(pipeline.state().status_message.starts_with("アップロードしました: new.pdf"));
    assert!(pipeline.state().status_message.contains("ファイル一覧を更新できませんでした"));
    // 古い一覧のまま
    assert_eq!(pipeline.files().len(), 1);
}

/// アップロード失敗後も次のアップロードはできる
#[tokio::test]
async fn test_upload_failure_does_not_block() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    std::fs::write(&path, b"%PDF-1.4").unwrap();

    let (backend, mut pipeline) = pipeline_with(vec![]).await;
    FakeBackend::push(&backend.upload_replies, Err(ClientError::Network("connection reset".into())));

    let err = pipeline.upload_path(&path).await.unwrap_err();
    assert_eq!(err.step(), Some(PipelineStep::Upload));
    assert_eq!(pipeline.state().stage, Stage::Idle);
    assert_eq!(FakeBackend::count(&backend.calls.list_files), 1);

    pipeline.upload_path(&path).await.unwrap();
    assert_eq!(pipeline.files().len(), 1);

    let missing = pipeline.upload_path(&dir.path().join("none.pdf")).await.unwrap_err();
    assert_eq!(missing.kind(), FailureKind::Validation);
}

/// 単一選択では複数モデルを拒否
#[tokio::test]
async fn test_model_selection() {
    let backend = Arc::new(FakeBackend::new());
    let options = PipelineOptions {
        catalog: ModelCatalog::Chat,
        selection: ModelSelection::Multi,
        default_models: vec!["1".into()],
        uploader: "root".into(),
        list_uploader: None,
    };
    let mut multi = Pipeline::new(backend.clone(), options.clone()).unwrap();
    multi.set_models(&["1".to_string(), "3".to_string()]).unwrap();
    assert_eq!(multi.models().len(), 2);

    let mut single = Pipeline::new(
        backend,
        PipelineOptions { selection: ModelSelection::Single, ..options },
    )
    .unwrap();
    assert!(single.set_models(&["1".to_string(), "3".to_string()]).is_err());
    assert!(single.set_models(&[]).is_err());
    assert!(single.set_models(&["6".to_string()]).is_err());
}

/// 複数モデルの結果は表示名付きで連結
#[tokio::test]
async fn test_multi_model_results_tagged() {
    let backend = Arc::new(FakeBackend::with_files(vec![file(1, "a.pdf", "text", "")]));
    let options = PipelineOptions {
        catalog: ModelCatalog::Chat,
        selection: ModelSelection::Multi,
        default_models: vec!["1".into(), "3".into()],
        uploader: "root".into(),
        list_uploader: None,
    };
    let mut pipeline = Pipeline::new(backend.clone(), options).unwrap();
    pipeline.refresh_files().await.unwrap();
    pipeline.select_file(Some(1)).unwrap();

    let analysis = pipeline.save_and_analyze().await.unwrap();
    assert_eq!(analysis, "[Deepseek-R1]\nanalysis by 1\n\n[Claude4.0]\nanalysis by 3");
}
