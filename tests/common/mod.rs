//! テスト用の差し替えバックエンド
//!
//! メソッドごとに応答キューを持ち、空なら既定の成功応答を返す。
//! 呼び出し回数と引数を記録する。

#![allow(dead_code)]

use async_trait::async_trait;
use brainmax_client::api::{Backend, FileUpload, GeneratedResults, LoginReply};
use brainmax_client::error::Result;
use brainmax_client::session::Session;
use brainmax_common::{Record, UploadedFile};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

type Queue<T> = Mutex<VecDeque<Result<T>>>;

#[derive(Default)]
pub struct Calls {
    pub list_files: AtomicUsize,
    pub upload_file: AtomicUsize,
    pub scan_document: AtomicUsize,
    pub save_scanned_text: AtomicUsize,
    pub generate_analysis: AtomicUsize,
    pub save_analysis_result: AtomicUsize,
    pub search_records: AtomicUsize,
    pub login: AtomicUsize,
    pub save_generated_copy: AtomicUsize,
}

#[derive(Default)]
pub struct FakeBackend {
    pub calls: Calls,
    pub files: Mutex<Vec<UploadedFile>>,
    pub records: Mutex<Vec<Record>>,

    pub list_files_replies: Queue<Vec<UploadedFile>>,
    pub upload_replies: Queue<String>,
    pub scan_replies: Queue<String>,
    pub save_text_replies: Queue<()>,
    pub generate_replies: Queue<GeneratedResults>,
    pub save_result_replies: Queue<()>,
    pub search_replies: Queue<Vec<Record>>,
    pub login_replies: Queue<LoginReply>,
    pub save_copy_replies: Queue<()>,

    pub prompts: Mutex<Vec<(String, Vec<String>)>>,
    pub saved_texts: Mutex<Vec<(i64, String)>>,
    pub saved_results: Mutex<Vec<(i64, String)>>,
    pub searches: Mutex<Vec<(Option<String>, Option<String>)>>,
    pub saved_copies: Mutex<Vec<(String, String, String)>>,
}

fn next<T>(queue: &Queue<T>, default: impl FnOnce() -> Result<T>) -> Result<T> {
    queue.lock().unwrap().pop_front().unwrap_or_else(default)
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: Vec<UploadedFile>) -> Self {
        let backend = Self::default();
        *backend.files.lock().unwrap() = files;
        backend
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let backend = Self::default();
        *backend.records.lock().unwrap() = records;
        backend
    }

    pub fn push<T>(queue: &Queue<T>, reply: Result<T>) {
        queue.lock().unwrap().push_back(reply);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_files(&self, _uploader: Option<&str>) -> Result<Vec<UploadedFile>> {
        bump(&self.calls.list_files);
        next(&self.list_files_replies, || Ok(self.files.lock().unwrap().clone()))
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<String> {
        bump(&self.calls.upload_file);
        next(&self.upload_replies, || {
            let mut files = self.files.lock().unwrap();
            let id = files.iter().map(|f| f.id).max().unwrap_or(0) + 1;
            files.push(UploadedFile {
                id,
                file_name: upload.file_name.clone(),
                ..Default::default()
            });
            Ok("uploaded".to_string())
        })
    }

    async fn scan_document(&self, _file_id: i64) -> Result<String> {
        bump(&self.calls.scan_document);
        next(&self.scan_replies, || Ok("OCR text".to_string()))
    }

    async fn save_scanned_text(&self, file_id: i64, text: &str) -> Result<()> {
        bump(&self.calls.save_scanned_text);
        self.saved_texts.lock().unwrap().push((file_id, text.to_string()));
        next(&self.save_text_replies, || Ok(()))
    }

    async fn generate_analysis(&self, prompt: &str, model_ids: &[String]) -> Result<GeneratedResults> {
        bump(&self.calls.generate_analysis);
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), model_ids.to_vec()));
        next(&self.generate_replies, || {
            Ok(model_ids
                .iter()
                .map(|id| (id.clone(), format!("analysis by {}", id)))
                .collect())
        })
    }

    async fn save_analysis_result(&self, file_id: i64, text: &str) -> Result<()> {
        bump(&self.calls.save_analysis_result);
        self.saved_results.lock().unwrap().push((file_id, text.to_string()));
        next(&self.save_result_replies, || Ok(()))
    }

    async fn search_records(&self, query: Option<&str>, username: Option<&str>) -> Result<Vec<Record>> {
        bump(&self.calls.search_records);
        self.searches
            .lock()
            .unwrap()
            .push((query.map(str::to_string), username.map(str::to_string)));
        next(&self.search_replies, || Ok(self.records.lock().unwrap().clone()))
    }

    async fn login(&self, username: &str, _password: &str) -> Result<LoginReply> {
        bump(&self.calls.login);
        next(&self.login_replies, || {
            Ok(LoginReply {
                token: format!("token-{}", username),
                full_name: format!("{} san", username),
            })
        })
    }

    async fn save_generated_copy(&self, full_name: &str, question: &str, answer: &str) -> Result<()> {
        bump(&self.calls.save_generated_copy);
        self.saved_copies.lock().unwrap().push((
            full_name.to_string(),
            question.to_string(),
            answer.to_string(),
        ));
        next(&self.save_copy_replies, || Ok(()))
    }
}

pub fn record(id: i64, full_name: &str, question: &str, answer: &str) -> Record {
    Record {
        id,
        full_name: full_name.to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
    }
}

pub fn file(id: i64, name: &str, scanned: &str, analyzed: &str) -> UploadedFile {
    UploadedFile {
        id,
        file_name: name.to_string(),
        scanned_text: scanned.to_string(),
        ai_generated_text: analyzed.to_string(),
    }
}

pub fn member_session(username: &str) -> Session {
    Session::new(username, &format!("{} san", username), "token", "root")
}

pub fn admin_session() -> Session {
    Session::new("root", "管理者", "token", "root")
}
