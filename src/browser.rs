//! 検索結果ブラウザ
//!
//! 取得 → 完全性フィルタ → ソート/ページ分割 → 再検索 → エクスポート。
//! 検索はリクエストごとに連番を振り、古いレスポンスは破棄する。

use crate::api::Backend;
use crate::error::Result;
use crate::export::SHEET_NAME;
use crate::session::{Role, Session};
use crate::status::{OpStatus, RequestSeq, Ticket};
use brainmax_common::{
    Record, SortDirection, SortKey, ViewState, filter_complete, generate_sheet_buffer, page_count,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 表示形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 全件を表で表示
    Table,
    /// 1件ずつ前後に移動
    SingleRecord,
}

impl Layout {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Layout::Table,
            Role::Member => Layout::SingleRecord,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub page_size: usize,
    /// None ならセッションの権限から決める
    pub layout: Option<Layout>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            page_size: brainmax_common::DEFAULT_PAGE_SIZE,
            layout: None,
        }
    }
}

/// 発行中の検索
#[derive(Debug)]
pub struct SearchTicket {
    ticket: Ticket,
    query: String,
}

pub struct ResultBrowser<B: Backend + ?Sized> {
    backend: Arc<B>,
    session: Session,
    layout: Layout,
    records: Vec<Record>,
    view: ViewState,
    status: OpStatus,
    seq: RequestSeq,
}

impl<B: Backend + ?Sized> ResultBrowser<B> {
    pub fn new(backend: Arc<B>, session: Session, options: BrowserOptions) -> Self {
        let layout = options.layout.unwrap_or_else(|| Layout::for_role(session.role));
        // 1件表示は1ページ1件として扱う
        let page_size = match layout {
            Layout::Table => options.page_size,
            Layout::SingleRecord => 1,
        };

        Self {
            backend,
            session,
            layout,
            records: Vec::new(),
            view: ViewState::new(page_size),
            status: OpStatus::Idle,
            seq: RequestSeq::default(),
        }
    }

    /// 検索を開始（状態を Pending にし、番号を発行）
    pub fn begin_search(&mut self, query: &str) -> SearchTicket {
        self.status = OpStatus::Pending;
        SearchTicket {
            ticket: self.seq.issue(),
            query: query.trim().to_string(),
        }
    }

    /// 検索結果を反映
    ///
    /// 最新でないレスポンスは状態を変えずに捨て、`Ok(false)` を返す。
    /// 失敗時は保持中のリストを残したままエラーを記録する。
    pub fn complete_search(
        &mut self,
        search: SearchTicket,
        result: Result<Vec<Record>>,
    ) -> Result<bool> {
        if !self.seq.is_latest(search.ticket) {
            debug!(query = %search.query, "stale search response discarded");
            return Ok(false);
        }

        match result {
            Ok(fetched) => {
                let fetched_count = fetched.len();
                self.records = filter_complete(fetched);
                self.view.reset_for_fetch(&search.query);
                self.status = OpStatus::Succeeded;
                info!(
                    query = %search.query,
                    fetched = fetched_count,
                    kept = self.records.len(),
                    "search completed"
                );
                Ok(true)
            }
            Err(e) => {
                warn!(query = %search.query, error = %e, "search failed");
                self.status = OpStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// 検索（空クエリは全件）
    pub async fn search(&mut self, query: &str) -> Result<&[Record]> {
        let ticket = self.begin_search(query);
        let query = (!ticket.query.is_empty()).then_some(ticket.query.as_str());
        let result = self
            .backend
            .search_records(query, Some(self.session.username.as_str()))
            .await;
        self.complete_search(ticket, result)?;
        Ok(&self.records)
    }

    /// 現在のクエリで再取得
    pub async fn refresh(&mut self) -> Result<&[Record]> {
        let query = self.view.query.clone();
        self.search(&query).await
    }

    /// 同じキーなら方向反転、新しいキーなら昇順
    pub fn sort_by(&mut self, key: SortKey) -> SortDirection {
        self.view.toggle_sort(key)
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.view.set_sort(key, direction);
    }

    pub fn go_to_page(&mut self, page_index: usize) {
        self.view.go_to_page(page_index, self.records.len());
    }

    pub fn next(&mut self) {
        self.view.next_page(self.records.len());
    }

    pub fn prev(&mut self) {
        self.view.prev_page();
    }

    /// フィルタ済みの保持レコード（取得順）
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// ソート済みの全件
    pub fn arranged(&self) -> Vec<Record> {
        self.view.arrange(&self.records)
    }

    /// 表示中のページ
    pub fn visible(&self) -> Vec<Record> {
        self.view.visible(&self.records)
    }

    /// 1件表示での現在レコード
    pub fn current_record(&self) -> Option<Record> {
        self.visible().into_iter().next()
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn page_count(&self) -> usize {
        page_count(self.records.len(), self.view.page_size)
    }

    pub fn page_label(&self) -> String {
        self.view.page_label(self.records.len())
    }

    pub fn is_first(&self) -> bool {
        self.view.is_first_page()
    }

    pub fn is_last(&self) -> bool {
        self.view.is_last_page(self.records.len())
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &OpStatus {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.status.error()
    }

    /// 保持している全件（表示ページではなく）をExcelに書き出す
    pub fn export_all(&self) -> Result<Vec<u8>> {
        let rows = self.arranged();
        Ok(generate_sheet_buffer(&rows, SHEET_NAME)?)
    }
}
