//! 検索結果ビューのロジック（UI非依存）
//!
//! 取得 → 完全性フィルタ → ソート → ページ分割 の純粋関数群と、
//! ソート・ページ位置を保持する ViewState。

use crate::error::Error;
use crate::types::Record;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 必須フィールドが欠けたレコードを除外（順序は維持）
pub fn filter_complete(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().filter(Record::is_complete).collect()
}

/// ソートキー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    FullName,
    Question,
    Answer,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::FullName => "full_name",
            SortKey::Question => "question",
            SortKey::Answer => "answer",
        }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::FullName => a.full_name.cmp(&b.full_name),
            SortKey::Question => a.question.cmp(&b.question),
            SortKey::Answer => a.answer.cmp(&b.answer),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "id" => Ok(SortKey::Id),
            "full_name" | "fullname" | "name" => Ok(SortKey::FullName),
            "question" => Ok(SortKey::Question),
            "answer" => Ok(SortKey::Answer),
            _ => Err(Error::UnknownSortKey(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// 表示用矢印
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// 安定ソート（同値は元の相対順を維持）
pub fn sort_records(records: &[Record], key: SortKey, direction: SortDirection) -> Vec<Record> {
    let mut sorted = records.to_vec();
    // 降順は比較を反転させる（reverseすると同値の順序が崩れる）
    sorted.sort_by(|a, b| match direction {
        SortDirection::Asc => key.compare(a, b),
        SortDirection::Desc => key.compare(b, a),
    });
    sorted
}

/// 総ページ数（空でも1ページとして数える）
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// 範囲外のページ番号を最終ページに丸める
pub fn clamp_page(len: usize, page_index: usize, page_size: usize) -> usize {
    page_index.min(page_count(len, page_size) - 1)
}

/// 指定ページのスライスを返す
///
/// 範囲外の `page_index` は最終ページに丸めるため、
/// 空でないリストに対して空スライスを返すことはない。
pub fn paginate(records: &[Record], page_index: usize, page_size: usize) -> &[Record] {
    let size = page_size.max(1);
    let page = clamp_page(records.len(), page_index, size);
    let start = page * size;
    let end = std::cmp::min(start + size, records.len());
    &records[start.min(end)..end]
}

/// 検索結果ビューの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub query: String,
    pub sort: Option<SortSpec>,
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            sort: None,
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    /// 同じキーなら方向を反転、新しいキーなら昇順。ページは先頭に戻す。
    pub fn toggle_sort(&mut self, key: SortKey) -> SortDirection {
        let direction = match self.sort {
            Some(spec) if spec.key == key => spec.direction.flipped(),
            _ => SortDirection::Asc,
        };
        self.sort = Some(SortSpec { key, direction });
        self.page_index = 0;
        direction
    }

    /// 方向を明示して設定
    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort = Some(SortSpec { key, direction });
        self.page_index = 0;
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.page_index = 0;
    }

    /// 新しい取得結果を受けたとき
    pub fn reset_for_fetch(&mut self, query: &str) {
        self.query = query.to_string();
        self.page_index = 0;
    }

    pub fn go_to_page(&mut self, page_index: usize, total: usize) {
        self.page_index = clamp_page(total, page_index, self.page_size);
    }

    pub fn next_page(&mut self, total: usize) {
        self.go_to_page(self.page_index + 1, total);
    }

    pub fn prev_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn is_first_page(&self) -> bool {
        self.page_index == 0
    }

    pub fn is_last_page(&self, total: usize) -> bool {
        self.page_index + 1 >= page_count(total, self.page_size)
    }

    /// ソート適用済みの全件
    pub fn arrange(&self, records: &[Record]) -> Vec<Record> {
        match self.sort {
            Some(spec) => sort_records(records, spec.key, spec.direction),
            None => records.to_vec(),
        }
    }

    /// ソート・ページ分割を適用した表示分
    pub fn visible(&self, records: &[Record]) -> Vec<Record> {
        let arranged = self.arrange(records);
        paginate(&arranged, self.page_index, self.page_size).to_vec()
    }

    /// "1 / 3" 形式のページ表示
    pub fn page_label(&self, total: usize) -> String {
        format!(
            "{} / {}",
            clamp_page(total, self.page_index, self.page_size) + 1,
            page_count(total, self.page_size)
        )
    }
}
