//! Brainmax Common Library
//!
//! CLIとクライアントライブラリで共有される型と純粋ロジック

pub mod types;
pub mod error;
pub mod models;
pub mod view;
pub mod export;

pub use types::{ChatMessage, Record, Sender, UploadedFile};
pub use error::{Error, Result};
pub use models::{ModelCatalog, ModelSpec, combine_replies, reply_for, single_reply};
pub use view::{
    SortDirection, SortKey, SortSpec, ViewState, DEFAULT_PAGE_SIZE,
    clamp_page, filter_complete, page_count, paginate, sort_records,
};

#[cfg(feature = "excel")]
pub use export::excel_core::{CellValue, MAX_CELL_CHARS, SheetRow, generate_sheet_buffer};
