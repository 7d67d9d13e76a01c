//! 共通ライブラリのエラー型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// カタログにないモデルID・表示名
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown sort key: {0}. Use id, full_name, question or answer")]
    UnknownSortKey(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

pub type Result<T> = std::result::Result<T, Error>;
