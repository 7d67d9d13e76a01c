//! Brainmax クライアント
//!
//! 検索結果ブラウザと文書取込・注釈パイプラインをリモートのJSON APIの上に実装する。

pub mod api;
pub mod browser;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod session;
pub mod status;
