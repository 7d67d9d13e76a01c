//! ワークブック生成（CLIとライブラリで共有）

#[cfg(feature = "excel")]
pub mod excel_core;
