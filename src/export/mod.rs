//! Excel出力（CLI版）
//!
//! ワークブックは common の excel_core でバッファに生成し、ここではディスクへ書く。

use crate::error::Result;
use brainmax_common::{SheetRow, generate_sheet_buffer};
use std::path::{Path, PathBuf};
use tracing::info;

pub const RESULTS_TITLE: &str = "test_results";
pub const FILES_TITLE: &str = "files";
pub const SHEET_NAME: &str = "Data";

/// ディレクトリまたは拡張子なしのパスなら `{title}.xlsx` を付ける
pub fn output_path_for(output: &Path, title: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.xlsx", title))
    } else {
        output.to_path_buf()
    }
}

/// 生成済みバッファを書き出す
pub fn write_buffer(buffer: &[u8], output: &Path, title: &str) -> Result<PathBuf> {
    let path = output_path_for(output, title);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, buffer)?;
    info!(path = %path.display(), bytes = buffer.len(), "workbook written");
    Ok(path)
}

/// 行データからワークブックを生成して書き出す
pub fn export_rows<T: SheetRow>(rows: &[T], output: &Path, title: &str) -> Result<PathBuf> {
    let buffer = generate_sheet_buffer(rows, SHEET_NAME)?;
    write_buffer(&buffer, output, title)
}
