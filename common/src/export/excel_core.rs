//! Excel生成（共通ライブラリ）
//!
//! 1レコード1行の表形式でワークブックをバッファに生成する。
//! 先頭行はヘッダ、以降がデータ行。

use crate::error::{Error, Result};
use crate::types::{Record, UploadedFile};
use rust_xlsxwriter::*;

/// セル値
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

/// 表の1行として書き出せるデータのトレイト
pub trait SheetRow {
    /// ヘッダ（列名）
    fn headers() -> &'static [&'static str];
    /// ヘッダと同じ順序のセル値
    fn cells(&self) -> Vec<CellValue>;
}

impl SheetRow for Record {
    fn headers() -> &'static [&'static str] {
        &["id", "full_name", "question", "answer"]
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Number(self.id as f64),
            CellValue::Text(self.full_name.clone()),
            CellValue::Text(self.question.clone()),
            CellValue::Text(self.answer.clone()),
        ]
    }
}

impl SheetRow for UploadedFile {
    fn headers() -> &'static [&'static str] {
        &["id", "file_name", "scanned_text", "ai_generated_text"]
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Number(self.id as f64),
            CellValue::Text(self.file_name.clone()),
            CellValue::Text(self.scanned_text.clone()),
            CellValue::Text(self.ai_generated_text.clone()),
        ]
    }
}

/// 列幅（文字数換算）の上限
const MAX_COL_WIDTH: f64 = 60.0;

/// Excelの1セルに入る最大文字数
pub const MAX_CELL_CHARS: usize = 32_767;

/// 上限を超える文字列は文字境界で切り詰める
fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn sheet_err(context: &str, e: XlsxError) -> Error {
    Error::Spreadsheet(format!("{}: {}", context, e))
}

/// Excelをバッファに生成
///
/// # Arguments
/// * `rows` - 書き出す全行（表示中のページではなく保持している全件）
/// * `sheet_name` - シート名
pub fn generate_sheet_buffer<T: SheetRow>(rows: &[T], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xE5E7EB))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let value_format = Format::new()
        .set_align(FormatAlign::Top)
        .set_text_wrap();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| sheet_err("シート名設定エラー", e))?;

    let headers = T::headers();
    let mut widths: Vec<f64> = headers.iter().map(|h| h.chars().count() as f64 + 2.0).collect();

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| sheet_err("ヘッダ書き込みエラー", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, cell) in row.cells().into_iter().enumerate() {
            match cell {
                CellValue::Number(n) => {
                    worksheet
                        .write_number(excel_row, col as u16, n)
                        .map_err(|e| sheet_err("数値書き込みエラー", e))?;
                }
                CellValue::Text(text) => {
                    let text = fit_cell(&text);
                    if let Some(width) = widths.get_mut(col) {
                        *width = width.max(text.chars().count() as f64 + 2.0);
                    }
                    worksheet
                        .write_string_with_format(excel_row, col as u16, text, &value_format)
                        .map_err(|e| sheet_err("値書き込みエラー", e))?;
                }
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        worksheet
            .set_column_width(col as u16, width.min(MAX_COL_WIDTH))
            .map_err(|e| sheet_err("列幅設定エラー", e))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| sheet_err("ウィンドウ枠固定エラー", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| sheet_err("Excel保存エラー", e))
}
