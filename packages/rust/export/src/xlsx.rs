//! Workbook writer for the analysis template.

use std::path::Path;

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{info, instrument};

use oddsboard_shared::{OddsError, Record, Result};

use crate::layout::{
    COLUMN_COUNT, COLUMN_WIDTHS, MAIN_HEADERS, MERGED_HEADERS, RowKind, SUB_HEADERS, grid_rows,
};

pub const TEMPLATE_SHEET: &str = "足球彩票分析模板";
pub const INFO_SHEET: &str = "数据来源信息";

const HEADER_BG: u32 = 0x366092;
const MATCH_BG: u32 = 0xFFF2CC;
const TIME_LABEL_BG: u32 = 0xE7E6E6;

/// Provenance written to the info sheet.
#[derive(Debug, Clone)]
pub struct WorkbookMeta {
    pub source_url: String,
    /// Backend that produced the data (`http`, `chrome`, ...).
    pub method: String,
    pub generated_at: DateTime<Local>,
    pub asian_handicap: bool,
    pub kelly: bool,
    /// Set when the records are the synthetic fallback batch.
    pub degraded: Option<String>,
}

impl WorkbookMeta {
    pub fn new(source_url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            method: method.into(),
            generated_at: Local::now(),
            asian_handicap: false,
            kelly: false,
            degraded: None,
        }
    }
}

struct Styles {
    header: Format,
    match_row: Format,
    time_label: Format,
    data: Format,
}

impl Styles {
    fn new() -> Self {
        let base = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::Black);

        Self {
            header: base
                .clone()
                .set_bold()
                .set_font_size(11)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_BG)),
            match_row: base
                .clone()
                .set_bold()
                .set_font_size(11)
                .set_background_color(Color::RGB(MATCH_BG)),
            time_label: base
                .clone()
                .set_font_size(10)
                .set_background_color(Color::RGB(TIME_LABEL_BG)),
            data: base.set_background_color(Color::White),
        }
    }
}

fn export_err(e: XlsxError) -> OddsError {
    OddsError::Export(e.to_string())
}

/// Write `records` into a new workbook at `path`, replacing any existing file.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_workbook(records: &[Record], path: &Path, meta: &WorkbookMeta) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| OddsError::io(parent, e))?;
    }

    let styles = Styles::new();
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(TEMPLATE_SHEET).map_err(export_err)?;
        write_template(sheet, records, &styles).map_err(export_err)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(INFO_SHEET).map_err(export_err)?;
        write_info(sheet, records.len(), meta).map_err(export_err)?;
    }

    workbook
        .save(path)
        .map_err(|e| OddsError::Export(format!("failed writing {}: {e}", path.display())))?;

    info!("workbook written");
    Ok(())
}

fn write_template(
    sheet: &mut Worksheet,
    records: &[Record],
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    // Row 1: section titles, merged where a section spans columns.
    sheet.write_blank(0, 0, &styles.header)?;
    for (start, end) in MERGED_HEADERS {
        let title = MAIN_HEADERS[start];
        if end > start {
            sheet.merge_range(0, start as u16, 0, end as u16, title, &styles.header)?;
        } else {
            sheet.write_string_with_format(0, start as u16, title, &styles.header)?;
        }
    }

    // Row 2: column titles.
    for (col, title) in SUB_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(1, col as u16, *title, &styles.header)?;
    }
    sheet.set_row_height(0, 25)?;
    sheet.set_row_height(1, 20)?;

    let mut row: u32 = 2;
    for record in records {
        for grid_row in grid_rows(record) {
            for col in 0..COLUMN_COUNT {
                let format = match (grid_row.kind, col) {
                    (RowKind::Match, _) => &styles.match_row,
                    (RowKind::Time, 0) => &styles.time_label,
                    (RowKind::Time, _) => &styles.data,
                };
                let value = &grid_row.cells[col];
                if value.is_empty() {
                    sheet.write_blank(row, col as u16, format)?;
                } else {
                    sheet.write_string_with_format(row, col as u16, value, format)?;
                }
            }
            row += 1;
        }
    }

    sheet.set_freeze_panes(2, 0)?;
    Ok(())
}

fn write_info(
    sheet: &mut Worksheet,
    count: usize,
    meta: &WorkbookMeta,
) -> std::result::Result<(), XlsxError> {
    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 40)?;

    let yes_no = |flag: bool| if flag { "是" } else { "否" };
    let status = match &meta.degraded {
        Some(reason) => format!("回退数据 ({reason})"),
        None => "实时数据".to_string(),
    };

    let rows = [
        ("生成时间", meta.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ("数据来源", meta.source_url.clone()),
        ("抓取方式", meta.method.clone()),
        ("比赛数量", count.to_string()),
        ("亚盘数据", yes_no(meta.asian_handicap).to_string()),
        ("凯利数据", yes_no(meta.kelly).to_string()),
        ("数据状态", status),
    ];

    for (idx, (label, value)) in rows.iter().enumerate() {
        sheet.write_string(idx as u32, 0, *label)?;
        sheet.write_string(idx as u32, 1, value)?;
    }
    Ok(())
}
