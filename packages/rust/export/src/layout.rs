//! The analysis template: 18 columns (A..R), two header rows, then one block
//! per fixture made of a match row and nine time-point rows.

use oddsboard_shared::Record;

pub const COLUMN_COUNT: usize = 18;

/// Row 1 section titles, positioned at the first column of their span.
pub const MAIN_HEADERS: [&str; COLUMN_COUNT] = [
    "", "亚盘盘口", "", "", "横纵分析", "", "", "左右格局警示", "", "主流凯利", "", "", "",
    "平局预警", "平赔数据", "", "", "",
];

/// Row 2 column titles.
pub const SUB_HEADERS: [&str; COLUMN_COUNT] = [
    "比赛/时间",
    "初始亚凯对比",
    "主",
    "客",
    "对比",
    "主",
    "客",
    "预测",
    "提示",
    "初凯",
    "即凯",
    "初变",
    "初变",
    "",
    "初凯",
    "即凯",
    "即初凯",
    "初凯变化",
];

/// Column widths in character units, A..R.
pub const COLUMN_WIDTHS: [u16; COLUMN_COUNT] =
    [10, 12, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 10, 8, 8, 10, 12];

/// Row 1 merged spans as inclusive zero-based column ranges.
pub const MERGED_HEADERS: [(usize, usize); 6] =
    [(1, 3), (4, 6), (7, 8), (9, 12), (13, 13), (14, 17)];

/// Time points tracked under every fixture.
pub const TIME_LABELS: [&str; 9] = [
    "初盘3点",
    "赛前1",
    "赛前2",
    "临场一小时",
    "临场半小时",
    "临场15分钟",
    "临场10分钟",
    "临场",
    "完场",
];

/// Shown when a fixture has no line at all.
const PENDING: &str = "待定";

// Kelly placement on the first time row.
const KELLY_WIN: usize = 2;
const KELLY_LOSE: usize = 3;
const KELLY_WIN_2: usize = 5;
const KELLY_LOSE_2: usize = 6;
const KELLY_DRAW: usize = 8;
const KELLY_DRAW_2: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Highlighted fixture row.
    Match,
    /// Time-point row; column A holds the label.
    Time,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub kind: RowKind,
    pub cells: [String; COLUMN_COUNT],
}

impl GridRow {
    fn new(kind: RowKind) -> Self {
        Self {
            kind,
            cells: Default::default(),
        }
    }
}

/// The block of rows one record occupies: the match row followed by one row
/// per [`TIME_LABELS`] entry.
///
/// The match row shows the Asian line and waters once enriched, otherwise the
/// base handicap with win and let odds. Kelly values go on the first time row.
pub fn grid_rows(record: &Record) -> Vec<GridRow> {
    let mut rows = Vec::with_capacity(1 + TIME_LABELS.len());

    let mut head = GridRow::new(RowKind::Match);
    head.cells[0] = record.match_id.clone();
    match &record.asian_handicap {
        Some(line) => {
            head.cells[1] = line.clone();
            head.cells[2] = record.home_water.clone().unwrap_or_default();
            head.cells[3] = record.away_water.clone().unwrap_or_default();
        }
        None => {
            head.cells[1] = if record.handicap.is_empty() {
                PENDING.to_string()
            } else {
                record.handicap.clone()
            };
            head.cells[2] = record.win_odds.clone();
            head.cells[3] = record.let_odds.clone();
        }
    }
    rows.push(head);

    for (idx, label) in TIME_LABELS.iter().enumerate() {
        let mut row = GridRow::new(RowKind::Time);
        row.cells[0] = label.to_string();

        if idx == 0 {
            if let Some(kelly) = &record.kelly {
                row.cells[KELLY_WIN] = kelly.win.clone();
                row.cells[KELLY_LOSE] = kelly.lose.clone();
                row.cells[KELLY_DRAW] = kelly.draw.clone();
            }
            if let Some(second) = &record.kelly_second {
                row.cells[KELLY_WIN_2] = second.win.clone();
                row.cells[KELLY_LOSE_2] = second.lose.clone();
                row.cells[KELLY_DRAW_2] = second.draw.clone();
            }
        }
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddsboard_shared::{Enrichment, OddsTriple};

    fn base_record() -> Record {
        Record {
            handicap: "-1".into(),
            win_odds: "1.85".into(),
            let_odds: "3.40".into(),
            ..Record::new("周一001")
        }
    }

    #[test]
    fn block_is_match_row_plus_time_rows() {
        let rows = grid_rows(&base_record());
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].kind, RowKind::Match);
        assert!(rows[1..].iter().all(|r| r.kind == RowKind::Time));
        let labels: Vec<&str> = rows[1..].iter().map(|r| r.cells[0].as_str()).collect();
        assert_eq!(labels, TIME_LABELS);
    }

    #[test]
    fn unenriched_match_row_shows_base_odds() {
        let rows = grid_rows(&base_record());
        assert_eq!(rows[0].cells[..4], ["周一001", "-1", "1.85", "3.40"]);
        assert!(rows[1].cells[1..].iter().all(String::is_empty));
    }

    #[test]
    fn missing_handicap_is_pending() {
        let rows = grid_rows(&Record::new("001"));
        assert_eq!(rows[0].cells[1], "待定");
    }

    #[test]
    fn enriched_record_places_asian_and_kelly() {
        let mut record = base_record();
        record.apply(&Enrichment::AsianHandicap {
            line: "半球".into(),
            home_water: "0.88".into(),
            away_water: "0.98".into(),
        });
        record.apply(&Enrichment::Kelly {
            first: OddsTriple::new("0.91", "0.95", "0.97"),
            second: Some(OddsTriple::new("0.90", "0.96", "0.98")),
        });

        let rows = grid_rows(&record);
        assert_eq!(rows[0].cells[..4], ["周一001", "半球", "0.88", "0.98"]);

        let first_time = &rows[1].cells;
        assert_eq!(first_time[2], "0.91");
        assert_eq!(first_time[3], "0.97");
        assert_eq!(first_time[5], "0.90");
        assert_eq!(first_time[6], "0.98");
        assert_eq!(first_time[8], "0.95");
        assert_eq!(first_time[9], "0.96");
        assert!(rows[2].cells[1..].iter().all(String::is_empty));
    }

    #[test]
    fn header_tables_line_up() {
        for (start, end) in MERGED_HEADERS {
            assert!(!MAIN_HEADERS[start].is_empty());
            assert!(end < COLUMN_COUNT);
            assert!(MAIN_HEADERS[start + 1..=end].iter().all(|h| h.is_empty()));
        }
    }
}
