//! Base extractor: listing page → ordered fixture records.
//!
//! Extraction never fails the run. Navigation errors, timeouts and pages with
//! no recognisable rows all produce the synthetic fallback batch, with the
//! reason carried on the [`Extraction`]. Only a fatal engine error escapes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use oddsboard_browser::{Browser, OpenOptions};
use oddsboard_shared::{Record, Result, ScrapeConfig};

use crate::links::DetailLinks;
use crate::strategies::{RawRow, StrategyRegistry};

/// Site fixture numbering: weekday + three digits (`周一001`).
pub static IDENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"周[一二三四五六日天]\d{3}").expect("identity regex"));

static RANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[【(（]\s*(\d+)\s*[\]】)）]").expect("rank regex"));

/// Readiness marker for the listing page. Absence is tolerated.
pub const BASE_READY_SELECTOR: &str = "table, .match-item, [data-matchnum]";

// Positional layout of a listing row. The identity sits in cell 0.
const COL_LEAGUE: usize = 1;
const COL_ROUND: usize = 2;
const COL_TIME: usize = 3;
const COL_STATUS: usize = 4;
const COL_HOME: usize = 5;
const COL_HANDICAP: usize = 6;
const COL_AWAY: usize = 7;
const COL_HALFTIME: usize = 8;
const COL_WIN: usize = 9;
const COL_LET: usize = 10;
const COL_AVG_EURO: usize = 11;
const COL_BOOKMAKERS: usize = 12;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// What the base extractor produced.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<Record>,
    /// Why live extraction failed; set iff `records` are synthetic.
    pub failure: Option<String>,
    /// Strategy that found the rows.
    pub strategy: Option<String>,
    pub page_title: String,
}

impl Extraction {
    fn fallback(count: usize, reason: String, page_title: String) -> Self {
        Self {
            records: fallback_records(count),
            failure: Some(reason),
            strategy: None,
            page_title,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.failure.is_some()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Load the listing page and extract its fixtures.
///
/// Returns `Err` only for fatal engine errors; everything else degrades to
/// [`fallback_records`].
#[instrument(skip_all, fields(url = %config.url, backend = browser.name()))]
pub async fn extract_base<B: Browser>(browser: &B, config: &ScrapeConfig) -> Result<Extraction> {
    let opts = OpenOptions {
        wait_for: Some(BASE_READY_SELECTOR.to_string()),
        ready_retries: config.enrich.ready_retries,
        settle: config.settle,
        timeout: config.timeout,
        allow_unready: true,
    };

    let page = match browser.open(&config.url, &opts).await {
        Ok(page) => page,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!(error = %e, "listing page failed, using fallback records");
            return Ok(Extraction::fallback(
                config.fallback_count,
                e.to_string(),
                String::new(),
            ));
        }
    };

    let registry = StrategyRegistry::new();
    let (records, strategy) = records_from_html(&page.html, &page.url, &registry);

    if records.is_empty() {
        warn!(title = %page.title, "no fixture rows found, using fallback records");
        return Ok(Extraction::fallback(
            config.fallback_count,
            format!("no fixture rows found on {}", config.url),
            page.title,
        ));
    }

    info!(
        count = records.len(),
        strategy = strategy.as_deref().unwrap_or("-"),
        "extracted fixtures"
    );

    Ok(Extraction {
        records,
        failure: None,
        strategy,
        page_title: page.title,
    })
}

/// Pure extraction over captured HTML. Duplicate identities keep the first row.
pub fn records_from_html(
    html: &str,
    page_url: &str,
    registry: &StrategyRegistry,
) -> (Vec<Record>, Option<String>) {
    let doc = scraper::Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let Some((strategy, rows)) = registry.select(&doc, |row| identity_of(row).is_some()) else {
        return (Vec::new(), None);
    };
    debug!(strategy, rows = rows.len(), "row strategy matched");

    let mut seen = HashSet::new();
    let records = rows
        .iter()
        .filter_map(|row| {
            let id = identity_of(row)?;
            if !seen.insert(id.clone()) {
                debug!(match_id = %id, "duplicate identity skipped");
                return None;
            }
            Some(record_from_row(row, id, base.as_ref()))
        })
        .collect();

    (records, Some(strategy.to_string()))
}

// ---------------------------------------------------------------------------
// Row interpretation
// ---------------------------------------------------------------------------

/// The fixture identity of a row: the `data-matchnum` attribute when it holds
/// a token, otherwise the first token found in the cells.
pub fn identity_of(row: &RawRow) -> Option<String> {
    if let Some(m) = row.attr("data-matchnum").and_then(|v| IDENTITY.find(v)) {
        return Some(m.as_str().to_string());
    }
    row.cells
        .iter()
        .find_map(|cell| IDENTITY.find(cell))
        .map(|m| m.as_str().to_string())
}

/// Interpret a row positionally. Missing cells become empty strings.
pub fn record_from_row(row: &RawRow, match_id: String, base: Option<&Url>) -> Record {
    let (home_team, home_rank) = split_rank(row.cell(COL_HOME));
    let (away_team, away_rank) = split_rank(row.cell(COL_AWAY));
    let links = DetailLinks::from_hrefs(&row.links, base);

    // Single-cell rows (text scan) carry nothing but the identity.
    let has_layout = row.cells.len() > 1;
    let field = |idx: usize| {
        if has_layout {
            row.cell(idx).to_string()
        } else {
            String::new()
        }
    };

    Record {
        match_id,
        league: field(COL_LEAGUE),
        round: field(COL_ROUND),
        match_time: field(COL_TIME),
        status: field(COL_STATUS),
        home_team: if has_layout { home_team } else { String::new() },
        home_rank: if has_layout { home_rank } else { String::new() },
        away_team: if has_layout { away_team } else { String::new() },
        away_rank: if has_layout { away_rank } else { String::new() },
        halftime: field(COL_HALFTIME),
        handicap: field(COL_HANDICAP),
        win_odds: field(COL_WIN),
        let_odds: field(COL_LET),
        avg_euro_odds: field(COL_AVG_EURO),
        bookmaker_odds: bookmaker_columns(&row.cells),
        asian_url: links.asian,
        euro_url: links.european,
        ..Default::default()
    }
}

/// Cells past the fixed layout, without trailing blanks.
fn bookmaker_columns(cells: &[String]) -> Vec<String> {
    let tail = cells.get(COL_BOOKMAKERS..).unwrap_or_default();
    let len = tail.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    tail[..len].to_vec()
}

/// Split `"[3]曼城"` / `"阿森纳[5]"` into team name and rank.
pub fn split_rank(cell: &str) -> (String, String) {
    match RANK.captures(cell) {
        Some(caps) => {
            let rank = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let team = RANK.replace(cell, "");
            (team.trim().to_string(), rank.to_string())
        }
        None => (cell.trim().to_string(), String::new()),
    }
}

/// `n` synthetic records: ids `001..n`, placeholder league and team names.
pub fn fallback_records(n: usize) -> Vec<Record> {
    (1..=n)
        .map(|i| Record {
            match_id: format!("{i:03}"),
            league: format!("竞彩联赛{i}"),
            home_team: format!("主队{i}"),
            away_team: format!("客队{i}"),
            match_time: "14:00".to_string(),
            is_fallback: true,
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddsboard_browser::MemoryBrowser;

    const LIVE_URL: &str = "https://live.500.com/";

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig {
            url: LIVE_URL.to_string(),
            fallback_count: 15,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Pure extraction
    // -----------------------------------------------------------------------

    #[test]
    fn fixture_attribute_rows_win() {
        let registry = StrategyRegistry::new();
        let (records, strategy) =
            records_from_html(&load_fixture("live_table.html"), LIVE_URL, &registry);

        assert_eq!(strategy.as_deref(), Some("fixture-attribute"));
        let ids: Vec<&str> = records.iter().map(|r| r.match_id.as_str()).collect();
        assert_eq!(ids, ["周一001", "周一002", "周二003"]);
    }

    #[test]
    fn positional_fields_are_mapped() {
        let registry = StrategyRegistry::new();
        let (records, _) = records_from_html(&load_fixture("live_table.html"), LIVE_URL, &registry);
        let first = &records[0];

        assert_eq!(first.league, "英超");
        assert_eq!(first.round, "第10轮");
        assert_eq!(first.match_time, "10-20 03:00");
        assert_eq!(first.home_team, "曼城");
        assert_eq!(first.home_rank, "3");
        assert_eq!(first.away_team, "阿森纳");
        assert_eq!(first.away_rank, "5");
        assert_eq!(first.handicap, "-1");
        assert_eq!(first.win_odds, "1.85");
        assert_eq!(first.let_odds, "3.40");
        assert_eq!(first.avg_euro_odds, "1.90");
        // The link cell is navigation, not a bookmaker column.
        assert_eq!(first.bookmaker_odds, ["1.88", "1.92"]);
        assert!(!first.is_fallback);
        assert!(!first.is_enriched());
    }

    #[test]
    fn trailing_blank_bookmaker_cells_are_dropped() {
        let registry = StrategyRegistry::new();
        let (records, _) = records_from_html(&load_fixture("live_table.html"), LIVE_URL, &registry);
        assert_eq!(records[2].match_id, "周二003");
        assert_eq!(records[2].bookmaker_odds, ["1.18", "1.25"]);

        let short = vec!["x".to_string(); 5];
        assert!(bookmaker_columns(&short).is_empty());
    }

    #[test]
    fn detail_links_are_resolved_and_synthesized() {
        let registry = StrategyRegistry::new();
        let (records, _) = records_from_html(&load_fixture("live_table.html"), LIVE_URL, &registry);

        assert_eq!(
            records[0].asian_url.as_deref(),
            Some("https://odds.500.com/fenxi/yazhi-1120001.shtml")
        );
        assert_eq!(
            records[0].euro_url.as_deref(),
            Some("https://odds.500.com/fenxi/ouzhi-1120001.shtml")
        );
        // Only the analysis link is present; siblings come from substitution.
        assert_eq!(
            records[1].euro_url.as_deref(),
            Some("https://live.500.com/fenxi/ouzhi-1120002.shtml")
        );
        assert!(records[2].asian_url.is_none());
        assert!(records[2].euro_url.is_none());
    }

    #[test]
    fn plain_rows_without_links() {
        let registry = StrategyRegistry::new();
        let (records, strategy) =
            records_from_html(&load_fixture("live_plain_rows.html"), LIVE_URL, &registry);

        assert_eq!(strategy.as_deref(), Some("tbody-rows"));
        assert_eq!(records.len(), 3);
        for record in &records {
            assert!(!record.is_fallback);
            assert!(record.asian_url.is_none() && record.euro_url.is_none());
            assert!(record.asian_handicap.is_none() && record.kelly.is_none());
        }
    }

    #[test]
    fn rows_without_identity_are_skipped() {
        let html = r#"<table><tbody>
            <tr><td>广告</td><td>加奖</td></tr>
            <tr><td>周四001</td><td>日职</td></tr>
            <tr><td>-</td><td>-</td></tr>
        </tbody></table>"#;
        let (records, _) = records_from_html(html, LIVE_URL, &StrategyRegistry::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].match_id, "周四001");
        assert_eq!(records[0].league, "日职");
        assert_eq!(records[0].home_team, "");
    }

    #[test]
    fn duplicate_identities_collapse() {
        let html = r#"<table><tbody>
            <tr><td>周五001</td><td>英冠</td></tr>
            <tr><td>周五001</td><td>英甲</td></tr>
        </tbody></table>"#;
        let (records, _) = records_from_html(html, LIVE_URL, &StrategyRegistry::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].league, "英冠");
    }

    #[test]
    fn text_scan_is_last_resort() {
        let html = "<html><body><div>今日焦点 周六001 对阵 周六002，另见 周六001</div></body></html>";
        let (records, strategy) = records_from_html(html, LIVE_URL, &StrategyRegistry::new());
        assert_eq!(strategy.as_deref(), Some("text-scan"));
        let ids: Vec<&str> = records.iter().map(|r| r.match_id.as_str()).collect();
        assert_eq!(ids, ["周六001", "周六002"]);
        assert!(records.iter().all(|r| r.league.is_empty()));
    }

    #[test]
    fn split_rank_handles_both_sides() {
        let pair = |team: &str, rank: &str| (team.to_string(), rank.to_string());
        assert_eq!(split_rank("[3]曼城"), pair("曼城", "3"));
        assert_eq!(split_rank("阿森纳[5]"), pair("阿森纳", "5"));
        assert_eq!(split_rank("拜仁（1）"), pair("拜仁", "1"));
        assert_eq!(split_rank("国米"), pair("国米", ""));
    }

    #[test]
    fn fallback_records_are_sequential() {
        let records = fallback_records(3);
        let ids: Vec<&str> = records.iter().map(|r| r.match_id.as_str()).collect();
        assert_eq!(ids, ["001", "002", "003"]);
        assert_eq!(records[1].league, "竞彩联赛2");
        assert_eq!(records[1].home_team, "主队2");
        assert_eq!(records[1].away_team, "客队2");
        assert_eq!(records[1].match_time, "14:00");
        assert!(records.iter().all(|r| r.is_fallback));
    }

    // -----------------------------------------------------------------------
    // extract_base
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn extract_base_reads_live_page() {
        let browser = MemoryBrowser::new().with_page(LIVE_URL, load_fixture("live_table.html"));
        let extraction = extract_base(&browser, &config()).await.unwrap();

        assert!(!extraction.is_fallback());
        assert_eq!(extraction.records.len(), 3);
        assert_eq!(extraction.page_title, "竞彩足球比分直播_500彩票网");
        assert_eq!(extraction.strategy.as_deref(), Some("fixture-attribute"));
    }

    #[tokio::test]
    async fn zero_rows_yield_fallback_batch() {
        let browser = MemoryBrowser::new().with_page(LIVE_URL, load_fixture("no_rows.html"));
        let extraction = extract_base(&browser, &config()).await.unwrap();

        assert!(extraction.is_fallback());
        assert_eq!(extraction.records.len(), 15);
        assert!(extraction.records.iter().all(|r| r.is_fallback));
        assert!(extraction.failure.unwrap().contains("no fixture rows"));
    }

    #[tokio::test]
    async fn navigation_failure_yields_fallback_batch() {
        let browser = MemoryBrowser::new();
        let cfg = ScrapeConfig {
            fallback_count: 4,
            ..config()
        };
        let extraction = extract_base(&browser, &cfg).await.unwrap();

        assert_eq!(extraction.records.len(), 4);
        assert!(extraction.records.iter().all(|r| r.is_fallback));
        assert!(extraction.failure.unwrap().contains("404"));
    }
}
