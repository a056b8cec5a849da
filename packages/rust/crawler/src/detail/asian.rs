use oddsboard_shared::{EnrichOptions, Enrichment, Record};

use super::{DetailPass, has_trend_glyph, is_clean_numeric};
use crate::links::DetailKind;

/// Asian handicap line and waters from the handicap comparison page.
///
/// Values come in aligned sets of (home water, line, away water); the first
/// set whose waters are clean numbers and whose line is unmoved wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsianHandicapPass;

impl DetailPass for AsianHandicapPass {
    fn name(&self) -> &'static str {
        "asian_handicap"
    }

    fn kind(&self) -> DetailKind {
        DetailKind::Asian
    }

    fn detail_url<'a>(&self, record: &'a Record) -> Option<&'a str> {
        record.asian_url.as_deref()
    }

    fn marker<'a>(&self, opts: &'a EnrichOptions) -> &'a str {
        &opts.asian_bookmaker
    }

    fn from_values(&self, values: &[String]) -> Option<Enrichment> {
        values.chunks_exact(3).find_map(|set| {
            let (home, line, away) = (set[0].trim(), set[1].trim(), set[2].trim());
            let valid = is_clean_numeric(home)
                && is_clean_numeric(away)
                && !line.is_empty()
                && !has_trend_glyph(line);
            valid.then(|| Enrichment::AsianHandicap {
                line: line.to_string(),
                home_water: home.to_string(),
                away_water: away.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn load_fixture(name: &str) -> Html {
        let path = format!("../../../fixtures/html/{name}");
        let content =
            std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"));
        Html::parse_document(&content)
    }

    fn asian(line: &str, home: &str, away: &str) -> Enrichment {
        Enrichment::AsianHandicap {
            line: line.into(),
            home_water: home.into(),
            away_water: away.into(),
        }
    }

    #[test]
    fn skips_moved_set_for_untouched_one() {
        let doc = load_fixture("yazhi.html");
        assert_eq!(
            AsianHandicapPass.extract(&doc, "澳门"),
            Some(asian("半球", "0.88", "0.98"))
        );
    }

    #[test]
    fn first_clean_set_wins() {
        let doc = load_fixture("yazhi.html");
        assert_eq!(
            AsianHandicapPass.extract(&doc, "皇冠"),
            Some(asian("一球", "0.97", "0.87"))
        );
    }

    #[test]
    fn header_row_is_not_a_bookmaker() {
        let doc = load_fixture("yazhi.html");
        assert_eq!(AsianHandicapPass.extract(&doc, "公司"), None);
    }

    #[test]
    fn raw_payload_fallback() {
        let payload = serde_json::json!({"list": [["澳门", "0.86", "平手/半球", "1.00"]]});
        assert_eq!(
            AsianHandicapPass.extract_raw(&payload, "澳门"),
            Some(asian("平手/半球", "0.86", "1.00"))
        );
    }

    #[test]
    fn detail_url_reads_asian_link() {
        let mut record = Record::new("周一001");
        assert_eq!(AsianHandicapPass.detail_url(&record), None);
        record.asian_url = Some("https://odds.500.com/fenxi/yazhi-1.shtml".into());
        assert_eq!(
            AsianHandicapPass.detail_url(&record),
            Some("https://odds.500.com/fenxi/yazhi-1.shtml")
        );
    }
}
