//! Core domain types: the fixture record, its enrichment payloads, and the
//! identity-keyed record set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one scrape run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Identity helpers
// ---------------------------------------------------------------------------

/// The day prefix of a fixture identity: everything before the first ASCII
/// digit (`"周一001"` → `"周一"`). Sequential fallback ids have no prefix.
pub fn day_prefix(match_id: &str) -> &str {
    match match_id.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &match_id[..idx],
        None => match_id,
    }
}

// ---------------------------------------------------------------------------
// Enrichment payloads
// ---------------------------------------------------------------------------

/// A win/draw/lose value set as shown on the detail page (kept as text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsTriple {
    pub win: String,
    pub draw: String,
    pub lose: String,
}

impl OddsTriple {
    pub fn new(win: impl Into<String>, draw: impl Into<String>, lose: impl Into<String>) -> Self {
        Self {
            win: win.into(),
            draw: draw.into(),
            lose: lose.into(),
        }
    }
}

/// Fields extracted by one detail pass for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Enrichment {
    /// Asian handicap line with the two water (vig) values around it.
    AsianHandicap {
        line: String,
        home_water: String,
        away_water: String,
    },
    /// Kelly indices: the first clean value set, plus a second if present.
    Kelly {
        first: OddsTriple,
        second: Option<OddsTriple>,
    },
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One betting fixture as scraped from the base table.
///
/// Descriptive and primary odds fields are written once by the base extractor.
/// Enrichment fields start empty and are only touched through [`Record::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identity key, unique within a batch (e.g. `周一001`).
    pub match_id: String,

    pub league: String,
    pub round: String,
    pub match_time: String,
    pub status: String,
    pub home_team: String,
    pub home_rank: String,
    pub away_team: String,
    pub away_rank: String,
    pub halftime: String,

    /// Handicap line from the base table.
    pub handicap: String,
    pub win_odds: String,
    pub let_odds: String,
    /// Average European odds.
    pub avg_euro_odds: String,
    /// Remaining per-bookmaker odds columns, in table order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bookmaker_odds: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asian_handicap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_water: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_water: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kelly: Option<OddsTriple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kelly_second: Option<OddsTriple>,

    /// Asian handicap detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asian_url: Option<String>,
    /// European odds / Kelly detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euro_url: Option<String>,

    /// Synthesized because live extraction failed entirely.
    #[serde(default)]
    pub is_fallback: bool,
}

impl Record {
    /// A record with only its identity set.
    pub fn new(match_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            ..Default::default()
        }
    }

    /// Merge an enrichment payload into this record, overwriting whatever the
    /// same pass wrote before. Identity and base fields are never touched.
    pub fn apply(&mut self, enrichment: &Enrichment) {
        match enrichment {
            Enrichment::AsianHandicap {
                line,
                home_water,
                away_water,
            } => {
                self.asian_handicap = Some(line.clone());
                self.home_water = Some(home_water.clone());
                self.away_water = Some(away_water.clone());
            }
            Enrichment::Kelly { first, second } => {
                self.kelly = Some(first.clone());
                self.kelly_second = second.clone();
            }
        }
    }

    /// Whether any detail pass has written to this record.
    pub fn is_enriched(&self) -> bool {
        self.asian_handicap.is_some() || self.kelly.is_some()
    }

    /// Day prefix of this record's identity (see [`day_prefix`]).
    pub fn day_prefix(&self) -> &str {
        day_prefix(&self.match_id)
    }
}

// ---------------------------------------------------------------------------
// RecordSet
// ---------------------------------------------------------------------------

/// What [`RecordSet::upsert`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New identity, appended at this index.
    Inserted(usize),
    /// Known identity, replaced in place at this index.
    Replaced(usize),
}

/// Ordered records keyed by `match_id`. Insertion order is preserved and a
/// repeated identity replaces the existing entry instead of appending.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by identity.
    pub fn upsert(&mut self, record: Record) -> Upsert {
        if let Some(&idx) = self.index.get(&record.match_id) {
            self.records[idx] = record;
            Upsert::Replaced(idx)
        } else {
            let idx = self.records.len();
            self.index.insert(record.match_id.clone(), idx);
            self.records.push(record);
            Upsert::Inserted(idx)
        }
    }

    pub fn get(&self, match_id: &str) -> Option<&Record> {
        self.index.get(match_id).map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }

    /// True when the set is non-empty and every record is synthetic.
    pub fn is_all_fallback(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.is_fallback)
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.upsert(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn day_prefix_splits_at_first_digit() {
        assert_eq!(day_prefix("周一001"), "周一");
        assert_eq!(day_prefix("周日012"), "周日");
        assert_eq!(day_prefix("007"), "");
        assert_eq!(day_prefix("无编号"), "无编号");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut set = RecordSet::new();
        assert_eq!(set.upsert(Record::new("周一001")), Upsert::Inserted(0));
        assert_eq!(set.upsert(Record::new("周一002")), Upsert::Inserted(1));

        let mut updated = Record::new("周一001");
        updated.league = "英超".into();
        assert_eq!(set.upsert(updated), Upsert::Replaced(0));

        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].league, "英超");
        assert_eq!(set.as_slice()[1].match_id, "周一002");
    }

    #[test]
    fn upsert_never_duplicates_identity() {
        let ids = ["周一001", "周一002", "周一001", "周二003", "周一002", "周一001"];
        let set: RecordSet = ids.iter().map(|id| Record::new(*id)).collect();

        assert_eq!(set.len(), 3);
        let mut seen: Vec<&str> = set.iter().map(|r| r.match_id.as_str()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), set.len());
    }

    #[test]
    fn apply_touches_only_enrichment_fields() {
        let mut record = Record::new("周三005");
        record.home_team = "曼城".into();
        record.handicap = "-1".into();

        record.apply(&Enrichment::AsianHandicap {
            line: "半球/一球".into(),
            home_water: "0.92".into(),
            away_water: "0.96".into(),
        });
        record.apply(&Enrichment::Kelly {
            first: OddsTriple::new("0.91", "0.95", "0.97"),
            second: Some(OddsTriple::new("0.90", "0.96", "0.98")),
        });

        assert_eq!(record.match_id, "周三005");
        assert_eq!(record.home_team, "曼城");
        assert_eq!(record.handicap, "-1");
        assert_eq!(record.asian_handicap.as_deref(), Some("半球/一球"));
        assert_eq!(record.home_water.as_deref(), Some("0.92"));
        assert_eq!(record.kelly.as_ref().map(|k| k.draw.as_str()), Some("0.95"));
        assert!(record.kelly_second.is_some());
        assert!(record.is_enriched());
    }

    #[test]
    fn reapplying_overwrites_with_latest() {
        let mut record = Record::new("周三005");
        record.apply(&Enrichment::Kelly {
            first: OddsTriple::new("0.91", "0.95", "0.97"),
            second: Some(OddsTriple::new("0.90", "0.96", "0.98")),
        });
        record.apply(&Enrichment::Kelly {
            first: OddsTriple::new("0.88", "0.99", "1.01"),
            second: None,
        });

        assert_eq!(record.kelly, Some(OddsTriple::new("0.88", "0.99", "1.01")));
        assert_eq!(record.kelly_second, None);
    }

    #[test]
    fn all_fallback_detection() {
        let mut set = RecordSet::new();
        assert!(!set.is_all_fallback());

        let mut fake = Record::new("001");
        fake.is_fallback = true;
        set.upsert(fake);
        assert!(set.is_all_fallback());

        set.upsert(Record::new("周一001"));
        assert!(!set.is_all_fallback());
    }

    #[test]
    fn record_serialization_skips_empty_enrichment() {
        let record = Record::new("周一001");
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(!json.contains("kelly"));
        let parsed: Record = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, record);
    }
}
