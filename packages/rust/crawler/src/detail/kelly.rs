use oddsboard_shared::{EnrichOptions, Enrichment, OddsTriple, Record};

use super::{DetailPass, is_clean_numeric};
use crate::links::DetailKind;

/// Kelly indices from the European odds page.
///
/// Values come in aligned sets of three (win/draw/lose). The first clean set
/// is the opening snapshot and the next clean set, if any, the second one. A
/// set with any moved or non-numeric member is passed over.
#[derive(Debug, Clone, Copy, Default)]
pub struct KellyPass;

/// Every clean aligned triple in `values`, in order.
pub fn clean_triples(values: &[String]) -> Vec<OddsTriple> {
    values
        .chunks_exact(3)
        .filter(|set| set.iter().all(|v| is_clean_numeric(v)))
        .map(|set| OddsTriple::new(set[0].trim(), set[1].trim(), set[2].trim()))
        .collect()
}

impl DetailPass for KellyPass {
    fn name(&self) -> &'static str {
        "kelly"
    }

    fn kind(&self) -> DetailKind {
        DetailKind::European
    }

    fn detail_url<'a>(&self, record: &'a Record) -> Option<&'a str> {
        record.euro_url.as_deref()
    }

    fn marker<'a>(&self, opts: &'a EnrichOptions) -> &'a str {
        &opts.kelly_bookmaker
    }

    fn from_values(&self, values: &[String]) -> Option<Enrichment> {
        let mut triples = clean_triples(values).into_iter();
        let first = triples.next()?;
        Some(Enrichment::Kelly {
            first,
            second: triples.next(),
        })
    }
}
