//! Pure record-set transforms applied between extraction and enrichment.

use oddsboard_shared::Record;

/// Keep the records that share the day prefix of the first non-fallback
/// record (`周一001` → `周一`). Order is preserved. A batch with no real record
/// is returned unchanged.
pub fn same_day_filter(records: Vec<Record>) -> Vec<Record> {
    let Some(day) = records
        .iter()
        .find(|r| !r.is_fallback)
        .map(|r| r.day_prefix().to_string())
    else {
        return records;
    };

    records
        .into_iter()
        .filter(|r| r.day_prefix() == day)
        .collect()
}

/// Keep at most `max` records from the front; `0` means unlimited.
pub fn truncate(mut records: Vec<Record>, max: usize) -> Vec<Record> {
    if max > 0 {
        records.truncate(max);
    }
    records
}
