//! JSON dump of a record batch.

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use oddsboard_shared::{OddsError, Record, Result};

#[derive(Serialize)]
struct Dump<'a> {
    source_url: &'a str,
    generated_at: String,
    count: usize,
    records: &'a [Record],
}

/// Write `records` as pretty JSON with a small provenance header.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_json(records: &[Record], source_url: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| OddsError::io(parent, e))?;
    }

    let dump = Dump {
        source_url,
        generated_at: chrono::Local::now().to_rfc3339(),
        count: records.len(),
        records,
    };
    let body = serde_json::to_string_pretty(&dump)
        .map_err(|e| OddsError::Export(format!("failed to serialize records: {e}")))?;
    std::fs::write(path, body).map_err(|e| OddsError::io(path, e))?;

    info!("json written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn dump_lists_records_in_order() {
        let dir = std::env::temp_dir().join(format!("oddsboard-json-{}", Uuid::now_v7()));
        let path = dir.join("records.json");
        let records = vec![Record::new("周一001"), Record::new("周一002")];

        write_json(&records, "https://live.500.com/", &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["records"][1]["match_id"], "周一002");
        assert!(value["records"][0].get("kelly").is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
