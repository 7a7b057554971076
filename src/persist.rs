use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExtractError;
use crate::model::Record;

/// Writes the record array as pretty-printed JSON. `save_records`
/// followed by `load_records` reproduces an equal ordered sequence.
pub fn save_records(path: &Path, records: &[Record]) -> Result<(), ExtractError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn load_records(path: &Path) -> Result<Vec<Record>, ExtractError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Bootstrap rule: the persisted document when one exists, the
/// built-in sample otherwise. A present-but-malformed document is an
/// error, so "failed to read" stays distinguishable from "no data
/// yet".
pub fn load_or_sample(path: &Path) -> Result<Vec<Record>, ExtractError> {
    if path.exists() {
        load_records(path)
    } else {
        Ok(sample_records())
    }
}

#[must_use]
pub fn sample_records() -> Vec<Record> {
    fn record(roll: &str, app: &str, name: &str, branch: &str, section: &str) -> Record {
        Record {
            roll_no: roll.to_string(),
            application_no: app.to_string(),
            candidate_name: name.to_string(),
            branch: branch.to_string(),
            section: section.to_string(),
        }
    }

    vec![
        record("24/A01/001", "240310038495", "AADIT MOGHA", "CS", "Sec-1"),
        record("24/A01/005", "OIA240000233", "AADYANH GUPTA", "CS", "Sec-1"),
        record("24/A01/009", "INT202400993", "Aashi Gupta", "CS", "Sec-1"),
        record("24/A01/044", "240311071488", "AMBESH KUMAR", "CS", "Sec-1"),
    ]
}
