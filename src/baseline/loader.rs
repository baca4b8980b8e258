//! Baseline CSV loading

use super::row::BaselineRow;
use super::BaselineTable;
use crate::error::{EstimateError, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load the baseline table from a CSV file with a header row
pub fn load_baseline<P: AsRef<Path>>(path: P) -> Result<BaselineTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| EstimateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_baseline(file)?;
    tracing::debug!(
        "loaded {} baseline rows from {}",
        table.rows.len(),
        path.display()
    );
    Ok(table)
}

/// Parse a baseline table from any CSV source
pub fn read_baseline<R: Read>(source: R) -> Result<BaselineTable> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(EstimateError::EmptyCsv);
    }
    if !headers.iter().any(|h| h == "chip") {
        return Err(EstimateError::MissingColumn("chip"));
    }

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        // Short records leave trailing columns missing
        let row = BaselineRow::from_cells(headers.iter().zip(record.iter()));
        tracing::debug!(
            "row '{}': prefill buckets {:?}, decode buckets {:?}",
            row.chip,
            row.prefill.keys().collect::<Vec<_>>(),
            row.decode.keys().collect::<Vec<_>>()
        );
        rows.push(row);
    }

    Ok(BaselineTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::ColumnValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "chip,prefill_ttft_5s,decode_tpot_20ms,seq_len_in,seq_len_out").unwrap();
        writeln!(file, "h100, 100 ,50,512,128").unwrap();

        let table = load_baseline(file.path()).expect("load CSV");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].prefill.get(&5), Some(&ColumnValue::Parsed(100.0)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_baseline("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, EstimateError::Io { .. }));
    }

    #[test]
    fn test_empty_csv() {
        let err = read_baseline("chip,prefill_ttft_5s\n".as_bytes()).unwrap_err();
        assert!(matches!(err, EstimateError::EmptyCsv));

        let err = read_baseline("".as_bytes()).unwrap_err();
        assert!(matches!(err, EstimateError::EmptyCsv));
    }

    #[test]
    fn test_missing_chip_column() {
        let err = read_baseline("name,prefill_ttft_5s\nh100,100\n".as_bytes()).unwrap_err();
        assert!(matches!(err, EstimateError::MissingColumn("chip")));
    }

    #[test]
    fn test_short_record() {
        let table = read_baseline("chip,prefill_ttft_5s,decode_tpot_20ms\nh100,100\n".as_bytes())
            .expect("flexible records");
        assert_eq!(table.rows[0].buckets(crate::baseline::Phase::Decode), Vec::<u32>::new());
    }
}
