//! Reader for the tab-separated UniProt export
//!
//! Columns are matched by header name (`Entry`, `Entry Name`,
//! `Protein names`, `Organism`, `Sequence`, `EC number`, `InterPro`);
//! extra columns are ignored and missing ones read as empty. Files ending
//! in `.gz` are decompressed on the fly.

use crate::model::RawProteinRecord;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Records read from a table, with the number of rows that could not be parsed
#[derive(Debug, Default)]
pub struct TableRead {
    pub records: Vec<RawProteinRecord>,
    pub skipped: usize,
}

/// Read every record of a tab-separated table
pub fn read_records<R: Read>(reader: R) -> IngestResult<TableRead> {
    let mut table = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut read = TableRead::default();
    for (row, result) in table.deserialize::<RawProteinRecord>().enumerate() {
        match result {
            Ok(record) => read.records.push(record),
            Err(e) => {
                warn!("Skipping row {}: {}", row + 1, e);
                read.skipped += 1;
            }
        }
    }
    Ok(read)
}

/// Read a table from disk
pub fn read_file(path: impl AsRef<Path>) -> IngestResult<TableRead> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let read = if path.extension().is_some_and(|ext| ext == "gz") {
        read_records(MultiGzDecoder::new(BufReader::new(file)))?
    } else {
        read_records(BufReader::new(file))?
    };

    info!(
        "Read {} records from {:?} ({} skipped)",
        read.records.len(),
        path,
        read.skipped
    );
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const TABLE: &str = "Entry\tEntry Name\tProtein names\tOrganism\tSequence\tEC number\tInterPro\tReviewed\n\
P12345\tCYB_HUMAN\tCytochrome b (EC 7.1.1.8)\tHomo sapiens\tMTPMRK\t7.1.1.8\tIPR005797;IPR027387;\treviewed\n\
Q99999\tUNK_MOUSE\t\tMus musculus\tMK\t\t\treviewed\n";

    #[test]
    fn test_read_records() {
        let read = read_records(TABLE.as_bytes()).unwrap();
        assert_eq!(read.records.len(), 2);
        assert_eq!(read.skipped, 0);

        let first = &read.records[0];
        assert_eq!(first.id.as_deref(), Some("P12345"));
        assert_eq!(first.display_name.as_deref(), Some("CYB_HUMAN"));
        assert_eq!(first.interpro.as_deref(), Some("IPR005797;IPR027387;"));

        let second = &read.records[1];
        assert!(second.interpro.is_none());
        assert!(second.ec_numbers.is_none());
    }

    #[test]
    fn test_read_gzip_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("proteins.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(TABLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let read = read_file(&path).unwrap();
        assert_eq!(read.records.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_file("/nonexistent/proteins.tsv"),
            Err(IngestError::Open { .. })
        ));
    }
}
