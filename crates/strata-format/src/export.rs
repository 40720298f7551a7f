//! File export layout: one part file per fetched page.
//!
//! Exports land under `<storage>/<stream key>/data/part_NNN.<ext>`.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use strata_types::{Key, Record};

use crate::{FormatError, Formatter};

/// Returns the data directory for a stream under a storage root.
#[must_use]
pub fn data_dir(storage: &Path, key: &Key) -> PathBuf {
    storage.join(key.as_str()).join("data")
}

/// Returns the path of one part file.
#[must_use]
pub fn part_path(dir: &Path, index: usize, extension: &str) -> PathBuf {
    dir.join(format!("part_{index:03}.{extension}"))
}

/// Writes one page of records as a part file.
///
/// The data directory is created if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or
/// formatting fails.
pub fn write_part<F: Formatter>(
    storage: &Path,
    key: &Key,
    formatter: &F,
    index: usize,
    records: &[Record],
) -> Result<PathBuf, FormatError> {
    let dir = data_dir(storage, key);
    fs::create_dir_all(&dir)?;

    let path = part_path(&dir, index, formatter.extension());
    let file = File::create(&path)?;
    formatter.write_records(records, BufWriter::new(file))?;
    Ok(path)
}

/// Writes a sequence of pages as consecutive part files.
///
/// # Errors
///
/// Returns an error if any part fails to write.
pub fn write_parts<F, I>(
    storage: &Path,
    key: &Key,
    formatter: &F,
    pages: I,
) -> Result<Vec<PathBuf>, FormatError>
where
    F: Formatter,
    I: IntoIterator<Item = Vec<Record>>,
{
    let mut paths = Vec::new();
    for (index, page) in pages.into_iter().enumerate() {
        paths.push(write_part(storage, key, formatter, index, &page)?);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonFormatter;
    use tempfile::TempDir;

    fn record(value: u64) -> Record {
        let mut record = Record::new();
        record.insert("value".to_string(), serde_json::json!(value));
        record
    }

    #[test]
    fn test_part_layout() {
        let key = Key::from("28654971");
        let dir = data_dir(Path::new("/tmp/strata"), &key);
        assert_eq!(dir, Path::new("/tmp/strata/28654971/data"));
        assert_eq!(
            part_path(&dir, 7, "csv"),
            Path::new("/tmp/strata/28654971/data/part_007.csv")
        );
    }

    #[test]
    fn test_write_parts() {
        let storage = TempDir::new().unwrap();
        let key = Key::from("42");
        let formatter = JsonFormatter::ndjson();

        let paths = write_parts(
            storage.path(),
            &key,
            &formatter,
            vec![vec![record(1)], vec![record(2), record(3)]],
        )
        .unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("42/data/part_000.ndjson"));
        let second = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(second.lines().count(), 2);
    }
}
