//! Delimited-text loading into an [`InMemoryDataset`].

use crate::dataset::InMemoryDataset;
use crate::error::{Error, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// How to read a delimited text file.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// First row holds column names. Without it columns are named by index.
    pub has_header: bool,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
        }
    }
}

/// Loads a local CSV file. Every cell must parse as a number.
///
/// ```no_run
/// use smarty::dataset::{load_csv, CsvOptions};
///
/// let ds = load_csv("data/houses.csv", &CsvOptions::default())
///     .unwrap()
///     .with_target(&["price"])
///     .unwrap();
/// ```
pub fn load_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<InMemoryDataset> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file), options)
}

/// Reads CSV data from any reader. See [`load_csv`].
pub fn read_csv<R: Read>(reader: R, options: &CsvOptions) -> Result<InMemoryDataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let header: Option<Vec<String>> = if options.has_header {
        Some(rdr.headers()?.iter().map(str::to_string).collect())
    } else {
        None
    };

    let mut rows = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .enumerate()
            .map(|(column, cell)| {
                cell.parse::<f64>().map_err(|_| Error::Parse {
                    row,
                    column,
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }

    let dataset = InMemoryDataset::from_rows(rows)?;
    match header {
        Some(names) => dataset.with_columns(names),
        None => Ok(dataset),
    }
}
