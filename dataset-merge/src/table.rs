//! In-memory string table read from and written to CSV.
//!
//! Cells stay as text so values pass through the merge untouched; only the
//! columns feeding the SNR proxy are parsed.

use std::path::Path;

use crate::error::{MergeError, MergeResult};

/// Cell values read as missing
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Label used in error messages (usually the source path)
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a CSV file with a header row. Rows of the wrong width are fatal.
    pub fn read_csv(path: &Path) -> MergeResult<Self> {
        let read_err = |source| MergeError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Self::new(path.display().to_string(), headers);
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(
            "Read {} rows x {} columns from {}",
            table.row_count(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> MergeResult<()> {
        let write_err = |source| MergeError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
        writer.write_record(&self.headers).map_err(write_err)?;
        for row in self.rows() {
            writer.write_record(row).map_err(write_err)?;
        }
        writer.flush().map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Parse a column as numbers, missing cells as `None`.
    ///
    /// Returns `Ok(None)` when the column does not exist at all.
    pub fn numeric_column(&self, name: &str) -> MergeResult<Option<Vec<Option<f64>>>> {
        let Some(index) = self.column_index(name) else {
            return Ok(None);
        };

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = cells[index].trim();
                if MISSING_TOKENS.iter().any(|token| *token == cell) {
                    return Ok(None);
                }
                cell.parse::<f64>().map(Some).map_err(|_| MergeError::InvalidNumber {
                    table: self.name.clone(),
                    // 1-based, header is line 1
                    row: row + 2,
                    column: name.to_string(),
                    value: cells[index].clone(),
                })
            })
            .collect::<MergeResult<Vec<_>>>()
            .map(Some)
    }

    /// Like [`Table::numeric_column`] but the column must exist
    pub fn required_numeric_column(&self, name: &str) -> MergeResult<Vec<Option<f64>>> {
        self.numeric_column(name)?.ok_or_else(|| MergeError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Replace the column if it exists, otherwise append it
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Rename columns by `(from, to)` pairs; absent sources are skipped
    pub fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for header in self.headers.iter_mut() {
            if let Some((_, to)) = mapping.iter().find(|(from, _)| *from == header.as_str()) {
                *header = to.to_string();
            }
        }
    }

    /// Fail on the first header that occurs twice
    pub fn ensure_unique_columns(&self) -> MergeResult<()> {
        for (index, header) in self.headers.iter().enumerate() {
            if self.headers[..index].contains(header) {
                return Err(MergeError::DuplicateColumn {
                    table: self.name.clone(),
                    column: header.clone(),
                });
            }
        }
        Ok(())
    }

    /// Stack `second` under `first`.
    ///
    /// Columns are the union: all of `first` in order, then columns only
    /// `second` has. Cells a table has no column for are left empty.
    pub fn concat(first: Table, second: Table) -> Table {
        let mut headers = first.headers.clone();
        for header in &second.headers {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }

        let name = format!("{} + {}", first.name, second.name);
        let mut merged = Table::new(name, headers);
        merged.rows.reserve(first.rows.len() + second.rows.len());

        for source in [first, second] {
            let positions: Vec<Option<usize>> = merged
                .headers
                .iter()
                .map(|h| source.column_index(h))
                .collect();

            for row in source.rows {
                let aligned = positions
                    .iter()
                    .map(|pos| pos.map(|i| row[i].clone()).unwrap_or_default())
                    .collect();
                merged.rows.push(aligned);
            }
        }

        merged
    }
}
