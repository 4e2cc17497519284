use std::{collections::HashMap, fmt};

use async_trait::async_trait;

use crate::errors::Error;

/// In-memory store
pub mod memory;

pub use memory::MemorySheets;

/// A worksheet inside the spreadsheet, addressed either by its numeric
/// sheet id or by its tab title.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Worksheet {
    Id(i64),
    Title(String),
}

impl Worksheet {
    pub fn title(title: impl Into<String>) -> Self {
        Self::Title(title.into())
    }
}

impl fmt::Display for Worksheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Worksheet::Id(id) => write!(f, "sheet #{}", id),
            Worksheet::Title(title) => write!(f, "sheet '{}'", title),
        }
    }
}

/// Read-all / append-row access to a spreadsheet.
///
/// Cells are exchanged as display strings. Columns are 1-based.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Values of one column, top to bottom. Trailing empty cells are dropped.
    async fn column_values(&self, sheet: &Worksheet, column: usize) -> Result<Vec<String>, Error>;

    /// Every non-empty row of the worksheet, header row included.
    async fn all_values(&self, sheet: &Worksheet) -> Result<Vec<Vec<String>>, Error>;

    async fn append_row(&self, sheet: &Worksheet, row: Vec<String>) -> Result<(), Error>;

    /// Creates the worksheet with `header` as its first row unless a
    /// worksheet with that title already exists. Returns whether it was created.
    async fn ensure_worksheet(&self, title: &str, header: &[&str]) -> Result<bool, Error>;
}

/// Header-keyed records: the first row names the columns, each following
/// row becomes one record. Short rows are padded with empty strings.
pub fn records(values: &[Vec<String>]) -> Vec<HashMap<String, String>> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}
