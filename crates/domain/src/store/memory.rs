use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use super::{SheetStore, Worksheet};
use crate::errors::Error;

/// Spreadsheet kept in process memory.
///
/// Serves as the store for tests and local runs without credentials. Reads
/// and appends can be made to fail to exercise the downgrade paths.
#[derive(Debug, Default)]
pub struct MemorySheets {
    sheets: Mutex<HashMap<Worksheet, Vec<Vec<String>>>>,
    fail_reads: bool,
    appends_before_failure: Option<usize>,
    appends: AtomicUsize,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, sheet: Worksheet, rows: Vec<Vec<String>>) -> Self {
        self.lock().insert(sheet, rows);
        self
    }

    /// Every read fails with a store error.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Appends succeed `count` times, then fail.
    pub fn failing_appends_after(mut self, count: usize) -> Self {
        self.appends_before_failure = Some(count);
        self
    }

    /// Snapshot of a worksheet's rows.
    pub fn rows(&self, sheet: &Worksheet) -> Vec<Vec<String>> {
        self.lock().get(sheet).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Worksheet, Vec<Vec<String>>>> {
        self.sheets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self, sheet: &Worksheet) -> Result<Vec<Vec<String>>, Error> {
        if self.fail_reads {
            return Err(Error::store(format!("{} is unreadable", sheet)));
        }
        self.lock()
            .get(sheet)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                entity: sheet.to_string(),
            })
    }
}

#[async_trait]
impl SheetStore for MemorySheets {
    async fn column_values(&self, sheet: &Worksheet, column: usize) -> Result<Vec<String>, Error> {
        let mut values: Vec<String> = self
            .read(sheet)?
            .iter()
            .map(|row| {
                column
                    .checked_sub(1)
                    .and_then(|i| row.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    async fn all_values(&self, sheet: &Worksheet) -> Result<Vec<Vec<String>>, Error> {
        self.read(sheet)
    }

    async fn append_row(&self, sheet: &Worksheet, row: Vec<String>) -> Result<(), Error> {
        let done = self.appends.fetch_add(1, Ordering::SeqCst);
        if self.appends_before_failure.is_some_and(|limit| done >= limit) {
            return Err(Error::store(format!("append to {} rejected", sheet)));
        }

        let mut sheets = self.lock();
        let rows = sheets.get_mut(sheet).ok_or_else(|| Error::NotFound {
            entity: sheet.to_string(),
        })?;
        rows.push(row);
        Ok(())
    }

    async fn ensure_worksheet(&self, title: &str, header: &[&str]) -> Result<bool, Error> {
        let mut sheets = self.lock();
        let key = Worksheet::title(title);
        if sheets.contains_key(&key) {
            return Ok(false);
        }
        sheets.insert(key, vec![header.iter().map(|h| h.to_string()).collect()]);
        Ok(true)
    }
}
