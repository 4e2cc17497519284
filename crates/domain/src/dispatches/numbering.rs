use crate::{
    errors::Error,
    store::{SheetStore, Worksheet},
};

use super::{aggregate::GuideNumber, writer::LOG_HEADER};

/// Next guide number: one past the last number in the log's first column.
///
/// An empty or header-only log starts at 1. Read failures, unparseable
/// cells and a last number with no successor also fall back to 1; the cause
/// is only logged.
pub async fn next_guide_number(store: &dyn SheetStore, log: &Worksheet) -> GuideNumber {
    match last_guide_number(store, log).await {
        Ok(Some(last)) => last.next().unwrap_or_else(|| {
            tracing::warn!("Guide numbers in {} exhausted after {}", log, last);
            GuideNumber::FIRST
        }),
        Ok(None) => GuideNumber::FIRST,
        Err(err) => {
            tracing::warn!("Could not read last guide number from {}: {}", log, err);
            GuideNumber::FIRST
        }
    }
}

async fn last_guide_number(
    store: &dyn SheetStore,
    log: &Worksheet,
) -> Result<Option<GuideNumber>, Error> {
    let values = store.column_values(log, 1).await?;

    let Some((index, last)) = values
        .iter()
        .enumerate()
        .rev()
        .find(|(_, value)| !value.trim().is_empty())
    else {
        return Ok(None);
    };

    if index == 0 && last.trim() == LOG_HEADER[0] {
        return Ok(None);
    }
    last.parse().map(Some)
}
