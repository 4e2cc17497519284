use crate::{
    errors::Error,
    store::{SheetStore, Worksheet},
};

use super::aggregate::Dispatch;

pub const LOG_HEADER: [&str; 8] = [
    "N° Guía",
    "Oficina",
    "Fecha",
    "Código",
    "Descripción",
    "Cantidad",
    "Folio Inicial",
    "Folio Final",
];

/// Creates the dispatch log with its header row if it does not exist yet.
pub async fn ensure_log(store: &dyn SheetStore, title: &str) -> Result<(), Error> {
    if store.ensure_worksheet(title, &LOG_HEADER).await? {
        tracing::info!("Created dispatch log '{}'", title);
    }
    Ok(())
}

/// Appends one row per line to the log and returns how many were written.
///
/// Rows are appended one by one. The first failure stops the loop; rows
/// already appended stay in the log.
pub async fn save_dispatch(
    store: &dyn SheetStore,
    log: &Worksheet,
    dispatch: &Dispatch,
) -> Result<usize, Error> {
    let rows = dispatch.log_rows();
    let total = rows.len();

    for (written, row) in rows.into_iter().enumerate() {
        if let Err(err) = store.append_row(log, row).await {
            tracing::error!(
                "Guide {} half written: {} of {} rows appended",
                dispatch.guide_number,
                written,
                total
            );
            return Err(Error::PartialWrite {
                written,
                total,
                source: Box::new(err),
            });
        }
    }

    tracing::info!(
        "Saved guide {} for {} ({} rows)",
        dispatch.guide_number,
        dispatch.office,
        total
    );
    Ok(total)
}
