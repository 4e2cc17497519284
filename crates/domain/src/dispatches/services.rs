use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    errors::Error,
    store::{SheetStore, Worksheet},
};

use super::{
    aggregate::{Dispatch, GuideNumber, Office},
    form,
    inputs::{FormState, GridRow},
    numbering, pdf, writer,
};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SaveOutcome {
    pub message: String,
    pub rows_written: usize,
    pub next_guide_number: GuideNumber,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct PdfOutcome {
    pub message: String,
    pub file: String,
}

/// What the form actions run against: the spreadsheet, the dispatch log
/// inside it, the catalog loaded at startup and the PDF output directory.
#[derive(Clone)]
pub struct Services {
    store: Arc<dyn SheetStore>,
    log: Worksheet,
    catalog: Arc<Catalog>,
    pdf_dir: PathBuf,
}

impl Services {
    pub fn new(
        store: Arc<dyn SheetStore>,
        log: Worksheet,
        catalog: Catalog,
        pdf_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            log,
            catalog: Arc::new(catalog),
            pdf_dir: pdf_dir.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pdf_dir(&self) -> &PathBuf {
        &self.pdf_dir
    }

    pub async fn next_guide_number(&self) -> GuideNumber {
        numbering::next_guide_number(self.store.as_ref(), &self.log).await
    }

    /// Fresh form: default office, next guide number, `today`, one blank row.
    pub async fn initial_form(&self, today: NaiveDate) -> FormState {
        FormState {
            office: Office::default(),
            guide_number: self.next_guide_number().await,
            date: today,
            rows: vec![GridRow::blank()],
        }
    }

    /// Appends the form's coded rows to the dispatch log.
    ///
    /// Only the next free guide number is accepted: a lower one was already
    /// used and a higher one would leave a gap. A form with no coded rows,
    /// or a guide number with no successor, is rejected as well.
    pub async fn save(&self, form: &FormState) -> Result<SaveOutcome, Error> {
        let next = self.next_guide_number().await;
        if form.guide_number != next {
            return Err(Error::StaleGuideNumber {
                submitted: form.guide_number.value(),
                next: next.value(),
            });
        }

        let dispatch = Dispatch::from_form(form, &self.catalog)?;
        if dispatch.lines.is_empty() {
            return Err(Error::validation("Dispatch has no lines with a product code"));
        }
        let following = dispatch
            .guide_number
            .next()
            .ok_or_else(|| Error::validation(format!("Guide numbers exhausted at {}", dispatch.guide_number)))?;

        let rows_written = writer::save_dispatch(self.store.as_ref(), &self.log, &dispatch).await?;

        Ok(SaveOutcome {
            message: form::SAVED_MESSAGE.to_string(),
            rows_written,
            next_guide_number: following,
        })
    }

    /// Renders the form's coded rows into a PDF in the output directory.
    pub async fn generate_pdf(&self, form: &FormState) -> Result<PdfOutcome, Error> {
        let dispatch = Dispatch::from_form(form, &self.catalog)?;
        let dir = self.pdf_dir.clone();

        let file = tokio::task::spawn_blocking(move || pdf::write(&dispatch, &dir))
            .await
            .map_err(|err| Error::Render {
                message: err.to_string(),
            })??;

        Ok(PdfOutcome {
            message: form::pdf_message(&file),
            file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dispatches::LOG_HEADER, store::MemorySheets};

    fn log() -> Worksheet {
        Worksheet::title("Despachos")
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn header() -> Vec<String> {
        LOG_HEADER.iter().map(|h| h.to_string()).collect()
    }

    fn services(store: Arc<MemorySheets>, dir: &std::path::Path) -> Services {
        let catalog: Catalog = [("TB-100".to_string(), "Talonario boletas".to_string())]
            .into_iter()
            .collect();
        Services::new(store, log(), catalog, dir)
    }

    fn form(guide: u64, rows: Vec<GridRow>) -> FormState {
        FormState {
            office: Office::Bulnes,
            guide_number: GuideNumber::new(guide).unwrap(),
            date: date(),
            rows,
        }
    }

    #[tokio::test]
    async fn initial_form_has_next_guide_and_blank_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = header();
        first[0] = "4".into();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header(), first]));

        let form = services(store, dir.path()).initial_form(date()).await;

        assert_eq!(form.guide_number.to_string(), "5");
        assert_eq!(form.office, Office::Bulnes);
        assert_eq!(form.rows, vec![GridRow::blank()]);
    }

    #[tokio::test]
    async fn save_persists_only_coded_rows_and_advances_guide() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header()]));
        let services = services(store.clone(), dir.path());

        let outcome = services
            .save(&form(
                1,
                vec![
                    GridRow::new("TB-100", "", "3", "1", "300"),
                    GridRow::blank(),
                    GridRow::new("", "huérfana", "9", "", ""),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Despacho guardado correctamente.");
        assert_eq!(outcome.rows_written, 1);
        assert_eq!(outcome.next_guide_number.to_string(), "2");

        let rows = store.rows(&log());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            vec!["1", "Bulnes", "2024-03-15", "TB-100", "Talonario boletas", "3", "1", "300"]
        );
        assert_eq!(services.next_guide_number().await.to_string(), "2");
    }

    #[tokio::test]
    async fn save_rejects_used_guide_number() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header()]));
        let services = services(store.clone(), dir.path());
        let submitted = form(1, vec![GridRow::new("TB-100", "", "1", "", "")]);

        services.save(&submitted).await.unwrap();
        let err = services.save(&submitted).await.unwrap_err();

        assert!(matches!(err, Error::StaleGuideNumber { submitted: 1, next: 2 }));
        assert_eq!(store.rows(&log()).len(), 2);
    }

    #[tokio::test]
    async fn save_rejects_guide_ahead_of_next() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header()]));
        let services = services(store.clone(), dir.path());

        let err = services
            .save(&form(2, vec![GridRow::new("TB-100", "", "1", "", "")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StaleGuideNumber { submitted: 2, next: 1 }));

        let err = services
            .save(&form(u64::MAX, vec![GridRow::new("TB-100", "", "1", "", "")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StaleGuideNumber { submitted: u64::MAX, next: 1 }));

        assert_eq!(store.rows(&log()).len(), 1);
    }

    #[tokio::test]
    async fn save_rejects_largest_guide_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut last = header();
        last[0] = (u64::MAX - 1).to_string();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header(), last]));
        let services = services(store.clone(), dir.path());

        assert_eq!(services.next_guide_number().await.value(), u64::MAX);
        let err = services
            .save(&form(u64::MAX, vec![GridRow::new("TB-100", "", "1", "", "")]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(store.rows(&log()).len(), 2);
    }

    #[tokio::test]
    async fn save_rejects_form_without_codes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header()]));

        let err = services(store.clone(), dir.path())
            .save(&form(1, vec![GridRow::blank()]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(store.rows(&log()).len(), 1);
    }

    #[tokio::test]
    async fn generate_pdf_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemorySheets::new().with_rows(log(), vec![header()]));

        let outcome = services(store, dir.path())
            .generate_pdf(&FormState {
                office: Office::SanCarlos,
                ..form(9, vec![GridRow::new("TB-100", "", "2", "10", "20"), GridRow::blank()])
            })
            .await
            .unwrap();

        assert_eq!(outcome.file, "Guia_9_Oficina_San_Carlos.pdf");
        assert_eq!(outcome.message, "PDF generado: Guia_9_Oficina_San_Carlos.pdf");
        assert!(dir.path().join(&outcome.file).exists());
    }
}
