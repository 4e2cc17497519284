use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::aggregate::{GuideNumber, Office};

/// One editable row of the form grid, exactly as the client holds it
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct GridRow {
    #[serde(rename = "codigo", default, deserialize_with = "cell")]
    pub code: String,
    #[serde(rename = "descripcion", default, deserialize_with = "cell")]
    pub description: String,
    #[serde(rename = "cantidad", default, deserialize_with = "cell")]
    pub quantity: String,
    #[serde(rename = "folio_inicial", default, deserialize_with = "cell")]
    pub folio_start: String,
    #[serde(rename = "folio_final", default, deserialize_with = "cell")]
    pub folio_end: String,
}

impl GridRow {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        quantity: impl Into<String>,
        folio_start: impl Into<String>,
        folio_end: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            quantity: quantity.into(),
            folio_start: folio_start.into(),
            folio_end: folio_end.into(),
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn has_code(&self) -> bool {
        !self.code.trim().is_empty()
    }
}

/// Grid cells accept strings, numbers or null.
fn cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Everything visible on the form
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct FormState {
    pub office: Office,
    pub guide_number: GuideNumber,
    pub date: NaiveDate,
    #[serde(default)]
    pub rows: Vec<GridRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RowsInput {
    #[serde(default)]
    pub rows: Vec<GridRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveRowInput {
    #[serde(default)]
    pub rows: Vec<GridRow>,
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_row_accepts_numeric_and_missing_cells() {
        let row: GridRow =
            serde_json::from_str(r#"{"codigo": "TB-100", "cantidad": 4, "folio_inicial": null}"#).unwrap();

        assert_eq!(row, GridRow::new("TB-100", "", "4", "", ""));
    }

    #[test]
    fn form_state_reads_client_payload() {
        let form: FormState = serde_json::from_str(
            r#"{
                "office": "San Carlos",
                "guide_number": "8",
                "date": "2024-03-15",
                "rows": [{"codigo": "", "descripcion": "", "cantidad": "", "folio_inicial": "", "folio_final": ""}]
            }"#,
        )
        .unwrap();

        assert_eq!(form.office, Office::SanCarlos);
        assert_eq!(form.guide_number.value(), 8);
        assert_eq!(form.rows, vec![GridRow::blank()]);
    }

    #[test]
    fn whitespace_code_counts_as_empty() {
        assert!(!GridRow::new(" ", "x", "", "", "").has_code());
        assert!(GridRow::new("A", "", "", "", "").has_code());
    }
}
