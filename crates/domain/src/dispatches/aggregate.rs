use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use derive_new::new;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{catalog::Catalog, errors::Error};

use super::inputs::{FormState, GridRow};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Offices a dispatch can be issued from
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Office {
    #[default]
    Bulnes,
    Chillan,
    #[serde(rename = "San Carlos")]
    SanCarlos,
}

impl Office {
    pub const ALL: [Office; 3] = [Office::Bulnes, Office::Chillan, Office::SanCarlos];

    pub fn name(&self) -> &'static str {
        match self {
            Office::Bulnes => "Bulnes",
            Office::Chillan => "Chillan",
            Office::SanCarlos => "San Carlos",
        }
    }

    /// Name as used in file names: spaces become underscores.
    pub fn file_label(&self) -> String {
        self.name().replace(' ', "_")
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Office {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Office::ALL
            .into_iter()
            .find(|office| office.name() == s.trim())
            .ok_or_else(|| Error::validation(format!("Unknown office: {}", s)))
    }
}

/// Sequential guide number. Starts at 1; persisted and shown as a decimal string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GuideNumber(u64);

impl GuideNumber {
    pub const FIRST: GuideNumber = GuideNumber(1);

    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The following guide number, or `None` once the range is exhausted.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl Default for GuideNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for GuideNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GuideNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(GuideNumber::new)
            .ok_or_else(|| Error::validation(format!("Invalid guide number: {:?}", s)))
    }
}

impl Serialize for GuideNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GuideNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(GuideNumber::new)
                .ok_or_else(|| de::Error::custom(format!("invalid guide number: {}", n))),
            serde_json::Value::String(s) => s.parse().map_err(de::Error::custom),
            other => Err(de::Error::custom(format!("invalid guide number: {}", other))),
        }
    }
}

/// One line of a dispatch
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct DispatchLine {
    pub code: String,
    pub description: String,
    pub quantity: Option<u32>,
    pub folio_start: String,
    pub folio_end: String,
}

impl DispatchLine {
    /// Builds a line from a grid row. A blank description is filled in from
    /// the catalog when the code is known.
    pub fn from_row(row: &GridRow, catalog: &Catalog) -> Result<Self, Error> {
        let code = row.code.trim().to_string();
        let description = match row.description.trim() {
            "" => catalog.description(&code).unwrap_or_default().to_string(),
            given => given.to_string(),
        };

        Ok(Self {
            quantity: parse_quantity(&row.quantity)?,
            description,
            folio_start: row.folio_start.trim().to_string(),
            folio_end: row.folio_end.trim().to_string(),
            code,
        })
    }

    /// Cells in table column order: code, description, quantity, folio start, folio end.
    pub fn cells(&self) -> [String; 5] {
        [
            self.code.clone(),
            self.description.clone(),
            self.quantity.map(|q| q.to_string()).unwrap_or_default(),
            self.folio_start.clone(),
            self.folio_end.clone(),
        ]
    }
}

fn parse_quantity(raw: &str) -> Result<Option<u32>, Error> {
    let cell = raw.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    if let Ok(quantity) = cell.parse::<u32>() {
        return Ok(Some(quantity));
    }
    // Numeric grid cells may arrive as "3.0"
    match cell.parse::<f64>() {
        Ok(q) if q.fract() == 0.0 && q >= 0.0 && q <= u32::MAX as f64 => Ok(Some(q as u32)),
        _ => Err(Error::validation(format!("Invalid quantity: {:?}", raw))),
    }
}

/// A dispatch note: created in memory from the form, appended to the log,
/// never updated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct Dispatch {
    pub guide_number: GuideNumber,
    pub office: Office,
    pub date: NaiveDate,
    pub lines: Vec<DispatchLine>,
}

impl Dispatch {
    /// Takes the form as shown. Rows without a product code are dropped.
    pub fn from_form(form: &FormState, catalog: &Catalog) -> Result<Self, Error> {
        let lines = form
            .rows
            .iter()
            .filter(|row| row.has_code())
            .map(|row| DispatchLine::from_row(row, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            guide_number: form.guide_number,
            office: form.office,
            date: form.date,
            lines,
        })
    }

    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// One log row per line, with guide, office and date repeated on each.
    pub fn log_rows(&self) -> Vec<Vec<String>> {
        let guide = self.guide_number.to_string();
        let date = self.formatted_date();

        self.lines
            .iter()
            .map(|line| {
                let mut row = vec![guide.clone(), self.office.name().to_string(), date.clone()];
                row.extend(line.cells());
                row
            })
            .collect()
    }

    pub fn pdf_file_name(&self) -> String {
        format!(
            "Guia_{}_Oficina_{}.pdf",
            self.guide_number,
            self.office.file_label()
        )
    }
}

/// Whether `name` is a file name [`Dispatch::pdf_file_name`] could produce.
pub fn is_dispatch_pdf(name: &str) -> bool {
    let Some(rest) = name
        .strip_prefix("Guia_")
        .and_then(|rest| rest.strip_suffix(".pdf"))
    else {
        return false;
    };
    let Some((guide, office)) = rest.split_once("_Oficina_") else {
        return false;
    };

    !guide.is_empty()
        && guide.bytes().all(|b| b.is_ascii_digit())
        && guide.parse::<GuideNumber>().is_ok()
        && Office::ALL.iter().any(|o| o.file_label() == office)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn form(rows: Vec<GridRow>) -> FormState {
        FormState {
            office: Office::SanCarlos,
            guide_number: GuideNumber::new(12).unwrap(),
            date: date(),
            rows,
        }
    }

    #[test]
    fn guide_numbers_parse_and_advance() {
        assert_eq!("41".parse::<GuideNumber>().unwrap().next().unwrap().to_string(), "42");
        assert_eq!(" 7 ".parse::<GuideNumber>().unwrap().value(), 7);
        assert!("0".parse::<GuideNumber>().is_err());
        assert!("N° Guía".parse::<GuideNumber>().is_err());
    }

    #[test]
    fn last_guide_number_has_no_successor() {
        let last = GuideNumber::new(u64::MAX).unwrap();

        assert_eq!(last.next(), None);
        assert_eq!(
            GuideNumber::new(u64::MAX - 1).unwrap().next(),
            Some(last)
        );
    }

    #[test]
    fn guide_number_serializes_as_string() {
        let json = serde_json::to_string(&GuideNumber::new(5).unwrap()).unwrap();
        assert_eq!(json, "\"5\"");

        let from_number: GuideNumber = serde_json::from_str("5").unwrap();
        let from_string: GuideNumber = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn offices_use_display_names() {
        assert_eq!(serde_json::to_string(&Office::SanCarlos).unwrap(), "\"San Carlos\"");
        assert_eq!("Chillan".parse::<Office>().unwrap(), Office::Chillan);
        assert!("Concepción".parse::<Office>().is_err());
    }

    #[test]
    fn rows_without_code_are_dropped() {
        let dispatch = Dispatch::from_form(
            &form(vec![
                GridRow::new("TB-100", "Talonario", "2", "1001", "1100"),
                GridRow::default(),
                GridRow::new("  ", "Solo descripción", "1", "", ""),
            ]),
            &Catalog::default(),
        )
        .unwrap();

        assert_eq!(dispatch.lines.len(), 1);
        assert_eq!(dispatch.lines[0].code, "TB-100");
        assert_eq!(dispatch.lines[0].quantity, Some(2));
    }

    #[test]
    fn blank_description_comes_from_catalog() {
        let catalog: Catalog = [("TB-100".to_string(), "Talonario boletas".to_string())]
            .into_iter()
            .collect();

        let dispatch =
            Dispatch::from_form(&form(vec![GridRow::new("TB-100", "", "", "", "")]), &catalog).unwrap();

        assert_eq!(dispatch.lines[0].description, "Talonario boletas");
        assert_eq!(dispatch.lines[0].quantity, None);
    }

    #[test]
    fn invalid_quantity_is_rejected() {
        let err = Dispatch::from_form(
            &form(vec![GridRow::new("TB-100", "Talonario", "dos", "", "")]),
            &Catalog::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn whole_float_quantity_is_accepted() {
        assert_eq!(parse_quantity("3.0").unwrap(), Some(3));
        assert_eq!(parse_quantity(" ").unwrap(), None);
        assert!(matches!(parse_quantity("2.5"), Err(Error::Validation { .. })));
        assert!(matches!(parse_quantity("-1"), Err(Error::Validation { .. })));
    }

    #[test]
    fn log_rows_repeat_header_fields() {
        let dispatch = Dispatch::new(
            GuideNumber::new(12).unwrap(),
            Office::SanCarlos,
            date(),
            vec![
                DispatchLine::new("A".into(), "Uno".into(), Some(1), "10".into(), "19".into()),
                DispatchLine::new("B".into(), "Dos".into(), None, "".into(), "".into()),
            ],
        );

        assert_eq!(
            dispatch.log_rows(),
            vec![
                vec!["12", "San Carlos", "2024-03-15", "A", "Uno", "1", "10", "19"],
                vec!["12", "San Carlos", "2024-03-15", "B", "Dos", "", "", ""],
            ]
        );
    }

    #[test]
    fn pdf_file_name_replaces_spaces() {
        let dispatch = Dispatch::new(GuideNumber::new(12).unwrap(), Office::SanCarlos, date(), vec![]);
        assert_eq!(dispatch.pdf_file_name(), "Guia_12_Oficina_San_Carlos.pdf");

        let dispatch = Dispatch::new(GuideNumber::FIRST, Office::Bulnes, date(), vec![]);
        assert_eq!(dispatch.pdf_file_name(), "Guia_1_Oficina_Bulnes.pdf");
    }

    #[test]
    fn only_generated_names_are_dispatch_pdfs() {
        assert!(is_dispatch_pdf("Guia_12_Oficina_San_Carlos.pdf"));
        assert!(is_dispatch_pdf("Guia_1_Oficina_Bulnes.pdf"));

        for name in [
            "credentials.json",
            ".env",
            "Guia_1_Oficina_Bulnes.json",
            "Guia__Oficina_Bulnes.pdf",
            "Guia_0_Oficina_Bulnes.pdf",
            "Guia_+1_Oficina_Bulnes.pdf",
            "Guia_1_Oficina_Concepcion.pdf",
            "Guia_1_Oficina_../credentials.pdf",
            "other.pdf",
        ] {
            assert!(!is_dispatch_pdf(name), "{}", name);
        }
    }
}
