//! Google Sheets API v4 client behind [`SheetStore`].

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{
    errors::Error,
    store::{SheetStore, Worksheet},
};

/// Service-account authentication
pub mod auth;

pub use auth::{ServiceAccountKey, TokenSource};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const NEW_SHEET_ROWS: u32 = 1000;

pub struct GoogleSheets {
    http: reqwest::Client,
    tokens: TokenSource,
    spreadsheet_id: String,
    titles: Mutex<HashMap<i64, String>>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl GoogleSheets {
    pub fn new(spreadsheet_id: impl Into<String>, key: ServiceAccountKey) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::store(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            tokens: TokenSource::new(key, http.clone()),
            http,
            spreadsheet_id: spreadsheet_id.into(),
            titles: Mutex::new(HashMap::new()),
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", API_BASE, self.spreadsheet_id, suffix)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, Error> {
        let token = self.tokens.token().await?;
        let request = self.http.get(url).bearer_auth(token).query(query);
        Self::read_response(request.send().await, url).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<T, Error> {
        let token = self.tokens.token().await?;
        let request = self.http.post(url).bearer_auth(token).query(query).json(body);
        Self::read_response(request.send().await, url).await
    }

    async fn read_response<T: DeserializeOwned>(
        response: reqwest::Result<reqwest::Response>,
        url: &str,
    ) -> Result<T, Error> {
        let response = response.map_err(|e| Error::store(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Sheets API request failed: {} {}", status, body);
            return Err(Error::store(format!(
                "Sheets API request failed with status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse Sheets API response: {}", e)))
    }

    async fn sheet_properties(&self) -> Result<Vec<SheetProperties>, Error> {
        let meta: SpreadsheetMeta = self.get(&self.url(""), &[("fields", "sheets.properties")]).await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    /// Tab title of a worksheet; numeric ids are resolved once and remembered.
    async fn title(&self, sheet: &Worksheet) -> Result<String, Error> {
        let id = match sheet {
            Worksheet::Title(title) => return Ok(title.clone()),
            Worksheet::Id(id) => *id,
        };

        let mut titles = self.titles.lock().await;
        if let Some(title) = titles.get(&id) {
            return Ok(title.clone());
        }

        for properties in self.sheet_properties().await? {
            titles.insert(properties.sheet_id, properties.title);
        }
        titles.get(&id).cloned().ok_or_else(|| Error::NotFound {
            entity: sheet.to_string(),
        })
    }

    async fn values(&self, range: &str, query: &[(&str, &str)]) -> Result<Vec<Vec<String>>, Error> {
        let url = self.url(&format!("/values/{}", urlencoding::encode(range)));
        let body: ValueRange = self.get(&url, query).await?;

        Ok(rows(body))
    }
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn column_values(&self, sheet: &Worksheet, column: usize) -> Result<Vec<String>, Error> {
        let letter = column_letter(column);
        let range = a1_range(&self.title(sheet).await?, &format!("{}:{}", letter, letter));

        let mut columns = self.values(&range, &[("majorDimension", "COLUMNS")]).await?;
        Ok(if columns.is_empty() {
            Vec::new()
        } else {
            columns.swap_remove(0)
        })
    }

    async fn all_values(&self, sheet: &Worksheet) -> Result<Vec<Vec<String>>, Error> {
        let range = a1_range(&self.title(sheet).await?, "");
        self.values(&range, &[]).await
    }

    async fn append_row(&self, sheet: &Worksheet, row: Vec<String>) -> Result<(), Error> {
        let range = a1_range(&self.title(sheet).await?, "A1");
        let url = self.url(&format!("/values/{}:append", urlencoding::encode(&range)));

        let _: Value = self
            .post(&url, &[("valueInputOption", "RAW")], &json!({ "values": [row] }))
            .await?;
        Ok(())
    }

    async fn ensure_worksheet(&self, title: &str, header: &[&str]) -> Result<bool, Error> {
        if self.sheet_properties().await?.iter().any(|p| p.title == title) {
            return Ok(false);
        }

        let request = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": header.len(),
                        }
                    }
                }
            }]
        });
        let _: Value = self.post(&self.url(":batchUpdate"), &[], &request).await?;

        let sheet = Worksheet::title(title);
        self.append_row(&sheet, header.iter().map(|h| h.to_string()).collect())
            .await?;

        tracing::info!(
            "Created worksheet '{}' as {}",
            title,
            self.tokens.client_email()
        );
        Ok(true)
    }
}

/// Quoted A1 range for a worksheet title; an empty `cells` selects the
/// whole sheet.
pub fn a1_range(title: &str, cells: &str) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    if cells.is_empty() {
        quoted
    } else {
        format!("{}!{}", quoted, cells)
    }
}

/// Spreadsheet column letter for a 1-based column number (1 = A, 27 = AA).
pub fn column_letter(column: usize) -> String {
    let mut name = String::new();
    let mut n = column;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

fn rows(body: ValueRange) -> Vec<Vec<String>> {
    body.values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
