use std::{env, path::PathBuf};

use domain::Worksheet;

const DEFAULT_SHEET_ID: &str = "1xK3aCqaRSRyWvTYxXgYdwuejO4IydYh42Xykzi0slEo";
const DEFAULT_INVENTORY_SHEET_ID: i64 = 1928091719;

/// Service settings, read from the environment (and `.env`)
#[derive(Clone, Debug)]
pub struct Config {
    pub sheet_id: String,
    pub inventory_sheet_id: i64,
    pub dispatch_sheet_name: String,
    pub credentials_file: PathBuf,
    pub pdf_output_dir: PathBuf,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        let inventory_sheet_id = env::var("INVENTORY_SHEET_ID")
            .ok()
            .and_then(|id| match id.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!("Ignoring invalid INVENTORY_SHEET_ID {:?}", id);
                    None
                }
            })
            .unwrap_or(DEFAULT_INVENTORY_SHEET_ID);

        Self {
            sheet_id: env::var("SHEET_ID").unwrap_or(DEFAULT_SHEET_ID.to_string()),
            inventory_sheet_id,
            dispatch_sheet_name: env::var("DISPATCH_SHEET_NAME").unwrap_or("Despachos".to_string()),
            credentials_file: env::var("GOOGLE_CREDENTIALS_FILE")
                .unwrap_or("credentials.json".to_string())
                .into(),
            pdf_output_dir: env::var("PDF_OUTPUT_DIR").unwrap_or("pdf".to_string()).into(),
            bind_addr: env::var("BIND_ADDR").unwrap_or("127.0.0.1:8050".to_string()),
        }
    }

    pub fn inventory(&self) -> Worksheet {
        Worksheet::Id(self.inventory_sheet_id)
    }

    pub fn dispatch_log(&self) -> Worksheet {
        Worksheet::title(&self.dispatch_sheet_name)
    }
}
