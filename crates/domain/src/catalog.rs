use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    store::{self, SheetStore, Worksheet},
};

pub const CODE_COLUMN: &str = "Código";
pub const DESCRIPTION_COLUMN: &str = "Descripción";

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Product {
    pub code: String,
    pub description: String,
}

/// Product codes mapped to their descriptions, read from the inventory
/// worksheet once at startup.
#[derive(Clone, Debug, Default, Serialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    products: BTreeMap<String, String>,
}

impl Catalog {
    /// Loads the catalog, falling back to an empty one when the inventory
    /// cannot be read.
    pub async fn load(store: &dyn SheetStore, inventory: &Worksheet) -> Self {
        match Self::try_load(store, inventory).await {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!("Catalog unavailable, using empty catalog: {}", err);
                Self::default()
            }
        }
    }

    pub async fn try_load(store: &dyn SheetStore, inventory: &Worksheet) -> Result<Self, Error> {
        let values = store.all_values(inventory).await?;

        let header = values.first().ok_or_else(|| Error::NotFound {
            entity: format!("header row in {}", inventory),
        })?;
        for column in [CODE_COLUMN, DESCRIPTION_COLUMN] {
            if !header.iter().any(|name| name == column) {
                return Err(Error::NotFound {
                    entity: format!("column {} in {}", column, inventory),
                });
            }
        }

        Ok(store::records(&values)
            .into_iter()
            .map(|mut record| {
                (
                    record.remove(CODE_COLUMN).unwrap_or_default(),
                    record.remove(DESCRIPTION_COLUMN).unwrap_or_default(),
                )
            })
            .collect())
    }

    pub fn description(&self, code: &str) -> Option<&str> {
        self.products.get(code.trim()).map(String::as_str)
    }

    pub fn products(&self) -> impl Iterator<Item = Product> + '_ {
        self.products.iter().map(|(code, description)| Product {
            code: code.clone(),
            description: description.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let products = iter
            .into_iter()
            .map(|(code, description)| (code.trim().to_string(), description))
            .filter(|(code, _)| !code.is_empty())
            .collect();
        Self { products }
    }
}
