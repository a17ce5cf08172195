//! Stock category: a named group of symbols.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stock_common::StoreError;

use crate::adapter::{DocReader, DocumentMapping};
use crate::store::Document;

/// Category entity. Names are unique; `symbols` grows by appending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    id: Option<i64>,
    /// Unique display name.
    pub name: String,
    /// Optional note.
    pub description: Option<String>,
    /// Member symbols, e.g. `sh601006`.
    pub symbols: Vec<String>,
}

impl Category {
    /// Stored name field.
    pub const NAME: &'static str = "name";
    /// Stored symbol list field.
    pub const SYMBOLS: &'static str = "symbols";

    /// Unsaved category; the id is assigned on first write.
    pub fn new(name: &str, description: Option<&str>, symbols: Vec<String>) -> Self {
        Category {
            id: None,
            name: name.to_string(),
            description: description.map(str::to_string),
            symbols,
        }
    }

    /// Store-assigned identifier, `None` until first persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Template for a partial update of an already stored category.
    pub(crate) fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl DocumentMapping for Category {
    type Id = i64;
    const COLLECTION: &'static str = "categories";
    const UNIQUE_FIELDS: &'static [&'static str] = &[Category::NAME];
    const APPEND_FIELDS: &'static [&'static str] = &[Category::SYMBOLS];

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(Self::NAME.into(), json!(self.name));
        doc.insert("description".into(), json!(self.description));
        doc.insert(Self::SYMBOLS.into(), json!(self.symbols));
        doc
    }

    fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let r = DocReader::new(Self::COLLECTION, doc);
        Ok(Category {
            id: Some(r.id()?),
            name: r.string(Self::NAME)?,
            description: r.opt_string("description")?,
            symbols: r.strings(Self::SYMBOLS)?,
        })
    }
}
