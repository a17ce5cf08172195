//! Session-audit record.
//!
//! One row per observed access: which session token, when, how, and from
//! where. The identifier is owned by the store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stock_common::StoreError;
use strum_macros::{Display, EnumString, FromRepr};

use crate::adapter::{DocReader, DocumentMapping};
use crate::store::Document;

/// How the session touched the system. Stored as its integer code.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, FromRepr, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum AccessType {
    /// Code not recognised.
    Unknown = 0,
    /// Interactive login.
    Login = 1,
    /// Interactive logout.
    Logout = 2,
    /// Quote query.
    Query = 3,
    /// Command-line run.
    Cli = 4,
}

impl AccessType {
    /// Integer code persisted for this access type.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Session-audit entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: Option<i64>,
    /// Client-side session token.
    pub session_id: String,
    /// When the session started.
    pub create_time: DateTime<Utc>,
    /// What the session did.
    pub access_type: AccessType,
    /// Free-form note.
    pub description: Option<String>,
    /// Originating address.
    pub ip: String,
}

impl Session {
    /// Stored name of the originating address field.
    pub const IP: &'static str = "session_ip";
    /// Creation time field, stored as RFC 3339 UTC with nanoseconds.
    pub const CREATE_TIME: &'static str = "create_time";
    /// Access type field, stored as its code.
    pub const ACCESS_TYPE: &'static str = "session_access_type";

    /// New, not yet persisted record.
    pub fn new(
        session_id: &str,
        create_time: DateTime<Utc>,
        access_type: AccessType,
        description: Option<&str>,
        ip: &str,
    ) -> Self {
        Session {
            id: None,
            session_id: session_id.to_string(),
            create_time,
            access_type,
            description: description.map(str::to_string),
            ip: ip.to_string(),
        }
    }

    /// Store-assigned identifier, `None` until first persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Storage form of a creation time. Fixed width, so stored values order
    /// lexicographically the same way they order in time.
    pub fn stored_time(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

impl DocumentMapping for Session {
    type Id = i64;
    const COLLECTION: &'static str = "sessions";

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("session_id".into(), json!(self.session_id));
        doc.insert(Self::CREATE_TIME.into(), json!(Self::stored_time(self.create_time)));
        doc.insert(Self::ACCESS_TYPE.into(), json!(self.access_type.code()));
        doc.insert("session_access_description".into(), json!(self.description));
        doc.insert(Self::IP.into(), json!(self.ip));
        doc
    }

    fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let r = DocReader::new(Self::COLLECTION, doc);
        let code = r.integer(Self::ACCESS_TYPE)?;
        let access_type = u8::try_from(code)
            .ok()
            .and_then(AccessType::from_repr)
            .ok_or_else(|| StoreError::Mapping {
                collection: Self::COLLECTION.to_string(),
                reason: format!("unknown access type code {}", code),
            })?;

        Ok(Session {
            id: Some(r.id()?),
            session_id: r.string("session_id")?,
            create_time: r.timestamp(Self::CREATE_TIME)?,
            access_type,
            description: r.opt_string("session_access_description")?,
            ip: r.string(Self::IP)?,
        })
    }
}
