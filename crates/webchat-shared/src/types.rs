use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::constants::JSON_INDENT;
use crate::timestamp;

/// A registered (name, address) pair. Identity is the whole value; the same
/// name may appear under many addresses and one address may hold many names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
}

impl Client {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Exact match on both halves of the identity.
    pub fn matches(&self, address: &str, name: &str) -> bool {
        self.address == address && self.name == name
    }
}

/// A single chat line. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "Name")]
    pub author: String,
    #[serde(rename = "Message")]
    pub body: String,
    #[serde(rename = "Timestamp", with = "timestamp")]
    pub timestamp: DateTime<FixedOffset>,
}

impl Message {
    /// Create a message stamped with the current local time.
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_timestamp(author, body, timestamp::now())
    }

    pub fn with_timestamp(
        author: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            timestamp,
        }
    }
}

/// Serialize with the single-space indentation used by every endpoint and
/// by the persistence file.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}
