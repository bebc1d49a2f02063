//! Query result sets
//!
//! A [`RecordSet`] is built in two steps. It is opened with the object type
//! when a query is sent, and filled once with the raw JSON body when the
//! response arrives. After that it is read-only: later fills are ignored.

use crate::error::{Result, SessionError};
use serde_json::Value;
use std::collections::BTreeMap;

/// One remote record: field name to stringified value.
pub type Record = BTreeMap<String, String>;

/// Field holding a record's id.
pub const ID_FIELD: &str = "Id";

/// Records returned by one query, labelled with their object type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    object_type: String,
    records: Vec<Record>,
    completed: bool,
}

impl RecordSet {
    /// An open, unfilled set for `object_type`.
    pub fn open(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            ..Default::default()
        }
    }

    /// Relabel the set. Ignored once filled.
    pub fn set_object_type(&mut self, object_type: impl Into<String>) {
        if !self.completed {
            self.object_type = object_type.into();
        }
    }

    /// Complete the set from a raw query response body.
    ///
    /// The body must be a JSON object with a `records` array of objects.
    /// Only the first successful fill counts; later calls return `Ok(())`
    /// without touching the set. A body that cannot be read leaves the set
    /// open.
    pub fn fill(&mut self, raw: &str) -> Result<()> {
        if self.completed {
            return Ok(());
        }

        let body: Value = serde_json::from_str(raw)
            .map_err(|e| SessionError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        let array = body
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SessionError::MalformedResponse("response has no records array".to_string())
            })?;

        let records = array
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value.as_object().map(record_from_object).ok_or_else(|| {
                    SessionError::MalformedResponse(format!("record {} is not an object", index))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.records = records;
        self.completed = true;
        Ok(())
    }

    /// Object type label
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Whether the response has been received.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Number of records (zero until filled).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in server order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Record at `index`, if filled and in range.
    pub fn record_at(&self, index: usize) -> Option<&Record> {
        if !self.completed {
            return None;
        }
        self.records.get(index)
    }

    /// First record whose `Id` contains `id`.
    ///
    /// Matching is substring containment, not equality: `"abc"` finds a
    /// record with id `"abc123"`.
    pub fn record_by_id(&self, id: &str) -> Option<&Record> {
        if !self.completed {
            return None;
        }
        self.records
            .iter()
            .find(|record| record.get(ID_FIELD).is_some_and(|value| value.contains(id)))
    }

    /// Whether some record's `Id` contains `id`. Same matching as
    /// [`RecordSet::record_by_id`].
    pub fn has_id(&self, id: &str) -> bool {
        self.record_by_id(id).is_some()
    }
}

fn record_from_object(object: &serde_json::Map<String, Value>) -> Record {
    object
        .iter()
        .map(|(key, value)| (key.clone(), stringify(value)))
        .collect()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
