//! The wall's one data type.

use crate::store::{Document, Fields, Value};

/// Collection holding every note on the wall.
pub const COLLECTION: &str = "Wall";

/// Stored field names. Capitalized to match documents already on the wall.
pub const USER_FIELD: &str = "User";
pub const NOTE_FIELD: &str = "Note";

/// One guestbook entry. Either field may be empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    pub user: String,
    pub note: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("field {field} holds {found:?}, expected a string")]
pub struct DecodeError {
    pub field: &'static str,
    pub found: Value,
}

impl Record {
    pub fn new(user: impl Into<String>, note: impl Into<String>) -> Self {
        Self { user: user.into(), note: note.into() }
    }

    pub fn into_fields(self) -> Fields {
        Fields::from([
            (USER_FIELD.to_owned(), Value::from(self.user)),
            (NOTE_FIELD.to_owned(), Value::from(self.note)),
        ])
    }

    /// Reads a record out of a stored document. Missing fields decode as
    /// empty text; fields of any other type are an error.
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let text = |field: &'static str| match doc.field(field) {
            None => Ok(String::new()),
            Some(Value::StringValue(s)) => Ok(s.clone()),
            Some(other) => Err(DecodeError { field, found: other.clone() }),
        };
        Ok(Self { user: text(USER_FIELD)?, note: text(NOTE_FIELD)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip_through_document() {
        let record = Record::new("amy", "");
        let doc = Document { name: None, fields: record.clone().into_fields() };
        assert_eq!(Record::from_document(&doc), Ok(record));
    }

    #[test]
    fn missing_fields_are_empty() {
        let doc = Document::default();
        assert_eq!(Record::from_document(&doc), Ok(Record::default()));
    }

    #[test]
    fn non_string_field_is_rejected() {
        let mut doc = Document::default();
        doc.fields.insert(USER_FIELD.to_owned(), Value::from("amy"));
        doc.fields.insert(NOTE_FIELD.to_owned(), Value::BooleanValue(true));

        let err = Record::from_document(&doc).unwrap_err();
        assert_eq!(err.field, NOTE_FIELD);
        assert_eq!(err.found, Value::BooleanValue(true));
    }

    #[test]
    fn unrelated_fields_of_any_kind_are_ignored() {
        let mut doc = Document { name: None, fields: Record::new("amy", "hi").into_fields() };
        doc.fields.insert(
            "Created".to_owned(),
            Value::Other(serde_json::json!({"timestampValue": "2024-01-01T00:00:00Z"})),
        );
        assert_eq!(Record::from_document(&doc), Ok(Record::new("amy", "hi")));
    }
}
