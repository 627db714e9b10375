use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::Date;

use crate::error::RowRejection;

pub type DocId = u32;

time::serde::format_description!(birthdate_format, Date, "[year]-[month]-[day]");

/// One indexed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    #[serde(with = "birthdate_format::option", default)]
    pub birthdate: Option<Date>,
    #[serde(default)]
    pub birthplace: String,
    #[serde(default)]
    pub notes: String,
}

impl Document {
    /// Text of an analyzed field.
    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Birthplace => &self.birthplace,
            Field::Notes => &self.notes,
        }
    }
}

/// Analyzed text fields. `birthdate` is stored but never tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Birthplace,
    Notes,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Birthplace, Field::Notes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Birthplace => "birthplace",
            Self::Notes => "notes",
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row as delivered by a record source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub birthplace: Option<String>,
    pub notes: Option<String>,
}

impl RawRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    /// Validate the row and turn it into a document with the given id.
    pub fn into_document(self, id: DocId) -> Result<Document, RowRejection> {
        let name = match self.name.map(|n| n.trim().to_string()) {
            Some(n) if !n.is_empty() => n,
            _ => return Err(RowRejection::MissingName),
        };
        let birthdate = match self.birthdate.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_birthdate(raw).ok_or_else(|| RowRejection::InvalidBirthdate(raw.to_string()))?),
        };
        Ok(Document {
            id,
            name,
            birthdate,
            birthplace: self.birthplace.unwrap_or_default().trim().to_string(),
            notes: self.notes.unwrap_or_default().trim().to_string(),
        })
    }
}

/// Accepts `YYYY-MM-DD` (optionally followed by a `T`/space separated time, as spreadsheet
/// exports write dates) and `DD/MM/YYYY`.
pub fn parse_birthdate(raw: &str) -> Option<Date> {
    let iso = format_description!("[year]-[month]-[day]");
    let dmy = format_description!("[day]/[month]/[year]");
    let date_part = match raw.find(|c: char| c == 'T' || c == ' ') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    Date::parse(date_part, &iso).or_else(|_| Date::parse(date_part, &dmy)).ok()
}
