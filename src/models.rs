use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Server-assigned row id. Tables may use integer or uuid keys, so both
/// JSON numbers and strings are accepted and kept in their textual form.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(pub String);

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => RecordId(n.to_string()),
            Raw::Text(s) => RecordId(s),
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegularSchedule {
    pub id: RecordId,
    pub user_id: String,
    #[serde(rename = "dia_semana")]
    pub day_of_week: u8,
    #[serde(rename = "horarios", default)]
    pub time_ranges: String,
    #[serde(rename = "activo", default)]
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpecialSchedule {
    pub id: RecordId,
    pub user_id: String,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "horarios", default)]
    pub time_ranges: Option<String>,
    #[serde(rename = "activo", default)]
    pub active: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RegularFields {
    #[serde(rename = "dia_semana")]
    pub day_of_week: u8,
    #[serde(rename = "horarios")]
    pub time_ranges: String,
    #[serde(rename = "activo")]
    pub active: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SpecialFields {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "horarios")]
    pub time_ranges: Option<String>,
    #[serde(rename = "activo")]
    pub active: bool,
}
