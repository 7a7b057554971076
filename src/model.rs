use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five canonical schema fields every record is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Rno,
    Jno,
    Cn,
    B,
    Sec,
}

impl Field {
    pub const ALL: [Self; 5] = [Self::Rno, Self::Jno, Self::Cn, Self::B, Self::Sec];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rno => "Rno",
            Self::Jno => "Jno",
            Self::Cn => "CN",
            Self::B => "B",
            Self::Sec => "Sec",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "Rno" => Ok(Self::Rno),
            "Jno" => Ok(Self::Jno),
            "CN" => Ok(Self::Cn),
            "B" => Ok(Self::B),
            "Sec" => Ok(Self::Sec),
            other => Err(format!("unknown field name: '{other}'")),
        }
    }
}

/// One normalized enrollment record. Serialized keys are the canonical
/// field names; a persisted object may omit keys (they read as empty)
/// but may not carry unknown ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Record {
    #[serde(rename = "Rno", default)]
    pub roll_no: String,
    #[serde(rename = "Jno", default)]
    pub application_no: String,
    #[serde(rename = "CN", default)]
    pub candidate_name: String,
    #[serde(rename = "B", default)]
    pub branch: String,
    #[serde(rename = "Sec", default)]
    pub section: String,
}

impl Record {
    #[must_use]
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Rno => &self.roll_no,
            Field::Jno => &self.application_no,
            Field::Cn => &self.candidate_name,
            Field::B => &self.branch,
            Field::Sec => &self.section,
        }
    }

    pub(crate) fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::Rno => self.roll_no = value,
            Field::Jno => self.application_no = value,
            Field::Cn => self.candidate_name = value,
            Field::B => self.branch = value,
            Field::Sec => self.section = value,
        }
    }

    /// Admission invariant: a parsed row becomes a record only when
    /// both the roll identifier and the candidate name are non-empty.
    #[must_use]
    pub fn is_admissible(&self) -> bool {
        !self.roll_no.trim().is_empty() && !self.candidate_name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}
