use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ExtractError;
use crate::model::Field;

/// Association from canonical field to a zero-based source-column
/// index. Partial mappings are legal; an unmapped field reads as
/// empty, which for `Rno` or `CN` means no row can be admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    indices: BTreeMap<Field, usize>,
}

impl ColumnMapping {
    /// Builds a mapping from explicit pairs. At least one field must
    /// be mapped; duplicate indices are allowed.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Field, usize)>,
    ) -> Result<Self, ExtractError> {
        let indices: BTreeMap<Field, usize> = pairs.into_iter().collect();
        if indices.is_empty() {
            return Err(ExtractError::InvalidMapping(
                "mapping must name at least one field".to_string(),
            ));
        }
        Ok(Self { indices })
    }

    /// Parses a caller-supplied mapping document like
    /// `{"Rno": 0, "CN": 2}`. Unknown field names and non-integer
    /// indices are rejected here, once, rather than at each row.
    pub fn from_json_str(raw: &str) -> Result<Self, ExtractError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|error| ExtractError::InvalidMapping(format!("not valid JSON: {error}")))?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, ExtractError> {
        let Some(object) = value.as_object() else {
            return Err(ExtractError::InvalidMapping(
                "mapping must be a JSON object of field name to column index".to_string(),
            ));
        };

        let mut pairs = Vec::with_capacity(object.len());
        for (name, index) in object {
            let field = Field::from_str(name).map_err(ExtractError::InvalidMapping)?;
            let index = index.as_u64().and_then(|raw| usize::try_from(raw).ok()).ok_or_else(|| {
                ExtractError::InvalidMapping(format!(
                    "index for field '{name}' must be a non-negative integer, got {index}"
                ))
            })?;
            pairs.push((field, index));
        }

        Self::from_pairs(pairs)
    }

    #[must_use]
    pub fn index_of(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    /// Largest mapped column index.
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.indices.values().copied().max().unwrap_or(0)
    }

    /// Minimum number of cells or tokens a row needs before any field
    /// is pulled from it. Shorter rows are dropped entirely to avoid
    /// emitting records with misaligned fields.
    #[must_use]
    pub fn min_row_len(&self) -> usize {
        self.max_index() + 1
    }
}

/// Default positional mapping used when the caller supplies none.
impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            indices: BTreeMap::from([
                (Field::Rno, 0),
                (Field::Jno, 1),
                (Field::Cn, 2),
                (Field::B, 3),
                (Field::Sec, 4),
            ]),
        }
    }
}
