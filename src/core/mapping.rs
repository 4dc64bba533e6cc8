//! Cell mappings: raw user input and the validated, immutable form the engine consumes

use serde::{Deserialize, Deserializer, Serialize};

use super::column;
use crate::error::{TransferError, TransferResult};
use crate::types::CellRef;

/// One mapping row exactly as collected from the user (CLI flag or job file)
///
/// Every field is kept as text so validation can report precisely which row
/// is wrong. `convert` left unset means "convert when a formula is given".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMapping {
    #[serde(default, deserialize_with = "text_field")]
    pub from_row: String,
    #[serde(default, deserialize_with = "text_field")]
    pub from_col: String,
    #[serde(default, deserialize_with = "text_field")]
    pub to_row: String,
    #[serde(default, deserialize_with = "text_field")]
    pub to_col: String,
    #[serde(default)]
    pub convert: Option<bool>,
    #[serde(default, deserialize_with = "text_field")]
    pub formula: String,
}

impl RawMapping {
    pub fn new(from_row: &str, from_col: &str, to_row: &str, to_col: &str) -> Self {
        Self {
            from_row: from_row.to_string(),
            from_col: from_col.to_string(),
            to_row: to_row.to_string(),
            to_col: to_col.to_string(),
            convert: None,
            formula: String::new(),
        }
    }

    pub fn with_formula(mut self, formula: &str) -> Self {
        self.convert = Some(true);
        self.formula = formula.to_string();
        self
    }

    /// Parse the `--map` syntax: `FROM_ROW,FROM_COL,TO_ROW,TO_COL[:FORMULA]`
    ///
    /// Malformed entries still produce a `RawMapping`; missing fields are left
    /// blank so validation reports them against the right row.
    pub fn parse_cli(arg: &str) -> Self {
        let (cells, formula) = match arg.split_once(':') {
            Some((cells, formula)) => (cells, Some(formula.trim())),
            None => (arg, None),
        };

        let mut parts = cells.split(',').map(str::trim);
        let mut raw = RawMapping::new(
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
        );
        if let Some(extra) = parts.next() {
            // A fifth cell field is a typo, not a formula: surface it in validation
            raw.to_col = format!("{},{}", raw.to_col, extra);
        }
        if let Some(formula) = formula {
            raw = raw.with_formula(formula);
        }
        raw
    }

    fn is_blank(&self) -> bool {
        [&self.from_row, &self.from_col, &self.to_row, &self.to_col]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Accept strings, integers, or floats for fields users commonly type as numbers
fn text_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Field>::deserialize(deserializer)? {
        Some(Field::Text(s)) => s,
        Some(Field::Integer(i)) => i.to_string(),
        Some(Field::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

/// A validated source → destination transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingSpec {
    from: CellRef,
    to: CellRef,
    convert: bool,
    formula: String,
}

impl MappingSpec {
    /// Plain copy from `from` to `to`; both addresses must be 1-based
    pub fn new(from: CellRef, to: CellRef) -> TransferResult<Self> {
        if let Some(bad) = [from, to].into_iter().find(|at| at.row == 0 || at.col == 0) {
            return Err(TransferError::InvalidCellRef {
                cell: format!("({},{})", bad.row, bad.col),
            });
        }
        Ok(Self {
            from,
            to,
            convert: false,
            formula: String::new(),
        })
    }

    /// Enable the transform with the given formula
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.convert = true;
        self.formula = formula.into();
        self
    }

    /// Validate one raw row; `row` is the 1-based position used in errors
    pub fn from_raw(row: usize, raw: &RawMapping) -> TransferResult<Self> {
        if raw.is_blank() {
            return Err(TransferError::input(
                row,
                "mapping row is empty; fill in the row and column numbers",
            ));
        }

        let fields = [
            ("source row", &raw.from_row),
            ("source column", &raw.from_col),
            ("target row", &raw.to_row),
            ("target column", &raw.to_col),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(TransferError::input(row, format!("missing {}", name)));
        }

        let from = CellRef::new(
            parse_row(row, "source row", &raw.from_row)?,
            column::resolve(&raw.from_col)?,
        );
        let to = CellRef::new(
            parse_row(row, "target row", &raw.to_row)?,
            column::resolve(&raw.to_col)?,
        );

        let formula = raw.formula.trim().to_string();
        let convert = raw.convert.unwrap_or(!formula.is_empty());

        Ok(Self {
            from,
            to,
            convert,
            formula,
        })
    }

    pub fn from(&self) -> CellRef {
        self.from
    }

    pub fn to(&self) -> CellRef {
        self.to
    }

    pub fn convert(&self) -> bool {
        self.convert
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// The formula to apply, if conversion is on and a formula was given
    pub fn transform(&self) -> Option<&str> {
        if self.convert && !self.formula.trim().is_empty() {
            Some(&self.formula)
        } else {
            None
        }
    }
}

fn parse_row(row: usize, name: &str, value: &str) -> TransferResult<u32> {
    let trimmed = value.trim();
    let parsed: i64 = trimmed.parse().map_err(|_| {
        TransferError::input(
            row,
            format!("{} '{}' is not a whole number", name, trimmed),
        )
    })?;
    if parsed <= 0 {
        return Err(TransferError::input(
            row,
            format!("{} must be a positive integer, got {}", name, parsed),
        ));
    }
    u32::try_from(parsed)
        .map_err(|_| TransferError::input(row, format!("{} {} is too large", name, parsed)))
}

/// Validate every raw row in order; the first bad row aborts the whole batch
pub fn build_mappings(raw: &[RawMapping]) -> TransferResult<Vec<MappingSpec>> {
    if raw.is_empty() {
        return Err(TransferError::NoMappings);
    }
    raw.iter()
        .enumerate()
        .map(|(i, r)| MappingSpec::from_raw(i + 1, r))
        .collect()
}
