//! Column label resolution (a → 1, z → 26, aa → 27, zz → 702)
//!
//! Labels are one or two letters, case-insensitive. Two-letter labels follow
//! spreadsheet numbering: the first letter is the major digit.

use crate::error::{TransferError, TransferResult};

/// Highest column index a label can address ("zz")
pub const MAX_COLUMN: u32 = 26 + 26 * 26;

/// Resolve a column label to its 1-based index
pub fn resolve(label: &str) -> TransferResult<u32> {
    let normalized = label.trim().to_lowercase();
    let invalid = || TransferError::InvalidColumnLabel {
        label: label.to_string(),
    };

    if normalized.is_empty() || normalized.len() > 2 {
        return Err(invalid());
    }

    let mut digits = Vec::with_capacity(2);
    for c in normalized.chars() {
        if !c.is_ascii_lowercase() {
            return Err(invalid());
        }
        digits.push(c as u32 - 'a' as u32 + 1);
    }

    Ok(match digits.as_slice() {
        [single] => *single,
        [major, minor] => major * 26 + minor,
        _ => return Err(invalid()),
    })
}

/// Convert a 1-based column index back to its upper-case label (1 → A, 27 → AA)
///
/// Returns `None` outside `1..=MAX_COLUMN`.
pub fn column_label(index: u32) -> Option<String> {
    match index {
        1..=26 => Some(letter(index).to_string()),
        27..=MAX_COLUMN => {
            let offset = index - 27;
            Some(format!("{}{}", letter(offset / 26 + 1), letter(offset % 26 + 1)))
        }
        _ => None,
    }
}

fn letter(n: u32) -> char {
    (b'A' + (n - 1) as u8) as char
}
