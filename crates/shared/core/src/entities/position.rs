use serde::{Deserialize, Serialize};

/// Side of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    /// Bid - the buyer
    Long,
    /// Ask - the seller
    Short,
}

impl Position {
    /// Parse the order table's side code (1 long, -1 short)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Position::Long),
            -1 => Some(Position::Short),
            _ => None,
        }
    }
}
