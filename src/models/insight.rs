use serde::{Deserialize, Serialize};

use super::metrics::ProtocolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Success,
    Warning,
    Info,
    Alert,
}

// ---------------------------------------------------------------------------
// Insight: One rule-generated highlight
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub protocol: Option<ProtocolId>,
    /// Secondary formatted figure, e.g. `"$1.00M"` or `"42.0%"`.
    pub value: Option<String>,
    /// Signed fractional change driving an up/down badge.
    pub trend: Option<f64>,
}

// ---------------------------------------------------------------------------
// Layout: How many insight cards fit the view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// 2x2 card grid.
    Compact,
    /// Full-width list.
    #[default]
    Expanded,
}

impl Layout {
    pub fn max_insights(&self) -> usize {
        match self {
            Layout::Compact => 4,
            Layout::Expanded => 6,
        }
    }
}
