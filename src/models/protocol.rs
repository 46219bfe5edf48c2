use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metrics::ProtocolId;

pub const OTHER_CATEGORY: &str = "Other";

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Solana,
    Evm,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Evm => "evm",
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolInfo: Display metadata for one protocol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolInfo {
    pub id: ProtocolId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub chain: Chain,
}

// ---------------------------------------------------------------------------
// ProtocolCatalog
// ---------------------------------------------------------------------------

/// Known protocols with their display name, category and chain.
///
/// Lookups for identifiers not in the catalog fall back to the raw id,
/// the `"Other"` category and Solana.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolCatalog {
    protocols: BTreeMap<ProtocolId, ProtocolInfo>,
}

impl ProtocolCatalog {
    pub fn new(entries: impl IntoIterator<Item = ProtocolInfo>) -> Self {
        Self {
            protocols: entries.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Catalog of the trading bots and terminals tracked by the dashboard.
    pub fn builtin() -> Self {
        const ENTRIES: &[(&str, &str, &str, Chain)] = &[
            ("axiom", "Axiom", "Trading Terminals", Chain::Solana),
            ("bullx", "BullX", "Trading Terminals", Chain::Solana),
            ("gmgnai", "GMGN", "Trading Terminals", Chain::Solana),
            ("photon", "Photon", "Trading Terminals", Chain::Solana),
            ("bonkbot", "BONKbot", "Telegram Bots", Chain::Solana),
            ("trojan", "Trojan", "Telegram Bots", Chain::Solana),
            ("bloom", "Bloom", "Telegram Bots", Chain::Solana),
            ("banana", "Banana Gun", "Telegram Bots", Chain::Solana),
            ("maestro", "Maestro", "Telegram Bots", Chain::Solana),
            ("nova", "Nova", "Telegram Bots", Chain::Solana),
            ("moonshot", "Moonshot", "Mobile Apps", Chain::Solana),
            ("vector", "Vector", "Mobile Apps", Chain::Solana),
            ("sigma_evm", "Sigma", "EVM", Chain::Evm),
            ("maestro_evm", "Maestro", "EVM", Chain::Evm),
            ("banana_evm", "Banana Gun", "EVM", Chain::Evm),
        ];

        Self::new(ENTRIES.iter().map(|(id, name, category, chain)| ProtocolInfo {
            id: ProtocolId::from(*id),
            name: name.to_string(),
            category: category.to_string(),
            chain: *chain,
        }))
    }

    pub fn get(&self, id: &ProtocolId) -> Option<&ProtocolInfo> {
        self.protocols.get(id)
    }

    pub fn name(&self, id: &ProtocolId) -> String {
        self.get(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn category(&self, id: &ProtocolId) -> &str {
        self.get(id)
            .map(|p| p.category.as_str())
            .unwrap_or(OTHER_CATEGORY)
    }

    pub fn chain(&self, id: &ProtocolId) -> Chain {
        self.get(id).map(|p| p.chain).unwrap_or_default()
    }

    /// Distinct category names, in order of first appearance by protocol id.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for info in self.protocols.values() {
            if !seen.contains(&info.category) {
                seen.push(info.category.clone());
            }
        }
        seen
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolInfo> {
        self.protocols.values()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}
