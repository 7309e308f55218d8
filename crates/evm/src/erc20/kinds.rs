use alloy::primitives::U256;
use generic_listener::{EventData, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Erc20EventKind {
    Transfer,
    Approval,
}

impl EventKind for Erc20EventKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "transfer" => Some(Erc20EventKind::Transfer),
            "approval" => Some(Erc20EventKind::Approval),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Erc20EventKind::Transfer => "transfer",
            Erc20EventKind::Approval => "approval",
        }
    }
}

/// Canonical token payloads. Closed tagged union.
#[derive(Debug, Clone)]
pub enum Erc20EventData {
    Transfer {
        from: String,
        to: String,
        value: U256,
    },
    Approval {
        owner: String,
        spender: String,
        value: U256,
    },
}

impl EventData for Erc20EventData {
    type Kind = Erc20EventKind;

    fn kind(&self) -> Erc20EventKind {
        match self {
            Erc20EventData::Transfer { .. } => Erc20EventKind::Transfer,
            Erc20EventData::Approval { .. } => Erc20EventKind::Approval,
        }
    }
}
