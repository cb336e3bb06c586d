//! Transaction lifecycle: Pending -> Completed | Failed, both terminal.

use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TxStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl TxStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "Completed" => Some(Self::Completed),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

/// Merchant transaction id: `Tr-` plus the last six hex chars of a fresh v4
/// uuid. Human-readable enough for the gateway dashboard, unique enough per
/// attempt.
pub fn merchant_transaction_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("Tr-{}", &raw[raw.len() - 6..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [TxStatus::Pending, TxStatus::Completed, TxStatus::Failed] {
            assert_eq!(TxStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TxStatus::parse("pending"), None);
    }

    #[test]
    fn merchant_id_has_prefix_and_suffix() {
        let id = merchant_transaction_id();
        assert!(id.starts_with("Tr-"));
        assert_eq!(id.len(), 9);
        assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn merchant_ids_are_fresh_per_attempt() {
        // Six hex chars of a v4 uuid; collisions across two draws would be
        // a one-in-sixteen-million fluke.
        assert_ne!(merchant_transaction_id(), merchant_transaction_id());
    }
}
