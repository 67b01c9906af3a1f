use std::fmt;

/// The recorded state of a payment for a visit.
///
/// `Pending` is a provisional placeholder written at booking time; the actual
/// payment method is recorded later as a separate record rather than by
/// mutating the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Cash,
    CashCollected,
    Online,
    Upi,
}

impl PaymentState {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Cash => "cash",
            PaymentState::CashCollected => "cash_collected",
            PaymentState::Online => "online",
            PaymentState::Upi => "upi",
        }
    }

    pub fn is_pending(self) -> bool {
        self == PaymentState::Pending
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_snake_case_values() {
        assert_eq!(
            serde_json::to_string(&PaymentState::CashCollected).unwrap(),
            "\"cash_collected\""
        );
        let parsed: PaymentState = serde_json::from_str("\"upi\"").unwrap();
        assert_eq!(parsed, PaymentState::Upi);
    }

    #[test]
    fn test_only_pending_is_pending() {
        assert!(PaymentState::Pending.is_pending());
        for state in [
            PaymentState::Cash,
            PaymentState::CashCollected,
            PaymentState::Online,
            PaymentState::Upi,
        ] {
            assert!(!state.is_pending());
        }
    }
}
