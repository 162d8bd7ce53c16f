//! Wire-level constants.
//!
//! Stable string identifiers shared between the services, the stores, and
//! steward tooling.

/// Gate rejection reason codes returned by the `verify-pass` surface.
pub mod reject_reasons {
    /// No live token hash matches the presented token.
    pub const NOT_FOUND: &str = "not_found";

    /// The pass was already consumed.
    pub const ALREADY_USED: &str = "already_used";

    /// The pass was revoked by transfer or admin action.
    pub const REVOKED: &str = "revoked";
}

/// Payment kind identifiers, as stored in the payment ledger.
pub mod payment_kinds {
    /// Settles a ticket order.
    pub const TICKET: &str = "ticket";

    /// Settles a shop order.
    pub const SHOP: &str = "shop";

    /// Unattributed contribution.
    pub const DONATION: &str = "donation";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentKind, RejectReason};

    #[test]
    fn reason_codes_match_enum_forms() {
        assert_eq!(RejectReason::NotFound.as_str(), reject_reasons::NOT_FOUND);
        assert_eq!(
            RejectReason::AlreadyUsed.as_str(),
            reject_reasons::ALREADY_USED
        );
        assert_eq!(RejectReason::Revoked.as_str(), reject_reasons::REVOKED);
    }

    #[test]
    fn payment_kinds_match_enum_forms() {
        assert_eq!(PaymentKind::Ticket.as_str(), payment_kinds::TICKET);
        assert_eq!(PaymentKind::Shop.as_str(), payment_kinds::SHOP);
        assert_eq!(PaymentKind::Donation.as_str(), payment_kinds::DONATION);
    }
}
