//! Order and deposit references.
//!
//! A reference is the idempotency key shared with the vendor and the payment
//! gateway, so it must be unique and unguessable.

use rand::seq::IndexedRandom;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RANDOM_LEN: usize = 16;

pub const ORDER_PREFIX: &str = "BH-";
pub const DEPOSIT_PREFIX: &str = "DEP-";

/// New store order reference, `BH-` plus 16 characters.
#[must_use]
pub fn order_reference() -> String {
    generate(ORDER_PREFIX)
}

/// New wallet deposit reference, `DEP-` plus 16 characters.
#[must_use]
pub fn deposit_reference() -> String {
    generate(DEPOSIT_PREFIX)
}

/// Wallet transaction reference for refunding an order.
#[must_use]
pub fn refund_reference(order_reference: &str) -> String {
    format!("{order_reference}-refund")
}

fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let mut reference = String::with_capacity(prefix.len() + RANDOM_LEN);
    reference.push_str(prefix);
    reference.extend(
        (0..RANDOM_LEN).map(|_| CHARSET.choose(&mut rng).copied().map_or('0', char::from)),
    );
    reference
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_reference_shape() {
        let reference = order_reference();
        let suffix = reference.strip_prefix(ORDER_PREFIX).unwrap_or_default();
        assert_eq!(suffix.len(), RANDOM_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_deposit_reference_prefix() {
        assert!(deposit_reference().starts_with(DEPOSIT_PREFIX));
        assert_eq!(deposit_reference().len(), DEPOSIT_PREFIX.len() + RANDOM_LEN);
    }

    #[test]
    fn test_references_differ() {
        assert_ne!(order_reference(), order_reference());
    }

    #[test]
    fn test_refund_reference() {
        assert_eq!(refund_reference("BH-ABC"), "BH-ABC-refund");
    }
}
