use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Customer-facing order reference, e.g. `ORD-240517-3F9A0C11D2`.
///
/// The date prefix keeps numbers readable on the phone; the suffix is 40 bits
/// of a v4 UUID and the `orders.order_number` unique index backs it up.
pub fn generate(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..10].to_uppercase();
    format!("ORD-{}-{}", now.format("%y%m%d"), suffix)
}

pub fn is_well_formed(candidate: &str) -> bool {
    let mut parts = candidate.split('-');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some("ORD"), Some(date), Some(suffix), None)
            if date.len() == 6
                && date.chars().all(|c| c.is_ascii_digit())
                && suffix.len() == 10
                && suffix.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    )
}
