//! Canonical transaction ids.
//!
//! OCPP 1.6 identifies transactions with a 32-bit integer; 2.0.1 uses a
//! string. The canonical form of a 1.6 id `n` is the UUID whose low four
//! bytes are the big-endian two's complement of `n` and whose remaining
//! bytes are zero, so `-1` becomes `00000000-0000-0000-0000-0000ffffffff`.

use uuid::Uuid;

pub fn transaction_uuid(transaction_id: i32) -> Uuid {
    Uuid::from_u128(transaction_id as u32 as u128)
}

/// Inverse of [`transaction_uuid`]. `None` unless the upper twelve bytes
/// are zero.
pub fn legacy_transaction_id(uuid: &Uuid) -> Option<i32> {
    let value = uuid.as_u128();
    if value >> 32 == 0 {
        Some(value as u32 as i32)
    } else {
        None
    }
}

/// Parse a canonical transaction id string back into a 1.6 integer id.
pub fn parse_legacy_transaction_id(transaction_id: &str) -> Option<i32> {
    Uuid::parse_str(transaction_id)
        .ok()
        .and_then(|uuid| legacy_transaction_id(&uuid))
}
