//! Clock and identifier helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use ulid::Ulid;
use uuid::Uuid;

/// Returns current unix epoch milliseconds.
pub fn now_ms() -> i64 {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock set before UNIX_EPOCH");
    dur.as_millis() as i64
}

/// Generates a new ULID.
pub fn new_ulid() -> Ulid {
    Ulid::new()
}

/// Generates a fresh mission identifier (UUID v4, hyphenated).
pub fn new_mission_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_ids_are_hyphenated_v4_uuids() {
        let id = new_mission_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.len(), 36);
        assert_ne!(id, new_mission_id());
    }

    #[test]
    fn clock_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
