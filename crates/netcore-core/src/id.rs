//! Globally unique session identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// A 128-bit value uniquely identifying a [`Session`](crate::session::Session)
/// within a process.
///
/// The high 64 bits are a per-process random seed minted once at first use;
/// the low 64 bits are a monotonic counter. This keeps minting an `Id` on the
/// accept hot path a single atomic increment rather than a call into a CSPRNG
/// per connection, while still being unique across process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u128);

static PROCESS_SEED: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
static COUNTER: AtomicU64 = AtomicU64::new(1);

impl Id {
    /// Mint a new, process-unique id.
    #[must_use]
    pub fn new() -> Self {
        let seed = *PROCESS_SEED.get_or_init(|| uuid::Uuid::new_v4().as_u128() as u64);
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        Id((u128::from(seed) << 64) | u128::from(counter))
    }

    /// The raw 128-bit value.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            bytes[0], bytes[1], bytes[2], bytes[3],
            bytes[4], bytes[5],
            bytes[6], bytes[7],
            bytes[8], bytes[9],
            bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        )
    }
}

/// Error returned by [`Id::from_str`] on a malformed textual id.
#[derive(Debug, thiserror::Error)]
#[error("malformed session id")]
pub struct ParseIdError;

impl FromStr for Id {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(ParseIdError);
        }
        let value = u128::from_str_radix(&hex, 16).map_err(|_| ParseIdError)?;
        Ok(Id(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic_in_the_low_bits() {
        let a = Id::new();
        let b = Id::new();
        assert_ne!(a, b);
        assert!(b.as_u128() & u128::from(u64::MAX) > a.as_u128() & u128::from(u64::MAX));
    }

    #[test]
    fn display_matches_canonical_grouping() {
        let id = Id::new();
        let text = id.to_string();
        let parts: Vec<&str> = text.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!([parts[0].len(), parts[1].len(), parts[2].len(), parts[3].len(), parts[4].len()], [8, 4, 4, 4, 12]);
    }

    #[test]
    fn round_trips_through_display_and_from_str() {
        let id = Id::new();
        let parsed: Id = id.to_string().parse().expect("valid id text");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("not-an-id".parse::<Id>().is_err());
    }
}
