//! Sortable unique event identifiers.
//!
//! Every event carries a 30-character decimal string key built from two
//! fixed-width fields: a 19-digit tick count (100-nanosecond units since
//! the .NET epoch, for cross-system key compatibility) and an 11-digit
//! digest of a random UUID. Because both fields are zero-padded, plain
//! string comparison reproduces chronological order, with the digest
//! acting as a uniqueness extension for same-tick collisions.
//!
//! Timestamps before the Unix epoch are unsupported: the tick encoding
//! assumes a UTC clock at or after 1970-01-01.

use chrono::{DateTime, TimeZone, Utc};
use nutype::nutype;
use uuid::Uuid;

fn is_valid_encoding(value: &str) -> bool {
    value.len() == SortableUniqueId::LENGTH
        && value.bytes().all(|b| b.is_ascii_digit())
        && value[..SortableUniqueId::TICK_LENGTH].parse::<i64>().is_ok()
}

/// A lexicographically sortable, globally unique event identifier.
///
/// Guaranteed to be exactly 30 ASCII digits whose 19-digit tick prefix
/// fits in an `i64`. String ordering over the encoded form is consistent
/// with the generation-time ordering for identifiers produced by
/// [`SortableUniqueId::generate`].
#[nutype(
    validate(predicate = is_valid_encoding),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct SortableUniqueId(String);

impl SortableUniqueId {
    /// Total length of the encoded identifier.
    pub const LENGTH: usize = 30;
    /// Length of the tick field.
    pub const TICK_LENGTH: usize = 19;
    /// Length of the digest field.
    pub const ID_LENGTH: usize = 11;
    /// Width of the safety window applied by [`Self::safe_id`], in milliseconds.
    pub const SAFE_MILLISECONDS: i64 = 5000;

    /// Ticks per second in the 100-nanosecond tick encoding.
    const TICKS_PER_SECOND: i64 = 10_000_000;
    /// Ticks per millisecond.
    const TICKS_PER_MILLISECOND: i64 = 10_000;
    /// Ticks between 0001-01-01 and the Unix epoch (.NET tick epoch offset).
    const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
    /// Modulus reducing the digest to [`Self::ID_LENGTH`] digits.
    const ID_MOD: u64 = 100_000_000_000;

    /// Encodes the given timestamp and random identifier.
    ///
    /// Pure: identical inputs always yield the identical identifier.
    pub fn generate(at: DateTime<Utc>, id: Uuid) -> Self {
        Self::from_fields(Self::ticks_at(at), id)
    }

    /// Generates an identifier for the current instant with a fresh
    /// random component.
    pub fn now() -> Self {
        Self::generate(Utc::now(), Uuid::new_v4())
    }

    /// Returns a conservative lower bound for "durably stored by now":
    /// the current instant minus the safety window, with a nil random
    /// component. Useful to bound read-your-writes or catch-up queries.
    pub fn safe_horizon() -> Self {
        let at = Utc::now() - chrono::Duration::milliseconds(Self::SAFE_MILLISECONDS);
        Self::generate(at, Uuid::nil())
    }

    /// Returns this identifier shifted back by the safety window, with a
    /// nil random component. Always earlier than or equal to `self`.
    ///
    /// Saturates at the tick origin for identifiers within the window.
    pub fn safe_id(&self) -> Self {
        let window = Self::SAFE_MILLISECONDS * Self::TICKS_PER_MILLISECOND;
        Self::from_fields((self.ticks() - window).max(0), Uuid::nil())
    }

    /// The tick field of this identifier.
    pub fn ticks(&self) -> i64 {
        self.as_ref()[..Self::TICK_LENGTH]
            .parse()
            .expect("tick field is validated at construction")
    }

    /// The timestamp encoded in the tick field.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let unix_ticks = self.ticks() - Self::UNIX_EPOCH_TICKS;
        let secs = unix_ticks.div_euclid(Self::TICKS_PER_SECOND);
        let nanos = unix_ticks.rem_euclid(Self::TICKS_PER_SECOND) * 100;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Utc.timestamp_opt(secs, nanos as u32)
            .single()
            .expect("validated tick range is representable")
    }

    /// Returns `true` if this identifier sorts strictly before `other`.
    pub fn is_earlier_than(&self, other: &Self) -> bool {
        self.as_ref() < other.as_ref()
    }

    /// Returns `true` if this identifier sorts before or equal to `other`.
    pub fn is_earlier_than_or_equal(&self, other: &Self) -> bool {
        self.as_ref() <= other.as_ref()
    }

    /// Returns `true` if this identifier sorts strictly after `other`.
    pub fn is_later_than(&self, other: &Self) -> bool {
        self.as_ref() > other.as_ref()
    }

    /// Returns `true` if this identifier sorts after or equal to `other`.
    pub fn is_later_than_or_equal(&self, other: &Self) -> bool {
        self.as_ref() >= other.as_ref()
    }

    fn ticks_at(at: DateTime<Utc>) -> i64 {
        let subsec_ticks = i64::from(at.timestamp_subsec_nanos() / 100);
        Self::UNIX_EPOCH_TICKS + at.timestamp() * Self::TICKS_PER_SECOND + subsec_ticks
    }

    fn from_fields(ticks: i64, id: Uuid) -> Self {
        let encoded = format!("{ticks:019}{:011}", Self::digest(id));
        Self::try_new(encoded).expect("encoded fields are always valid")
    }

    /// Polynomial fold of the UUID bytes, reduced to the digest width.
    fn digest(id: Uuid) -> u64 {
        let hash = id
            .as_bytes()
            .iter()
            .fold(0_i64, |acc, b| acc.wrapping_mul(31).wrapping_add(i64::from(*b)));
        hash.unsigned_abs() % Self::ID_MOD
    }
}
