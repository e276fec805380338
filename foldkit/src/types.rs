//! Validated primitive types for the `foldkit` event sourcing kernel.
//!
//! All types use smart constructors so that validity is established at
//! construction time; once a value exists it is valid everywhere it flows.

use nutype::nutype;

/// The sequence number of an event within its partition's stream.
///
/// The first event of a stream has version 1; the empty aggregate has
/// version 0. Versions increase by exactly one per appended event.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct EventVersion(u64);

impl EventVersion {
    /// The version of an aggregate that has no events yet (0).
    pub fn initial() -> Self {
        Self::try_new(0).expect("0 is always a valid version")
    }

    /// Returns the next version after this one.
    #[must_use]
    pub fn next(self) -> Self {
        let current: u64 = self.into();
        Self::try_new(current + 1).expect("next version should always be valid")
    }
}

/// The aggregate group component of a partition key.
///
/// Groups partition the event space by aggregate kind (for example one
/// group per projector). Guaranteed non-empty and at most 255 characters.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
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
pub struct AggregateGroup(String);

impl AggregateGroup {
    /// The default group name used when none is specified.
    pub const DEFAULT: &'static str = "default";

    /// Returns the default aggregate group.
    pub fn default_group() -> Self {
        Self::try_new(Self::DEFAULT).expect("default group name is valid")
    }
}

/// The root partition component of a partition key.
///
/// Root partitions separate tenants or environments above the group
/// level. Guaranteed non-empty and at most 255 characters.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
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
pub struct RootPartitionKey(String);

impl RootPartitionKey {
    /// The default root partition used when none is specified.
    pub const DEFAULT: &'static str = "default";

    /// Returns the default root partition key.
    pub fn default_root() -> Self {
        Self::try_new(Self::DEFAULT).expect("default root partition name is valid")
    }
}
