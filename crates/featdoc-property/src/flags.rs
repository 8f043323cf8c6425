//! Property flags
//!
//! [`PropertyFlags`] is a small bit set describing how a property takes part in
//! recompute, persistence and editing. Bit values are stable because they are
//! written to saved documents.

use std::fmt::{self, Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;

/// Set of property flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyFlags(u32);

impl PropertyFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// External assignment is rejected
    pub const READ_ONLY: Self = Self(1);
    /// Existence is saved, value is not
    pub const TRANSIENT: Self = Self(2);
    /// Hidden from editors
    pub const HIDDEN: Self = Self(4);
    /// Written by recompute; changing it never touches the owner
    pub const OUTPUT: Self = Self(8);
    /// Changing it touches the owner without requiring execution
    pub const NO_RECOMPUTE: Self = Self(16);
    /// Excluded from save and restore entirely
    pub const NO_PERSIST: Self = Self(32);

    const ALL_BITS: u32 = 63;

    const NAMED: [(Self, &'static str); 6] = [
        (Self::READ_ONLY, "ReadOnly"),
        (Self::TRANSIENT, "Transient"),
        (Self::HIDDEN, "Hidden"),
        (Self::OUTPUT, "Output"),
        (Self::NO_RECOMPUTE, "NoRecompute"),
        (Self::NO_PERSIST, "NoPersist"),
    ];

    /// Build from raw bits, rejecting unknown bits
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Build from raw bits, dropping unknown bits
    #[inline]
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    /// Raw bit value
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if no flag is set
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set the bits of `other`
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set or clear the bits of `other`
    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Names of the set flags, in bit order
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Parse a list of flag names
    ///
    /// # Errors
    /// Returns [`PropertyError::UnknownFlag`] for a name that is not a flag.
    pub fn from_names<I, S>(names: I) -> Result<Self, PropertyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::NONE;
        for name in names {
            let name = name.as_ref();
            let flag = Self::NAMED
                .iter()
                .find(|(_, n)| *n == name)
                .map(|(f, _)| *f)
                .ok_or_else(|| PropertyError::UnknownFlag(name.to_string()))?;
            flags.insert(flag);
        }
        Ok(flags)
    }
}

impl BitOr for PropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PropertyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Display for PropertyFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_bit_order() {
        let flags = PropertyFlags::HIDDEN | PropertyFlags::READ_ONLY;
        assert_eq!(flags.names(), vec!["ReadOnly", "Hidden"]);
        assert!(PropertyFlags::NONE.names().is_empty());
    }

    #[test]
    fn every_combination_round_trips_through_names() {
        for bits in 0..=PropertyFlags::ALL_BITS {
            let flags = PropertyFlags::from_bits(bits).unwrap();
            assert_eq!(PropertyFlags::from_names(flags.names()).unwrap(), flags);
        }
    }

    #[test]
    fn unknown_bits_rejected() {
        assert!(PropertyFlags::from_bits(64).is_none());
        assert_eq!(PropertyFlags::from_bits_truncate(64 | 1), PropertyFlags::READ_ONLY);
    }

    #[test]
    fn unknown_name_rejected() {
        let err = PropertyFlags::from_names(["ReadOnly", "Sticky"]).unwrap_err();
        assert!(matches!(err, PropertyError::UnknownFlag(name) if name == "Sticky"));
    }

    #[test]
    fn set_and_remove() {
        let mut flags = PropertyFlags::NONE;
        flags.set(PropertyFlags::OUTPUT, true);
        assert!(flags.contains(PropertyFlags::OUTPUT));
        flags.set(PropertyFlags::OUTPUT, false);
        assert!(flags.is_empty());
    }
}
