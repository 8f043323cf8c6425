//! Per-object recompute status

/// Status bits of a document object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectStatus(u8);

impl ObjectStatus {
    pub const NONE: Self = Self(0);
    /// Something changed since the last successful execution
    pub const TOUCHED: Self = Self(1);
    /// A change that needs execution, not just a refresh
    pub const MUST_EXECUTE: Self = Self(2);
    /// Forced by `enforce_recompute` or an upstream execution
    pub const ENFORCED: Self = Self(4);
    /// Last execution failed or the object sits in a cycle
    pub const INVALID: Self = Self(8);
    /// Skipped by recompute unless enforced
    pub const NO_RECOMPUTE: Self = Self(16);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Clear every bit a successful execution resolves
    #[inline]
    pub fn purge(&mut self) {
        self.remove(Self::TOUCHED | Self::MUST_EXECUTE | Self::ENFORCED | Self::INVALID);
    }

    /// True if recompute has to run this object
    #[must_use]
    pub const fn must_recompute(self) -> bool {
        self.contains(Self::ENFORCED)
            || self.contains(Self::INVALID)
            || (self.contains(Self::MUST_EXECUTE) && !self.contains(Self::NO_RECOMPUTE))
    }

    /// Human-readable state list
    #[must_use]
    pub fn state_names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::TOUCHED) {
            names.push("Touched");
        }
        if self.contains(Self::INVALID) {
            names.push("Invalid");
        }
        if self.contains(Self::ENFORCED) {
            names.push("Enforced");
        }
        if self.contains(Self::NO_RECOMPUTE) {
            names.push("NoRecompute");
        }
        if names.is_empty() {
            names.push("Up-to-date");
        }
        names
    }
}

impl std::ops::BitOr for ObjectStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
