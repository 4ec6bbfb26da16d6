use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Derived security posture of a record. Never set by the user.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SecurityFlags: u8 {
        /// Strength score below the acceptable threshold.
        const WEAK = 1 << 0;
        /// Password already used by an earlier record in the same pass.
        const DUPLICATE = 1 << 1;
        /// Password appears in a known breach corpus.
        const COMPROMISED = 1 << 2;
        /// URL classified as malicious by the safety oracle.
        const URL_UNSAFE = 1 << 3;
    }
}

impl SecurityFlags {
    #[must_use]
    pub const fn weak(self) -> bool {
        self.contains(Self::WEAK)
    }

    #[must_use]
    pub const fn duplicate(self) -> bool {
        self.contains(Self::DUPLICATE)
    }

    #[must_use]
    pub const fn compromised(self) -> bool {
        self.contains(Self::COMPROMISED)
    }

    #[must_use]
    pub const fn url_unsafe(self) -> bool {
        self.contains(Self::URL_UNSAFE)
    }

    /// Human-readable labels of the raised flags, in a fixed order.
    pub fn labels(self) -> impl Iterator<Item = &'static str> {
        [
            (Self::WEAK, "weak"),
            (Self::DUPLICATE, "duplicate"),
            (Self::COMPROMISED, "compromised"),
            (Self::URL_UNSAFE, "unsafe-url"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, label)| label)
    }
}

impl fmt::Display for SecurityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("ok");
        }
        let labels: Vec<_> = self.labels().collect();
        f.write_str(&labels.join(","))
    }
}

impl Serialize for SecurityFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for SecurityFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_raised_flags() {
        let flags = SecurityFlags::WEAK | SecurityFlags::URL_UNSAFE;
        assert!(flags.weak() && flags.url_unsafe());
        assert!(!flags.duplicate() && !flags.compromised());
        assert_eq!(flags.to_string(), "weak,unsafe-url");
        assert_eq!(SecurityFlags::empty().to_string(), "ok");
    }

    #[test]
    fn unknown_bits_are_dropped_on_load() {
        let flags: SecurityFlags = serde_json::from_str("255").unwrap();
        assert_eq!(flags, SecurityFlags::all());
        assert_eq!(serde_json::to_string(&SecurityFlags::COMPROMISED).unwrap(), "4");
    }
}
