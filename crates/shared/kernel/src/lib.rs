//! Kernel utilities shared across feature crates.
//! Keep this crate lightweight: config loading, the unlocked-session context, the
//! local-mutation gate, device-bound session persistence and id generation.
//!
//! ## ID generation
//! Use `safe_nanoid!` for URL-safe, unambiguous IDs:
//! ```rust
//! # use ksafe_kernel::safe_nanoid;
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), 12);
//! ```
//!
//! ## Session
//! ```rust
//! use ksafe_kernel::session::Session;
//! use ksafe_kernel::domain::AuthTokens;
//! use ksafe_cipher::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new();
//! assert!(session.cipher().is_err());
//!
//! let cipher = Cipher::<Aes>::builder().derived_key("ikm", "salt", "doc")?.build()?;
//! session.open(AuthTokens::new("user-1", "id", "refresh"), cipher);
//! assert_eq!(session.user_id().as_deref(), Some("user-1"));
//!
//! session.close();
//! assert!(session.cancellation().is_cancelled());
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod prelude;
pub mod session;

// Alphabet excludes visually ambiguous characters (I, O, l, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use ksafe_domain as domain;
pub use nanoid::nanoid;
pub use tokio_util::sync::CancellationToken;

/// Generates an unambiguous `NanoID` (no visually confusing characters).
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(12, $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn safe_ids_avoid_ambiguous_characters() {
        for _ in 0..64 {
            let id = safe_nanoid!(20);
            assert_eq!(id.chars().count(), 20);
            assert!(!id.contains(['I', 'O', 'l', '0', '1']));
        }
    }
}
