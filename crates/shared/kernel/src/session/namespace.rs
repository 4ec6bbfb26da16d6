use sha2::{Digest, Sha256};

/// Storage namespace of an account: lowercase hex SHA-256 of the user id.
///
/// Identity providers hand out ids such as `auth0|5f7c`, `alice@example.com` or
/// `google-oauth2.1234` that are not valid directory names. The digest is, and it keeps
/// distinct ids apart. Key derivation still salts with the raw id.
#[must_use]
pub fn account_namespace(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}
