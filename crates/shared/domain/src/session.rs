use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens issued by the identity provider for one signed-in account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: String,
}

impl AuthTokens {
    pub fn new(
        user_id: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            id_token: id_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// The subset the remote vault needs to authorize a request.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials { user_id: self.user_id.clone(), id_token: self.id_token.clone() }
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("user_id", &self.user_id)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// User id plus bearer token for remote calls.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub id_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("id_token", &"<redacted>")
            .finish()
    }
}
