pub use crate::config::{ConfigError, load_config};
pub use crate::error::{SessionError, SessionErrorExt};
pub use crate::safe_nanoid;
pub use crate::session::{
    DeviceSessionStore, MutationGate, MutationGuard, Session, SessionPersistence,
};
pub use tokio_util::sync::CancellationToken;
