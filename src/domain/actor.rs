use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller as established by the upstream auth layer. This
/// service never authenticates anyone itself; the role is carried only for
/// audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedActor {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthenticatedActor {
    /// Actor attributed to background workers such as the retry sweeper.
    pub fn system() -> Self {
        Self {
            id: Uuid::nil(),
            email: "system@payments-retry".to_string(),
            role: "system".to_string(),
        }
    }
}
