//! Session-gated access to the administrative section.

pub mod guard;
pub mod middleware;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use guard::{decide, sanitize_redirect, GuardDecision, GuardPolicy, GuardRequest};
pub use middleware::{login_router, require_admin, AccessControl};
pub use session::{HostedSessionLookup, SessionError, SessionLookup, StaticSessionLookup};

/// Opaque reference to the operator behind a session, recorded as `deleted_by`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inserted into request extensions once the guard admits a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub actor: ActorId,
}
