use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use tracing::{debug, error};

use super::guard::{decide, GuardDecision, GuardPolicy, GuardRequest};
use super::session::{HostedSessionLookup, SessionError, SessionLookup, StaticSessionLookup};
use super::AdminSession;
use crate::config::{AdminConfig, StoreConfig};

/// Everything the admin guard needs per request.
pub struct AccessControl {
    policy: GuardPolicy,
    cookie_name: String,
    lookup: Arc<dyn SessionLookup>,
}

impl AccessControl {
    pub fn new(
        policy: GuardPolicy,
        cookie_name: impl Into<String>,
        lookup: Arc<dyn SessionLookup>,
    ) -> Self {
        Self {
            policy,
            cookie_name: cookie_name.into(),
            lookup,
        }
    }

    /// Hosted deployments validate tokens against the identity endpoint;
    /// otherwise the configured static sessions are used.
    pub fn from_config(
        admin: &AdminConfig,
        store: &StoreConfig,
        client: reqwest::Client,
    ) -> Result<Self, SessionError> {
        let lookup: Arc<dyn SessionLookup> = match store {
            StoreConfig::Hosted(hosted) => Arc::new(HostedSessionLookup::new(client, hosted)?),
            StoreConfig::Memory => Arc::new(StaticSessionLookup::new(admin.static_sessions.clone())),
        };
        Ok(Self::new(
            GuardPolicy::new(admin.login_path.clone()),
            admin.session_cookie.clone(),
            lookup,
        ))
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    async fn session(&self, jar: &CookieJar) -> Result<Option<AdminSession>, SessionError> {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Ok(None);
        };
        let token = cookie.value().trim();
        if token.is_empty() {
            return Ok(None);
        }
        let actor = self.lookup.lookup(token).await?;
        Ok(actor.map(|actor| AdminSession { actor }))
    }
}

/// Middleware gating the administrative section behind a session cookie.
pub async fn require_admin(
    State(access): State<Arc<AccessControl>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let uri = request.uri().clone();
    let path = uri.path();
    if !access.policy.requires_session(path) {
        return next.run(request).await;
    }

    let session = match access.session(&jar).await {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, path, "session lookup failed");
            let payload = json!({ "error": "unable to verify the admin session, please try again" });
            return (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response();
        }
    };

    let guard_request = GuardRequest {
        path,
        query: uri.query(),
    };
    match decide(&guard_request, session, &access.policy) {
        GuardDecision::Allow(session) => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        GuardDecision::Redirect(target) => {
            debug!(path, target = %target, "admin guard redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}

/// Entry point for unauthenticated operators. Token issuance happens at the identity
/// provider; this only tells the client where it will be sent afterwards.
pub fn login_router(access: Arc<AccessControl>) -> Router {
    let path = access.policy.login_path.clone();
    Router::new()
        .route(&path, get(login_handler))
        .with_state(access)
}

pub(crate) async fn login_handler(State(access): State<Arc<AccessControl>>, uri: Uri) -> Response {
    let target = access.policy.post_login_target(uri.query());
    let payload = json!({
        "error": "admin session required",
        "login_path": access.policy.login_path,
        "redirect": target,
    });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}
