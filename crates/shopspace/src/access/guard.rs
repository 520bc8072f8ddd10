//! Route gating as a pure decision: given the request target and the session (if any),
//! either let the request through or redirect it.

use url::form_urlencoded;

use super::AdminSession;

const REDIRECT_PARAM: &str = "redirect";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Paths equal to or below this prefix require a session.
    pub protected_prefix: String,
    /// Entry point unauthenticated operators are sent to; always reachable.
    pub login_path: String,
    /// Where an already-authenticated operator lands when no redirect target survives.
    pub landing_path: String,
}

impl GuardPolicy {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            protected_prefix: "/admin".to_string(),
            login_path: login_path.into(),
            landing_path: "/admin".to_string(),
        }
    }

    pub fn is_login(&self, path: &str) -> bool {
        path == self.login_path
    }

    pub fn is_protected(&self, path: &str) -> bool {
        path == self.protected_prefix
            || path
                .strip_prefix(self.protected_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Whether the guard needs to resolve the session cookie for `path`.
    pub fn requires_session(&self, path: &str) -> bool {
        self.is_login(path) || self.is_protected(path)
    }

    fn login_redirect(&self, request: &GuardRequest<'_>) -> String {
        let original = match request.query {
            Some(query) if !query.is_empty() => format!("{}?{}", request.path, query),
            _ => request.path.to_string(),
        };
        let encoded = form_urlencoded::Serializer::new(String::new())
            .append_pair(REDIRECT_PARAM, &original)
            .finish();
        format!("{}?{}", self.login_path, encoded)
    }

    /// Post-login destination carried in the login URL's query string.
    pub fn post_login_target(&self, query: Option<&str>) -> String {
        query
            .and_then(|query| {
                form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == REDIRECT_PARAM)
                    .map(|(_, value)| value.into_owned())
            })
            .and_then(|raw| sanitize_redirect(&raw))
            .filter(|target| {
                let path = target.split(['?', '#']).next().unwrap_or_default();
                !self.is_login(path)
            })
            .unwrap_or_else(|| self.landing_path.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(Option<AdminSession>),
    Redirect(String),
}

pub fn decide(
    request: &GuardRequest<'_>,
    session: Option<AdminSession>,
    policy: &GuardPolicy,
) -> GuardDecision {
    if policy.is_login(request.path) {
        return match session {
            Some(_) => GuardDecision::Redirect(policy.post_login_target(request.query)),
            None => GuardDecision::Allow(None),
        };
    }

    if !policy.is_protected(request.path) {
        return GuardDecision::Allow(session);
    }

    match session {
        Some(session) => GuardDecision::Allow(Some(session)),
        None => GuardDecision::Redirect(policy.login_redirect(request)),
    }
}

/// Accepts only same-origin absolute paths, so a crafted login link cannot bounce
/// the operator to another host.
pub fn sanitize_redirect(raw: &str) -> Option<String> {
    let candidate = raw.trim();
    let same_origin = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.starts_with("/\\")
        && !candidate.chars().any(char::is_control);
    same_origin.then(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::ActorId;

    fn policy() -> GuardPolicy {
        GuardPolicy::new("/admin/login")
    }

    fn session() -> AdminSession {
        AdminSession {
            actor: ActorId("operator-1".to_string()),
        }
    }

    #[test]
    fn public_paths_pass_without_session() {
        let request = GuardRequest {
            path: "/api/v1/listings",
            query: None,
        };
        assert_eq!(decide(&request, None, &policy()), GuardDecision::Allow(None));

        let lookalike = GuardRequest {
            path: "/administrators",
            query: None,
        };
        assert_eq!(decide(&lookalike, None, &policy()), GuardDecision::Allow(None));
    }

    #[test]
    fn unauthenticated_admin_request_redirects_with_original_target() {
        let request = GuardRequest {
            path: "/admin/listings",
            query: Some("tab=deleted&search=강남"),
        };
        let GuardDecision::Redirect(location) = decide(&request, None, &policy()) else {
            panic!("expected redirect");
        };
        assert!(location.starts_with("/admin/login?redirect="));

        let query = location.split_once('?').map(|(_, query)| query);
        assert_eq!(
            policy().post_login_target(query),
            "/admin/listings?tab=deleted&search=강남"
        );
    }

    #[test]
    fn authenticated_admin_request_is_allowed_with_session() {
        let request = GuardRequest {
            path: "/admin",
            query: None,
        };
        assert_eq!(
            decide(&request, Some(session()), &policy()),
            GuardDecision::Allow(Some(session()))
        );
    }

    #[test]
    fn login_page_is_reachable_anonymously() {
        let request = GuardRequest {
            path: "/admin/login",
            query: Some("redirect=%2Fadmin%2Finquiries"),
        };
        assert_eq!(decide(&request, None, &policy()), GuardDecision::Allow(None));
    }

    #[test]
    fn authenticated_login_visit_resumes_original_target() {
        let request = GuardRequest {
            path: "/admin/login",
            query: Some("redirect=%2Fadmin%2Finquiries"),
        };
        assert_eq!(
            decide(&request, Some(session()), &policy()),
            GuardDecision::Redirect("/admin/inquiries".to_string())
        );
    }

    #[test]
    fn offsite_and_looping_targets_fall_back_to_landing() {
        let policy = policy();
        assert_eq!(
            policy.post_login_target(Some("redirect=https%3A%2F%2Fevil.example")),
            "/admin"
        );
        assert_eq!(
            policy.post_login_target(Some("redirect=%2F%2Fevil.example")),
            "/admin"
        );
        assert_eq!(
            policy.post_login_target(Some("redirect=%2Fadmin%2Flogin%3Fredirect%3D%2Fadmin")),
            "/admin"
        );
        assert_eq!(policy.post_login_target(None), "/admin");
    }

    #[test]
    fn sanitize_rejects_backslash_tricks() {
        assert_eq!(sanitize_redirect("/\\evil.example"), None);
        assert_eq!(sanitize_redirect("/admin\n"), Some("/admin".to_string()));
        assert_eq!(sanitize_redirect("/admin/a\u{0}b"), None);
    }
}
