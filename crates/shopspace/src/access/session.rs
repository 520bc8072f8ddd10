use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::ActorId;
use crate::config::HostedStoreConfig;

/// Resolves the token carried by the session cookie to an operator.
///
/// Tokens are issued elsewhere; implementations only validate them.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn lookup(&self, token: &str) -> Result<Option<ActorId>, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Fixed token table, provisioned through configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionLookup {
    sessions: BTreeMap<String, ActorId>,
}

impl StaticSessionLookup {
    pub fn new(sessions: BTreeMap<String, ActorId>) -> Self {
        Self { sessions }
    }

    pub fn with_session(mut self, token: impl Into<String>, actor: ActorId) -> Self {
        self.sessions.insert(token.into(), actor);
        self
    }
}

#[async_trait]
impl SessionLookup for StaticSessionLookup {
    async fn lookup(&self, token: &str) -> Result<Option<ActorId>, SessionError> {
        Ok(self.sessions.get(token).cloned())
    }
}

/// Asks the hosted platform's identity endpoint who owns an access token.
pub struct HostedSessionLookup {
    client: reqwest::Client,
    user_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: String,
}

impl HostedSessionLookup {
    pub fn new(client: reqwest::Client, config: &HostedStoreConfig) -> Result<Self, SessionError> {
        let base = crate::store::hosted_base(&config.base_url);
        let user_url = base
            .join("auth/v1/user")
            .map_err(|err| SessionError::Unavailable(format!("invalid identity url: {err}")))?;
        Ok(Self {
            client,
            user_url,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl SessionLookup for HostedSessionLookup {
    async fn lookup(&self, token: &str) -> Result<Option<ActorId>, SessionError> {
        let response = self
            .client
            .get(self.user_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| SessionError::Unavailable(err.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user = response
                    .json::<IdentityUser>()
                    .await
                    .map_err(|err| SessionError::Unavailable(err.to_string()))?;
                Ok(Some(ActorId(user.id)))
            }
            status => Err(SessionError::Unavailable(format!(
                "identity endpoint responded {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_lookup_resolves_known_tokens_only() {
        let lookup = StaticSessionLookup::default()
            .with_session("tok-1", ActorId("kim".to_string()));
        assert_eq!(
            lookup.lookup("tok-1").await.expect("lookup succeeds"),
            Some(ActorId("kim".to_string()))
        );
        assert_eq!(lookup.lookup("tok-2").await.expect("lookup succeeds"), None);
    }

    #[test]
    fn identity_url_sits_beside_rest_surface() {
        let config = HostedStoreConfig {
            base_url: Url::parse("https://db.example.com/project").expect("valid"),
            api_key: "anon".to_string(),
        };
        let lookup = HostedSessionLookup::new(reqwest::Client::new(), &config).expect("builds");
        assert_eq!(
            lookup.user_url.as_str(),
            "https://db.example.com/project/auth/v1/user"
        );
    }
}
