use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;

use super::{Record, Store, StoreError};
use crate::config::HostedStoreConfig;

/// REST adapter for the hosted database's `/rest/v1/<table>` surface.
pub struct HostedStore<R> {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for HostedStore<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> HostedStore<R> {
    pub fn new(client: reqwest::Client, config: &HostedStoreConfig) -> Self {
        Self {
            client,
            base_url: hosted_base(&config.base_url),
            api_key: config.api_key.clone(),
            _record: PhantomData,
        }
    }

    pub(crate) fn table_url(&self) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("rest/v1/{}", R::TABLE))
            .map_err(|err| StoreError::Unavailable(format!("invalid table url: {err}")))
    }

    pub(crate) fn row_url(&self, id: &R::Id) -> Result<Url, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("select", "*");
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Vec<R>, StoreError> {
        let response = builder.send().await.map_err(|err| {
            tracing::error!(table = R::TABLE, error = %err, "hosted store request failed");
            StoreError::Unavailable(err.to_string())
        })?;
        read_rows(response).await
    }
}

/// Base url with a trailing slash so relative joins append instead of replacing.
pub(crate) fn hosted_base(base: &Url) -> Url {
    let mut url = base.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn read_rows<R: Record>(response: Response) -> Result<Vec<R>, StoreError> {
    let status = response.status();
    match status {
        StatusCode::NOT_FOUND => return Err(StoreError::NotFound),
        StatusCode::CONFLICT => return Err(StoreError::Conflict),
        status if !status.is_success() => {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(table = R::TABLE, %status, body = %body, "hosted store rejected request");
            return Err(StoreError::Unavailable(format!("{} responded {status}", R::TABLE)));
        }
        _ => {}
    }

    response
        .json::<Vec<R>>()
        .await
        .map_err(|err| StoreError::Unavailable(format!("malformed {} rows: {err}", R::TABLE)))
}

#[async_trait]
impl<R: Record> Store<R> for HostedStore<R> {
    async fn fetch_all(&self) -> Result<Vec<R>, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("select", "*");
        self.send(self.request(Method::GET, url)).await
    }

    async fn fetch(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        let url = self.row_url(id)?;
        let rows = self.send(self.request(Method::GET, url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, record: R) -> Result<R, StoreError> {
        let url = self.table_url()?;
        let builder = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&record);
        let rows = self.send(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable(format!("{} insert returned no row", R::TABLE)))
    }

    async fn update(&self, id: &R::Id, patch: &R::Patch) -> Result<R, StoreError> {
        let url = self.row_url(id)?;
        let builder = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(patch);
        let rows = self.send(builder).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        let url = self.row_url(id)?;
        let builder = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let rows = self.send(builder).await?;
        if rows.is_empty() {
            Err(StoreError::NotFound)
        } else {
            Ok(())
        }
    }
}
