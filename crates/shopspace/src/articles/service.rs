use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{
    Article, ArticleChanges, ArticleDraft, ArticleId, ArticlePatch, ArticleValidationError,
    NewArticle,
};
use crate::clock::Clock;
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArticleTotals {
    pub published: usize,
    pub draft: usize,
}

pub struct ArticleService {
    store: SharedStore<Article>,
    clock: Arc<dyn Clock>,
}

impl ArticleService {
    pub fn new(store: SharedStore<Article>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Every article, drafts included, most recently created first.
    pub async fn list(&self) -> Result<Vec<Article>, ArticleServiceError> {
        let mut articles = self.store.fetch_all().await?;
        articles.sort_by_key(|article| Reverse(or_epoch(article.created_at)));
        Ok(articles)
    }

    pub async fn totals(&self) -> Result<ArticleTotals, ArticleServiceError> {
        let articles = self.store.fetch_all().await?;
        let published = articles.iter().filter(|article| article.published).count();
        Ok(ArticleTotals {
            published,
            draft: articles.len() - published,
        })
    }

    pub async fn get(&self, id: &ArticleId) -> Result<Article, ArticleServiceError> {
        self.store
            .fetch(id)
            .await?
            .ok_or(ArticleServiceError::NotFound(*id))
    }

    pub async fn create(&self, draft: ArticleDraft) -> Result<Article, ArticleServiceError> {
        let article = NewArticle::try_from(draft)?.into_article(self.clock.now());
        let stored = self.store.insert(article).await?;
        info!(article_id = %stored.id, "article drafted");
        Ok(stored)
    }

    pub async fn edit(
        &self,
        id: &ArticleId,
        changes: ArticleChanges,
    ) -> Result<Article, ArticleServiceError> {
        let patch = changes.into_patch(self.clock.now())?;
        self.write_patch(id, &patch).await
    }

    /// Makes the article public. The original publication time survives republishing.
    pub async fn publish(&self, id: &ArticleId) -> Result<Article, ArticleServiceError> {
        let current = self.get(id).await?;
        let now = self.clock.now();
        let patch = ArticlePatch {
            published: Some(true),
            published_at: current.published_at.is_none().then_some(now),
            updated_at: Some(now),
            ..ArticlePatch::default()
        };
        let stored = self.write_patch(id, &patch).await?;
        info!(article_id = %id, "article published");
        Ok(stored)
    }

    pub async fn unpublish(&self, id: &ArticleId) -> Result<Article, ArticleServiceError> {
        let patch = ArticlePatch {
            published: Some(false),
            updated_at: Some(self.clock.now()),
            ..ArticlePatch::default()
        };
        let stored = self.write_patch(id, &patch).await?;
        info!(article_id = %id, "article unpublished");
        Ok(stored)
    }

    pub async fn delete(&self, id: &ArticleId) -> Result<(), ArticleServiceError> {
        self.store
            .delete(id)
            .await
            .map_err(|err| not_found_or(err, *id))?;
        info!(article_id = %id, "article deleted");
        Ok(())
    }

    /// Public blog index: published articles, newest publication first.
    pub async fn published(&self, category: Option<&str>) -> Result<Vec<Article>, ArticleServiceError> {
        let category = category.map(str::trim).filter(|category| !category.is_empty());
        let mut articles: Vec<Article> = self
            .store
            .fetch_all()
            .await?
            .into_iter()
            .filter(|article| article.published)
            .filter(|article| category.map_or(true, |category| article.category == category))
            .collect();
        articles.sort_by_key(|article| Reverse(or_epoch(article.published_at)));
        Ok(articles)
    }

    /// Public article page; drafts are not found. Counts the view.
    pub async fn read(&self, id: &ArticleId) -> Result<Article, ArticleServiceError> {
        let article = self.get(id).await?;
        if !article.published {
            return Err(ArticleServiceError::NotFound(*id));
        }

        let patch = ArticlePatch {
            view_count: Some(article.view_count.unwrap_or(0).saturating_add(1)),
            ..ArticlePatch::default()
        };
        self.write_patch(id, &patch).await
    }

    async fn write_patch(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, ArticleServiceError> {
        self.store
            .update(id, patch)
            .await
            .map_err(|err| not_found_or(err, *id))
    }
}

fn or_epoch(at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    at.unwrap_or(DateTime::UNIX_EPOCH)
}

fn not_found_or(err: StoreError, id: ArticleId) -> ArticleServiceError {
    match err {
        StoreError::NotFound => ArticleServiceError::NotFound(id),
        other => other.into(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error(transparent)]
    Validation(#[from] ArticleValidationError),
    #[error("article {0} not found")]
    NotFound(ArticleId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
