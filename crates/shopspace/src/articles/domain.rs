use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

const MAX_TITLE_CHARS: usize = 200;
const MAX_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub Uuid);

impl ArticleId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ArticleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// News or guide article shown on the public blog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub summary: String,
    pub body: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Article {
    type Id = ArticleId;
    type Patch = ArticlePatch;

    const TABLE: &'static str = "articles";

    fn id(&self) -> &ArticleId {
        &self.id
    }

    fn apply(&mut self, patch: &ArticlePatch) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }

        set(&mut self.title, &patch.title);
        set(&mut self.category, &patch.category);
        set(&mut self.summary, &patch.summary);
        set(&mut self.body, &patch.body);
        set(&mut self.thumbnail_url, &patch.thumbnail_url);
        set(&mut self.published, &patch.published);
        if let Some(at) = patch.published_at {
            self.published_at = Some(at);
        }
        if let Some(count) = patch.view_count {
            self.view_count = Some(count);
        }
        if let Some(at) = patch.updated_at {
            self.updated_at = Some(at);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub summary: String,
    pub body: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle(ArticleDraft);

impl TryFrom<ArticleDraft> for NewArticle {
    type Error = ArticleValidationError;

    fn try_from(mut draft: ArticleDraft) -> Result<Self, Self::Error> {
        draft.title = validate_title(&draft.title)?;
        draft.category = required(&draft.category, "category")?;
        draft.body = required(&draft.body, "body")?;
        draft.summary = validate_summary(&draft.summary)?;
        draft.thumbnail_url = validate_thumbnail(draft.thumbnail_url)?;
        Ok(Self(draft))
    }
}

impl NewArticle {
    /// Articles are always created as unpublished drafts.
    pub fn into_article(self, now: DateTime<Utc>) -> Article {
        let draft = self.0;
        Article {
            id: ArticleId::generate(),
            title: draft.title,
            category: draft.category,
            summary: draft.summary,
            body: draft.body,
            thumbnail_url: draft.thumbnail_url,
            published: false,
            published_at: None,
            view_count: Some(0),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Editorial changes. Publishing goes through its own endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArticleChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "crate::store::deserialize_nullable")]
    pub thumbnail_url: Option<Option<String>>,
}

impl ArticleChanges {
    pub fn into_patch(self, now: DateTime<Utc>) -> Result<ArticlePatch, ArticleValidationError> {
        let patch = ArticlePatch {
            title: self.title.as_deref().map(validate_title).transpose()?,
            category: self
                .category
                .as_deref()
                .map(|category| required(category, "category"))
                .transpose()?,
            summary: self.summary.as_deref().map(validate_summary).transpose()?,
            body: self
                .body
                .as_deref()
                .map(|body| required(body, "body"))
                .transpose()?,
            thumbnail_url: self.thumbnail_url.map(validate_thumbnail).transpose()?,
            ..ArticlePatch::default()
        };

        if patch == ArticlePatch::default() {
            return Err(ArticleValidationError::NothingToChange);
        }

        Ok(ArticlePatch {
            updated_at: Some(now),
            ..patch
        })
    }
}

fn required(raw: &str, field: &'static str) -> Result<String, ArticleValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        Err(ArticleValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

fn validate_title(raw: &str) -> Result<String, ArticleValidationError> {
    let title = required(raw, "title")?;
    let length = title.chars().count();
    if length > MAX_TITLE_CHARS {
        return Err(ArticleValidationError::TooLong {
            field: "title",
            max: MAX_TITLE_CHARS,
            actual: length,
        });
    }
    Ok(title)
}

fn validate_summary(raw: &str) -> Result<String, ArticleValidationError> {
    let summary = raw.trim();
    let length = summary.chars().count();
    if length > MAX_SUMMARY_CHARS {
        return Err(ArticleValidationError::TooLong {
            field: "summary",
            max: MAX_SUMMARY_CHARS,
            actual: length,
        });
    }
    Ok(summary.to_string())
}

fn validate_thumbnail(url: Option<String>) -> Result<Option<String>, ArticleValidationError> {
    let url = url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());
    match url {
        Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => {
            Err(ArticleValidationError::InvalidThumbnail(url))
        }
        other => Ok(other),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArticleValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} exceeds {max} characters ({actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("thumbnail url '{0}' must be http(s)")]
    InvalidThumbnail(String),
    #[error("no changes supplied")]
    NothingToChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_articles_are_unpublished_drafts() {
        let draft = ArticleDraft {
            title: "2025 상가 임대 시장 동향".to_string(),
            category: "시장분석".to_string(),
            summary: String::new(),
            body: "공실률이 하락했습니다.".to_string(),
            thumbnail_url: Some(" ".to_string()),
        };
        let article = NewArticle::try_from(draft)
            .expect("valid draft")
            .into_article(Utc::now());
        assert!(!article.published);
        assert_eq!(article.published_at, None);
        assert_eq!(article.thumbnail_url, None);
    }

    #[test]
    fn changes_reject_blank_body_and_relative_thumbnail() {
        let blank_body = ArticleChanges {
            body: Some("  ".to_string()),
            ..ArticleChanges::default()
        };
        assert_eq!(
            blank_body.into_patch(Utc::now()),
            Err(ArticleValidationError::MissingField("body"))
        );

        let relative = ArticleChanges {
            thumbnail_url: Some(Some("/img/a.png".to_string())),
            ..ArticleChanges::default()
        };
        assert!(matches!(
            relative.into_patch(Utc::now()),
            Err(ArticleValidationError::InvalidThumbnail(_))
        ));

        assert_eq!(
            ArticleChanges::default().into_patch(Utc::now()),
            Err(ArticleValidationError::NothingToChange)
        );
    }
}
