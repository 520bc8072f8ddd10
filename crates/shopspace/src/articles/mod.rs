//! Blog articles: operator drafting and publishing, public reading.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Article, ArticleChanges, ArticleDraft, ArticleId, ArticlePatch, ArticleValidationError,
    NewArticle,
};
pub use router::{admin_article_router, public_article_router};
pub use service::{ArticleService, ArticleServiceError, ArticleTotals};
