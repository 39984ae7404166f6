// crates/core/src/content/resolver.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ContentError;

/// Title and plain text of one resolved page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub title: Option<String>,
    #[serde(default)]
    pub text_content: String,
}

/// Resolves a `(space_id, page_id)` pair to page content.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn fetch_page(&self, space_id: Uuid, page_id: Uuid) -> Result<PageContent, ContentError>;
}
