//! Post collection storage.
//!
//! The store is the sole owner of the on-disk JSON document. Every operation
//! reads the whole document, mutates it in memory, and overwrites the whole
//! document; one async mutex serializes the read-modify-write cycles so
//! overlapping requests cannot clobber each other's writes.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::models::Post;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read post collection: {0}")]
    Read(#[source] std::io::Error),

    #[error("invalid post collection document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write post collection: {0}")]
    Write(#[source] std::io::Error),

    #[error("post {0} not found")]
    NotFound(String),
}

pub struct PostStore {
    path: PathBuf,
    default_image: String,
    lock: Mutex<()>,
}

impl PostStore {
    pub fn new(path: impl Into<PathBuf>, default_image: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_image: default_image.into(),
            lock: Mutex::new(()),
        }
    }

    /// The full collection, document order preserved (newest first).
    pub async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Look up one post. The id may arrive as a numeric string.
    pub async fn get(&self, id: &str) -> Result<Post, StoreError> {
        let _guard = self.lock.lock().await;
        let posts = self.load().await?;
        let id_num = parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        posts
            .into_iter()
            .find(|post| post.id_num == id_num)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Create a post at the front of the collection.
    ///
    /// The new id is the maximum existing id plus one, or 1 for an empty
    /// collection. The image path comes from the upload when one was given,
    /// otherwise the configured default.
    pub async fn create(
        &self,
        fields: Map<String, Value>,
        image: Option<String>,
    ) -> Result<Post, StoreError> {
        let _guard = self.lock.lock().await;
        let mut posts = self.load().await?;

        let id_num = posts.iter().map(|post| post.id_num).max().unwrap_or(0) + 1;
        let img = image.unwrap_or_else(|| self.default_image.clone());
        let mut post = Post::new(id_num, img);
        post.apply_fields(fields);

        posts.insert(0, post.clone());
        self.persist(&posts).await?;
        Ok(post)
    }

    /// Shallow-merge fields over an existing post. The image path is
    /// replaced only when a new upload accompanies the request.
    pub async fn update(
        &self,
        id: &str,
        fields: Map<String, Value>,
        image: Option<String>,
    ) -> Result<Post, StoreError> {
        let _guard = self.lock.lock().await;
        let mut posts = self.load().await?;

        let id_num = parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let post = posts
            .iter_mut()
            .find(|post| post.id_num == id_num)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        post.apply_fields(fields);
        if let Some(img) = image {
            post.img = img;
        }
        let updated = post.clone();

        self.persist(&posts).await?;
        Ok(updated)
    }

    /// Remove a post and return it so the caller can delete its page file.
    ///
    /// Nothing is written when the id has no match, leaving the document
    /// byte-for-byte unchanged.
    pub async fn delete(&self, id: &str) -> Result<Post, StoreError> {
        let _guard = self.lock.lock().await;
        let mut posts = self.load().await?;

        let id_num = parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let index = posts
            .iter()
            .position(|post| post.id_num == id_num)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let removed = posts.remove(index);
        self.persist(&posts).await?;
        Ok(removed)
    }

    async fn load(&self) -> Result<Vec<Post>, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(StoreError::Read)?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn persist(&self, posts: &[Post]) -> Result<(), StoreError> {
        let document = serde_json::to_string_pretty(posts)?;
        tokio::fs::write(&self.path, document)
            .await
            .map_err(StoreError::Write)
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
