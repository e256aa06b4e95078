//! Static bible structure
//!
//! Book names and chapter counts, either the built-in canon or a JSON file
//! of `[{"name": "Genesis", "chapter_count": 50}, ...]`.

use std::path::Path;

use async_trait::async_trait;
use lectio_common::bible::{default_canon, find_book};
use lectio_common::{BookView, Error, Result};
use tracing::info;

use super::BibleStructure;

#[derive(Debug, Clone)]
pub struct StaticBible {
    books: Vec<BookView>,
}

impl StaticBible {
    pub fn new(books: Vec<BookView>) -> Self {
        Self { books }
    }

    /// The 66-book canon
    pub fn canon() -> Self {
        Self::new(default_canon())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let books: Vec<BookView> = serde_json::from_str(&content)?;
        if books.is_empty() {
            return Err(Error::Config(format!("No books in {}", path.display())));
        }
        info!("Loaded {} books from {}", books.len(), path.display());
        Ok(Self::new(books))
    }

    pub fn books(&self) -> &[BookView] {
        &self.books
    }
}

#[async_trait]
impl BibleStructure for StaticBible {
    async fn book_views(&self) -> Result<Vec<BookView>> {
        Ok(self.books.clone())
    }

    async fn resolve_book_ref(&self, prefix: Option<u32>, name: &str) -> Result<Option<u32>> {
        Ok(find_book(&self.books, prefix, name))
    }
}
