//! In-memory "currently open" passage

use async_trait::async_trait;
use lectio_common::{ChapterAddress, Passage, Result, VerseRange};
use tokio::sync::RwLock;

use super::CurrentPassageSource;

/// Current passage shared between the API (writer) and the resolver (reader)
#[derive(Debug)]
pub struct SharedCurrentPassage {
    passage: RwLock<Passage>,
}

impl SharedCurrentPassage {
    pub fn new(passage: Passage) -> Self {
        Self {
            passage: RwLock::new(passage),
        }
    }

    pub async fn get(&self) -> Passage {
        *self.passage.read().await
    }

    pub async fn set(&self, passage: Passage) {
        *self.passage.write().await = passage;
    }
}

impl Default for SharedCurrentPassage {
    fn default() -> Self {
        Self::new(Passage::chapter(ChapterAddress::new(0, 0)))
    }
}

#[async_trait]
impl CurrentPassageSource for SharedCurrentPassage {
    async fn current_chapter(&self) -> Result<ChapterAddress> {
        Ok(self.passage.read().await.chapter)
    }

    async fn current_verse_range(&self) -> Result<Option<VerseRange>> {
        Ok(self.passage.read().await.verses)
    }
}
