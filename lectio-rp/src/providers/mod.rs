//! Reference-data providers
//!
//! The reader never owns scripture structure, reading plans or the "current"
//! passage; it queries them through these traits on every resolution. The
//! concrete providers in the submodules back the service binary, and tests
//! substitute their own.

use std::sync::Arc;

use async_trait::async_trait;
use lectio_common::{BookView, ChapterAddress, Result, VerseRange};
use serde::{Deserialize, Serialize};

pub mod bible;
pub mod current;
pub mod plan;

pub use bible::StaticBible;
pub use current::SharedCurrentPassage;
pub use plan::ReadingPlan;

/// Book layout of the open translation
#[async_trait]
pub trait BibleStructure: Send + Sync {
    /// Books in canonical order with their chapter counts
    async fn book_views(&self) -> Result<Vec<BookView>>;

    /// Resolve a symbolic book reference (`Some(2)`, `"Kings"`) to a book index
    async fn resolve_book_ref(&self, prefix: Option<u32>, name: &str) -> Result<Option<u32>>;
}

/// The passage the user currently has open
#[async_trait]
pub trait CurrentPassageSource: Send + Sync {
    async fn current_chapter(&self) -> Result<ChapterAddress>;

    async fn current_verse_range(&self) -> Result<Option<VerseRange>>;
}

/// One entry of a day's reading plan, still addressed by book name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReading {
    pub prefix: Option<u32>,
    pub book: String,
    /// 0-based chapter number
    pub chapter: u32,
    pub verses: Option<VerseRange>,
}

/// Daily reading plan
#[async_trait]
pub trait DailyPlan: Send + Sync {
    /// Entries for `month` (0-11) and `day` (0-based), in reading order
    async fn readings(&self, month: u32, day: u32) -> Result<Vec<PlanReading>>;
}

/// Everything the passage resolver consults
#[derive(Clone)]
pub struct ReaderContext {
    pub bible: Arc<dyn BibleStructure>,
    pub current: Arc<dyn CurrentPassageSource>,
    pub plan: Arc<dyn DailyPlan>,
}

impl ReaderContext {
    pub fn new(
        bible: Arc<dyn BibleStructure>,
        current: Arc<dyn CurrentPassageSource>,
        plan: Arc<dyn DailyPlan>,
    ) -> Self {
        Self { bible, current, plan }
    }
}
