//! Position-to-passage resolution
//!
//! Maps `(behavior, index)` to the passage that plays at that position of the
//! sequence, or to [`Resolution::Exhausted`] once the repeat policy has run
//! out. Resolution is stateless and works for any index, so the queue window
//! can look backwards and forwards freely. Providers are consulted on every
//! call; nothing is cached.

use lectio_common::bible::advance_chapter;
use lectio_common::{ChapterAddress, Error, Passage, ReaderBehavior, Result};
use tracing::trace;

use crate::providers::ReaderContext;

/// Outcome of resolving one sequence position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Passage(Passage),
    Exhausted,
}

impl Resolution {
    pub fn passage(self) -> Option<Passage> {
        match self {
            Resolution::Passage(passage) => Some(passage),
            Resolution::Exhausted => None,
        }
    }
}

/// Resolve sequence position `index` under `behavior`
pub async fn resolve(behavior: &ReaderBehavior, index: u32, ctx: &ReaderContext) -> Result<Resolution> {
    let resolution = match behavior {
        ReaderBehavior::Segment { start, length, policy } => {
            let (cycle, step) = match length {
                Some(len) => (index / len.get(), index % len.get()),
                None => (0, index),
            };
            if policy.is_exhausted_at(cycle as u64) {
                return Ok(Resolution::Exhausted);
            }

            let books = ctx.bible.book_views().await?;
            let chapter = advance_chapter(&books, *start, step).ok_or_else(|| {
                Error::NotFound(format!("Segment start {} is not a chapter", start))
            })?;
            Resolution::Passage(Passage::chapter(chapter))
        }

        ReaderBehavior::Daily { month, day, policy } => {
            let readings = ctx.plan.readings(*month, *day).await?;
            if readings.is_empty() {
                return Ok(Resolution::Exhausted);
            }

            let len = readings.len() as u32;
            if policy.is_exhausted_at((index / len) as u64) {
                return Ok(Resolution::Exhausted);
            }

            let reading = &readings[(index % len) as usize];
            let book = ctx
                .bible
                .resolve_book_ref(reading.prefix, &reading.book)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "Plan book {}{} for {}/{}",
                        reading.prefix.map(|p| format!("{} ", p)).unwrap_or_default(),
                        reading.book,
                        month,
                        day
                    ))
                })?;

            Resolution::Passage(Passage {
                chapter: ChapterAddress::new(book, reading.chapter),
                verses: reading.verses,
            })
        }

        ReaderBehavior::Single { policy } => {
            if policy.is_exhausted_at(index as u64) {
                return Ok(Resolution::Exhausted);
            }
            Resolution::Passage(Passage {
                chapter: ctx.current.current_chapter().await?,
                verses: ctx.current.current_verse_range().await?,
            })
        }
    };

    trace!("Resolved {} index {} -> {:?}", behavior.kind(), index, resolution);
    Ok(resolution)
}
