//! Sliding queue window around the current sequence index

use lectio_common::Passage;
use serde::Serialize;

/// Span of sequence indices covered by a queue request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueWindow {
    /// First sequence index in the window
    pub offset: u32,
    /// Position of the current index inside the window
    pub queue_index: u32,
    /// Number of slots
    pub len: u32,
}

impl QueueWindow {
    /// Up to `radius` slots behind `index` (fewer near the start) and
    /// `radius` slots ahead of it
    pub fn around(index: u32, radius: u32) -> Self {
        let queue_index = index.min(radius);
        Self {
            offset: index - queue_index,
            queue_index,
            len: queue_index.saturating_add(radius).saturating_add(1),
        }
    }

    /// Sequence indices in the window, stopping short of `u32` overflow
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        let offset = self.offset;
        (0..self.len).map_while(move |k| offset.checked_add(k))
    }
}

/// Resolved queue handed to displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Queue {
    pub passages: Vec<Passage>,
    /// Position of the current passage in `passages`
    pub current: usize,
}

impl Queue {
    /// Assemble a queue from per-slot resolutions, dropping exhausted slots
    ///
    /// `slots` follows [`QueueWindow::indices`]. If the current slot was
    /// dropped, `current` is clamped to the last surviving passage.
    pub fn from_slots(window: &QueueWindow, slots: Vec<Option<Passage>>) -> Self {
        let current_slot = window.queue_index as usize;
        let current_kept = matches!(slots.get(current_slot), Some(Some(_)));
        let kept_before = slots.iter().take(current_slot).filter(|s| s.is_some()).count();

        let passages: Vec<Passage> = slots.into_iter().flatten().collect();
        let current = if current_kept {
            kept_before
        } else {
            kept_before.min(passages.len().saturating_sub(1))
        };

        Self { passages, current }
    }

    pub fn current_passage(&self) -> Option<&Passage> {
        self.passages.get(self.current)
    }
}
