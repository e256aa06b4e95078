//! Reader behaviors and repeat policies
//!
//! A [`ReaderBehavior`] says *what* to read (a run of chapters, a day of a
//! reading plan, or whatever passage is currently open); its [`RepeatPolicy`]
//! says *how long* to keep reading it.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::bible::ChapterAddress;
use crate::{Error, Result};

/// How many times a behavior's content is played
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type", content = "data")]
pub enum RepeatPolicy {
    /// Play exactly once
    #[default]
    None,
    /// Play exactly `n` times
    Count(u32),
    /// Play until the given number of seconds has elapsed
    Timed(f64),
    /// Never exhausts
    Infinite,
}

impl RepeatPolicy {
    /// Number of full cycles allowed before the sequence is exhausted.
    ///
    /// `None` means unbounded. Timed policies are unbounded by index because
    /// their end is decided by the playback timer.
    pub fn repeat_bound(&self) -> Option<u32> {
        match self {
            RepeatPolicy::None => Some(1),
            RepeatPolicy::Count(n) => Some(*n),
            RepeatPolicy::Timed(_) => None,
            RepeatPolicy::Infinite => None,
        }
    }

    /// Timer duration in seconds, for timed policies only
    pub fn duration(&self) -> Option<f64> {
        match self {
            RepeatPolicy::Timed(secs) => Some(*secs),
            _ => None,
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, RepeatPolicy::Timed(_))
    }

    /// Whether `cycle` (0-based) is past the repeat bound
    pub fn is_exhausted_at(&self, cycle: u64) -> bool {
        match self.repeat_bound() {
            Some(bound) => cycle >= bound as u64,
            None => false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RepeatPolicy::Count(0) => Err(Error::InvalidInput(
                "repeat count must be at least 1".to_string(),
            )),
            RepeatPolicy::Timed(secs) if !secs.is_finite() || *secs <= 0.0 => Err(
                Error::InvalidInput(format!("repeat duration must be positive, got {}", secs)),
            ),
            _ => Ok(()),
        }
    }
}

/// The selected reading strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "data")]
pub enum ReaderBehavior {
    /// `length` consecutive chapters from `start`; open-ended when `length` is `None`
    Segment {
        start: ChapterAddress,
        length: Option<NonZeroU32>,
        policy: RepeatPolicy,
    },
    /// The reading plan entries for one calendar day (`month` 0-11, `day` 0-based)
    Daily {
        month: u32,
        day: u32,
        policy: RepeatPolicy,
    },
    /// Whatever passage is currently open
    Single { policy: RepeatPolicy },
}

impl ReaderBehavior {
    /// One chapter, played once
    pub fn single_chapter(chapter: ChapterAddress) -> Self {
        Self::Segment {
            start: chapter,
            length: NonZeroU32::new(1),
            policy: RepeatPolicy::None,
        }
    }

    pub fn policy(&self) -> RepeatPolicy {
        match self {
            ReaderBehavior::Segment { policy, .. } => *policy,
            ReaderBehavior::Daily { policy, .. } => *policy,
            ReaderBehavior::Single { policy } => *policy,
        }
    }

    /// Timer duration in seconds when the policy is timed
    pub fn duration(&self) -> Option<f64> {
        self.policy().duration()
    }

    /// Short variant name used in logs and SSE payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ReaderBehavior::Segment { .. } => "segment",
            ReaderBehavior::Daily { .. } => "daily",
            ReaderBehavior::Single { .. } => "single",
        }
    }

    /// Reject behaviors no resolver could honor
    pub fn validate(&self) -> Result<()> {
        if let ReaderBehavior::Daily { month, day, .. } = self {
            if *month > 11 {
                return Err(Error::InvalidInput(format!(
                    "month must be 0-11, got {}",
                    month
                )));
            }
            if *day > 30 {
                return Err(Error::InvalidInput(format!("day must be 0-30, got {}", day)));
            }
        }
        self.policy().validate()
    }
}

impl Default for ReaderBehavior {
    fn default() -> Self {
        Self::single_chapter(ChapterAddress::new(0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeat_bounds() {
        assert_eq!(RepeatPolicy::None.repeat_bound(), Some(1));
        assert_eq!(RepeatPolicy::Count(4).repeat_bound(), Some(4));
        assert_eq!(RepeatPolicy::Timed(30.0).repeat_bound(), None);
        assert_eq!(RepeatPolicy::Infinite.repeat_bound(), None);
    }

    #[test]
    fn test_exhaustion_by_cycle() {
        assert!(!RepeatPolicy::None.is_exhausted_at(0));
        assert!(RepeatPolicy::None.is_exhausted_at(1));
        assert!(!RepeatPolicy::Count(2).is_exhausted_at(1));
        assert!(RepeatPolicy::Count(2).is_exhausted_at(2));
        assert!(!RepeatPolicy::Infinite.is_exhausted_at(u64::MAX));
        assert!(!RepeatPolicy::Timed(1.0).is_exhausted_at(u64::MAX));
    }

    #[test]
    fn test_policy_wire_format() {
        assert_eq!(serde_json::to_value(RepeatPolicy::None).unwrap(), json!({"type": "none"}));
        assert_eq!(
            serde_json::to_value(RepeatPolicy::Count(3)).unwrap(),
            json!({"type": "count", "data": 3})
        );
        let timed: RepeatPolicy = serde_json::from_value(json!({"type": "timed", "data": 90.0})).unwrap();
        assert_eq!(timed, RepeatPolicy::Timed(90.0));
    }

    #[test]
    fn test_behavior_wire_format() {
        let behavior: ReaderBehavior = serde_json::from_value(json!({
            "type": "segment",
            "data": {
                "start": {"book": 1, "number": 4},
                "length": null,
                "policy": {"type": "infinite"}
            }
        }))
        .unwrap();

        assert_eq!(
            behavior,
            ReaderBehavior::Segment {
                start: ChapterAddress::new(1, 4),
                length: None,
                policy: RepeatPolicy::Infinite,
            }
        );

        let single = serde_json::to_value(ReaderBehavior::Single { policy: RepeatPolicy::None }).unwrap();
        assert_eq!(single, json!({"type": "single", "data": {"policy": {"type": "none"}}}));
    }

    #[test]
    fn test_zero_length_segment_rejected_by_serde() {
        let result: std::result::Result<ReaderBehavior, _> = serde_json::from_value(json!({
            "type": "segment",
            "data": {
                "start": {"book": 0, "number": 0},
                "length": 0,
                "policy": {"type": "none"}
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ReaderBehavior::default().validate().is_ok());
        assert!(ReaderBehavior::Daily { month: 12, day: 0, policy: RepeatPolicy::None }
            .validate()
            .is_err());
        assert!(ReaderBehavior::Daily { month: 1, day: 31, policy: RepeatPolicy::None }
            .validate()
            .is_err());
        assert!(ReaderBehavior::Single { policy: RepeatPolicy::Count(0) }.validate().is_err());
        assert!(ReaderBehavior::Single { policy: RepeatPolicy::Timed(0.0) }.validate().is_err());
        assert!(ReaderBehavior::Single { policy: RepeatPolicy::Timed(f64::NAN) }.validate().is_err());
        assert!(ReaderBehavior::Single { policy: RepeatPolicy::Timed(5.0) }.validate().is_ok());
    }

    #[test]
    fn test_duration_only_for_timed() {
        assert_eq!(ReaderBehavior::Single { policy: RepeatPolicy::Timed(12.5) }.duration(), Some(12.5));
        assert_eq!(ReaderBehavior::default().duration(), None);
    }
}
