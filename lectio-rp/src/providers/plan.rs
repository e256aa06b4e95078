//! Daily reading plan loaded from TOML
//!
//! ```toml
//! [[day]]
//! month = 1
//! day = 1
//! readings = ["Genesis 1-2", "Psalm 1", "Matthew 1:1-17"]
//! ```
//!
//! Months and days are 1-based in the file and 0-based everywhere else.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use lectio_common::{Error, Result, VerseRange};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DailyPlan, PlanReading};

/// February 29th, 0-based; always read as an empty day
const LEAP_DAY: (u32, u32) = (1, 28);

#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(default)]
    day: Vec<PlanDay>,
}

#[derive(Debug, Deserialize)]
struct PlanDay {
    month: u32,
    day: u32,
    #[serde(default)]
    readings: Vec<String>,
}

/// Reading plan keyed by 0-based `(month, day)`
#[derive(Debug, Clone, Default)]
pub struct ReadingPlan {
    days: HashMap<(u32, u32), Vec<PlanReading>>,
}

impl ReadingPlan {
    /// Plan with no days; every daily behavior is immediately exhausted
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let plan = Self::from_toml_str(&content)?;
        info!("Loaded reading plan with {} days from {}", plan.days.len(), path.display());
        Ok(plan)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PlanFile = toml::from_str(content)?;
        let mut days = HashMap::new();

        for entry in file.day {
            if !(1..=12).contains(&entry.month) || !(1..=31).contains(&entry.day) {
                return Err(Error::Config(format!(
                    "Invalid plan date {}/{}",
                    entry.month, entry.day
                )));
            }

            let mut readings = Vec::new();
            for reference in &entry.readings {
                readings.extend(parse_reference(reference)?);
            }
            days.insert((entry.month - 1, entry.day - 1), readings);
        }

        Ok(Self { days })
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    fn readings_for(&self, month: u32, day: u32) -> Vec<PlanReading> {
        if (month, day) == LEAP_DAY {
            return Vec::new();
        }
        self.days.get(&(month, day)).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DailyPlan for ReadingPlan {
    async fn readings(&self, month: u32, day: u32) -> Result<Vec<PlanReading>> {
        let readings = self.readings_for(month, day);
        debug!("Plan day {}/{}: {} readings", month, day, readings.len());
        Ok(readings)
    }
}

/// `[prefix] book chapter[-chapter | :verse[-verse]]`
const REFERENCE_PATTERN: &str = r"^(?:(?P<prefix>\d+)\s*)?(?P<book>[A-Za-z][A-Za-z ]*?)\s+(?P<chapter>\d+)(?:-(?P<last>\d+)|:(?P<start>\d+)(?:-(?P<end>\d+))?)?$";

fn reference_regex() -> Result<&'static Regex> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    if let Some(regex) = REGEX.get() {
        return Ok(regex);
    }
    let regex = Regex::new(REFERENCE_PATTERN)
        .map_err(|e| Error::Internal(format!("Invalid reference pattern: {}", e)))?;
    Ok(REGEX.get_or_init(|| regex))
}

/// Parse a 1-based human reference into 0-based plan readings.
///
/// Accepted forms: `"Genesis 3"`, `"Genesis 1-2"` (one reading per chapter),
/// `"Matthew 5:1-12"`, `"John 3:16"`, each optionally prefixed by a book
/// number (`"2 Kings 3"`).
pub fn parse_reference(text: &str) -> Result<Vec<PlanReading>> {
    let invalid = || Error::InvalidInput(format!("Invalid reading reference: {:?}", text));

    let caps = reference_regex()?
        .captures(text.trim())
        .ok_or_else(invalid)?;

    let number = |name: &str| -> Result<Option<u32>> {
        caps.name(name)
            .map(|m| m.as_str().parse::<u32>().map_err(|_| invalid()))
            .transpose()
    };
    let one_based = |name: &str| -> Result<Option<u32>> {
        number(name)?
            .map(|n| n.checked_sub(1).ok_or_else(invalid))
            .transpose()
    };

    let prefix = number("prefix")?;
    let book = caps.name("book").map_or("", |m| m.as_str().trim());
    let chapter = one_based("chapter")?.ok_or_else(invalid)?;

    let reading = |chapter: u32, verses: Option<VerseRange>| PlanReading {
        prefix,
        book: book.to_string(),
        chapter,
        verses,
    };

    if let Some(start) = one_based("start")? {
        let end = one_based("end")?.unwrap_or(start);
        if end < start {
            return Err(invalid());
        }
        return Ok(vec![reading(chapter, Some(VerseRange { start, end }))]);
    }

    if let Some(last) = one_based("last")? {
        if last < chapter {
            return Err(invalid());
        }
        return Ok((chapter..=last).map(|chapter| reading(chapter, None)).collect());
    }

    Ok(vec![reading(chapter, None)])
}
