//! Scripture addressing types
//!
//! Everything here is an identifier, never text: a [`Passage`] names a chapter
//! and optionally a verse range inside it. All indices are 0-based.

use serde::{Deserialize, Serialize};

/// A chapter within a book (both 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterAddress {
    pub book: u32,
    pub number: u32,
}

impl ChapterAddress {
    pub fn new(book: u32, number: u32) -> Self {
        Self { book, number }
    }
}

impl std::fmt::Display for ChapterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.book, self.number)
    }
}

/// Inclusive verse range within a chapter (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRange {
    pub start: u32,
    pub end: u32,
}

/// A resolved reading unit: a whole chapter, or a verse range inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub chapter: ChapterAddress,
    pub verses: Option<VerseRange>,
}

impl Passage {
    /// Whole-chapter passage
    pub fn chapter(chapter: ChapterAddress) -> Self {
        Self {
            chapter,
            verses: None,
        }
    }
}

/// Shape of one book: its display name and how many chapters it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookView {
    pub name: String,
    pub chapter_count: u32,
}

/// Advance `start` forward by `count` chapters.
///
/// Chapter overflow rolls into the next book; running past the final book
/// wraps to the first, so open-ended runs cycle through the whole canon.
///
/// Returns `None` when `start` does not address a chapter in `books`
/// or when `books` holds no chapters at all.
pub fn advance_chapter(books: &[BookView], start: ChapterAddress, count: u32) -> Option<ChapterAddress> {
    let total: u64 = books.iter().map(|b| b.chapter_count as u64).sum();
    if total == 0 {
        return None;
    }

    let start_book = books.get(start.book as usize)?;
    if start.number >= start_book.chapter_count {
        return None;
    }

    let preceding: u64 = books[..start.book as usize]
        .iter()
        .map(|b| b.chapter_count as u64)
        .sum();
    let mut remaining = (preceding + start.number as u64 + count as u64) % total;

    for (book, view) in books.iter().enumerate() {
        let chapters = view.chapter_count as u64;
        if remaining < chapters {
            return Some(ChapterAddress::new(book as u32, remaining as u32));
        }
        remaining -= chapters;
    }

    None
}

/// Split a book title such as `"1 Kings"` into its numeric prefix and the
/// lowercased name (`(Some(1), "kings")`).
pub fn split_book_title(title: &str) -> (Option<u32>, String) {
    let trimmed = title.trim();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return (None, trimmed.to_ascii_lowercase());
    }

    let rest = trimmed[digits.len()..].trim_start();
    (digits.parse().ok(), rest.to_ascii_lowercase())
}

/// Alternate spellings found in reading plans, mapped to canonical names
const BOOK_ALIASES: &[(&str, &str)] = &[
    ("psalm", "psalms"),
    ("song of songs", "song of solomon"),
    ("songs", "song of solomon"),
    ("canticles", "song of solomon"),
    ("revelations", "revelation"),
    ("qoheleth", "ecclesiastes"),
];

/// Find the index of the book named by `(prefix, name)`.
///
/// Matching is case-insensitive on the non-numeric part of each title using a
/// prefix match, so abbreviations like `"gen"` resolve. When several books
/// share the name (`1 Kings` / `2 Kings`) the one whose numeric prefix equals
/// `prefix` wins; otherwise the first candidate is used.
pub fn find_book(books: &[BookView], prefix: Option<u32>, name: &str) -> Option<u32> {
    let wanted = name.trim().to_ascii_lowercase();
    let wanted = BOOK_ALIASES
        .iter()
        .find(|(alias, _)| *alias == wanted)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(wanted);

    if wanted.is_empty() {
        return None;
    }

    let candidates: Vec<(u32, Option<u32>)> = books
        .iter()
        .enumerate()
        .filter_map(|(index, book)| {
            let (book_prefix, book_name) = split_book_title(&book.name);
            book_name
                .starts_with(&wanted)
                .then_some((index as u32, book_prefix))
        })
        .collect();

    candidates
        .iter()
        .find(|(_, book_prefix)| *book_prefix == prefix)
        .or_else(|| candidates.first())
        .map(|(index, _)| *index)
}

/// The 66-book Protestant canon with chapter counts
pub const DEFAULT_CANON: &[(&str, u32)] = &[
    ("Genesis", 50),
    ("Exodus", 40),
    ("Leviticus", 27),
    ("Numbers", 36),
    ("Deuteronomy", 34),
    ("Joshua", 24),
    ("Judges", 21),
    ("Ruth", 4),
    ("1 Samuel", 31),
    ("2 Samuel", 24),
    ("1 Kings", 22),
    ("2 Kings", 25),
    ("1 Chronicles", 29),
    ("2 Chronicles", 36),
    ("Ezra", 10),
    ("Nehemiah", 13),
    ("Esther", 10),
    ("Job", 42),
    ("Psalms", 150),
    ("Proverbs", 31),
    ("Ecclesiastes", 12),
    ("Song of Solomon", 8),
    ("Isaiah", 66),
    ("Jeremiah", 52),
    ("Lamentations", 5),
    ("Ezekiel", 48),
    ("Daniel", 12),
    ("Hosea", 14),
    ("Joel", 3),
    ("Amos", 9),
    ("Obadiah", 1),
    ("Jonah", 4),
    ("Micah", 7),
    ("Nahum", 3),
    ("Habakkuk", 3),
    ("Zephaniah", 3),
    ("Haggai", 2),
    ("Zechariah", 14),
    ("Malachi", 4),
    ("Matthew", 28),
    ("Mark", 16),
    ("Luke", 24),
    ("John", 21),
    ("Acts", 28),
    ("Romans", 16),
    ("1 Corinthians", 16),
    ("2 Corinthians", 13),
    ("Galatians", 6),
    ("Ephesians", 6),
    ("Philippians", 4),
    ("Colossians", 4),
    ("1 Thessalonians", 5),
    ("2 Thessalonians", 3),
    ("1 Timothy", 6),
    ("2 Timothy", 4),
    ("Titus", 3),
    ("Philemon", 1),
    ("Hebrews", 13),
    ("James", 5),
    ("1 Peter", 5),
    ("2 Peter", 3),
    ("1 John", 5),
    ("2 John", 1),
    ("3 John", 1),
    ("Jude", 1),
    ("Revelation", 22),
];

/// Book views for [`DEFAULT_CANON`]
pub fn default_canon() -> Vec<BookView> {
    DEFAULT_CANON
        .iter()
        .map(|(name, chapter_count)| BookView {
            name: name.to_string(),
            chapter_count: *chapter_count,
        })
        .collect()
}
