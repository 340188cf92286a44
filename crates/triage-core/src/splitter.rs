//! Recursive character splitting of ticket text into overlapping segments.
//!
//! Text is split on the first separator that occurs in it, in order of
//! preference: paragraph (`"\n\n"`), line (`"\n"`), word (`" "`), and finally
//! single characters. Pieces that are still too long are split again with the
//! remaining separators; short pieces are merged back together up to
//! `chunk_size`, carrying up to `chunk_overlap` characters into the next
//! segment.
//!
//! Lengths are counted in `char`s, not bytes.

use std::collections::VecDeque;

use thiserror::Error;

use crate::config::RagConfig;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitterError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },
}

/// Deterministic splitter producing segments of at most `chunk_size` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitterError> {
        if chunk_size == 0 {
            return Err(SplitterError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(SplitterError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self, SplitterError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered, trimmed, non-empty segments.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                short.push(piece);
                continue;
            }

            if !short.is_empty() {
                chunks.extend(self.merge(&short));
                short.clear();
            }

            if remaining.is_empty() {
                // Only reachable when single characters reach chunk_size.
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !short.is_empty() {
            chunks.extend(self.merge(&short));
        }

        chunks
    }

    /// Greedily merge short pieces into segments of at most `chunk_size`,
    /// keeping a tail of up to `chunk_overlap` chars as the start of the next.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(segment) = join(&current) {
                    segments.push(segment);
                }

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(first);
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(segment) = join(&current) {
            segments.push(segment);
        }

        segments
    }
}

/// First separator present in `text`, plus the finer separators after it.
fn pick_separator<'s>(text: &str, separators: &'s [&'s str]) -> (&'s str, &'s [&'s str]) {
    for (i, &sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. An empty separator splits into single characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        pieces.push(&text[start..pos]);
        start = pos;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_sizes() {
        assert_eq!(TextSplitter::new(0, 0), Err(SplitterError::ZeroChunkSize));
        assert_eq!(
            TextSplitter::new(50, 50),
            Err(SplitterError::OverlapTooLarge {
                overlap: 50,
                size: 50
            })
        );
    }

    #[test]
    fn short_text_is_one_trimmed_segment() {
        let splitter = TextSplitter::new(500, 50).unwrap();
        let chunks = splitter.split("  Subject: Refund\n\nDescription: charged twice  ");
        assert_eq!(chunks, vec!["Subject: Refund\n\nDescription: charged twice"]);
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(20, 0).unwrap();
        let chunks = splitter.split("para one words\n\npara two words");
        assert_eq!(chunks, vec!["para one words", "para two words"]);
    }

    #[test]
    fn word_boundaries_carry_overlap() {
        let splitter = TextSplitter::new(10, 4).unwrap();
        let chunks = splitter.split("aaa bbb ccc ddd");
        assert_eq!(chunks, vec!["aaa bbb", "bbb ccc", "ccc ddd"]);
    }

    #[test]
    fn falls_back_to_characters_for_long_words() {
        let splitter = TextSplitter::new(10, 0).unwrap();
        let word = "x".repeat(25);
        let chunks = splitter.split(&word);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn segments_never_exceed_chunk_size() {
        let splitter = TextSplitter::new(40, 10).unwrap();
        let text = "Subject: Payment failed\n\nDescription: My card was declined when I tried \
                    to renew the annual plan.\nThe bank says nothing is wrong on their side and \
                    the charge shows as pending. Supercalifragilisticexpialidociouslylongtoken \
                    appears in the error dialog.";
        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= 40,
                "segment too long ({}): {chunk:?}",
                chunk.chars().count()
            );
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn counts_chars_not_bytes() {
        let splitter = TextSplitter::new(5, 0).unwrap();
        let chunks = splitter.split("ééééééé");
        assert_eq!(chunks, vec!["ééééé", "éé"]);
    }

    #[test]
    fn splitting_is_deterministic() {
        let splitter = TextSplitter::new(30, 5).unwrap();
        let text = "Cannot log in.\nReset link expired twice.\n\nTried three browsers and \
                    cleared cookies each time without luck.";
        let first = splitter.split(text);
        for _ in 0..5 {
            assert_eq!(splitter.split(text), first);
        }
    }

    #[test]
    fn from_config_uses_defaults() {
        let splitter = TextSplitter::from_config(&RagConfig::default()).unwrap();
        assert_eq!(splitter.chunk_size(), 500);
        assert_eq!(splitter.chunk_overlap(), 50);
    }
}
