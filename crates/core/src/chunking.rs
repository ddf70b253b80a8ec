use crate::models::{Chunk, ChunkPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub policy: ChunkPolicy,
}

impl ChunkingConfig {
    pub fn long(max_chars: usize) -> Self {
        Self {
            max_chars,
            policy: ChunkPolicy::Long,
        }
    }

    pub fn short(max_chars: usize) -> Self {
        Self {
            max_chars,
            policy: ChunkPolicy::Short,
        }
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

/// Lazily cuts `text` at fixed character offsets `[0, w), [w, 2w), ...`.
///
/// Cuts ignore word and sentence boundaries; concatenating every chunk
/// reproduces `text` exactly. A zero width is treated as one character.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Chunks<'_> {
    Chunks {
        rest: text,
        offset: 0,
        index: 0,
        width: config.max_chars.max(1),
        policy: config.policy,
    }
}

/// Number of chunks `chunk_text` yields: `ceil(chars / max_chars)`.
pub fn chunk_count(text: &str, max_chars: usize) -> usize {
    text.chars().count().div_ceil(max_chars.max(1))
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    offset: usize,
    index: usize,
    width: usize,
    policy: ChunkPolicy,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let split_at = self
            .rest
            .char_indices()
            .nth(self.width)
            .map(|(byte_index, _)| byte_index)
            .unwrap_or(self.rest.len());
        let (piece, rest) = self.rest.split_at(split_at);

        let chunk = Chunk {
            index: self.index,
            start_offset: self.offset,
            text: piece.to_string(),
            policy: self.policy,
        };

        self.rest = rest;
        self.offset += piece.chars().count();
        self.index += 1;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str, width: usize) -> Vec<String> {
        chunk_text(text, ChunkingConfig::long(width))
            .map(|chunk| chunk.text)
            .collect()
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        let normalized = normalize_whitespace(input);
        assert_eq!(normalized, "A lot of spacing");
    }

    #[test]
    fn cuts_at_fixed_offsets() {
        let text = "AAAA BBBB CCCC DDDD";
        let chunks: Vec<_> = chunk_text(text, ChunkingConfig::short(5)).collect();

        assert_eq!(text.chars().count(), 19);
        assert_eq!(chunks.len(), 4);
        assert_eq!(
            chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            vec!["AAAA ", "BBBB ", "CCCC ", "DDDD"]
        );
        assert_eq!(
            chunks.iter().map(|c| c.start_offset).collect::<Vec<_>>(),
            vec![0, 5, 10, 15]
        );
        assert!(chunks.iter().all(|c| c.policy == ChunkPolicy::Short));
        assert_eq!(chunks[3].index, 3);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(texts("", 10).is_empty());
        assert_eq!(chunk_count("", 10), 0);
    }

    #[test]
    fn partition_is_lossless_and_counted() {
        let samples = [
            "x",
            "exactly ten",
            "The mitochondria is the powerhouse of the cell.\n\nSecond paragraph here.",
            "naïve café — résumé ✓ 日本語のテキスト",
        ];

        for sample in samples {
            for width in 1..=12 {
                let pieces = texts(sample, width);
                assert_eq!(pieces.concat(), sample);
                assert_eq!(pieces.len(), chunk_count(sample, width));
                assert!(pieces.iter().all(|piece| piece.chars().count() <= width));
            }
        }
    }

    #[test]
    fn multibyte_text_is_cut_by_characters() {
        let pieces = texts("日本語テキスト", 3);
        assert_eq!(pieces, vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn zero_width_behaves_like_one() {
        assert_eq!(texts("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn iteration_is_lazy() {
        let text = "a".repeat(10_000);
        let first_two: Vec<_> = chunk_text(&text, ChunkingConfig::short(300)).take(2).collect();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1].start_offset, 300);
    }
}
