//! Splits extracted text into overlapping passages sized for embedding.
//!
//! The splitter prefers paragraph breaks, then sentence ends, then word
//! boundaries, and only hard-cuts when no boundary falls inside the target
//! window. Lengths and overlap are measured in characters.

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

/// Unifies line endings, replaces non-breaking spaces, collapses runs of
/// three or more newlines down to a paragraph break, and trims the ends.
pub fn normalize_text(text: &str) -> String {
    let unified = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{a0}', " ");

    let mut normalized = String::with_capacity(unified.len());
    let mut newline_run = 0usize;
    for ch in unified.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run > 2 {
                continue;
            }
        } else {
            newline_run = 0;
        }
        normalized.push(ch);
    }

    normalized.trim().to_string()
}

/// Splits `text` into chunks of at most `max_chars`, each overlapping the
/// previous by exactly `overlap_chars` (except the first). Blank input
/// yields no chunks.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.iter().all(|ch| ch.is_whitespace()) {
        return Vec::new();
    }

    let max = config.max_chars.max(1);
    let overlap = config.overlap_chars.min(max.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        if chars.len() - start <= max {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let hard_end = start + max;
        // The lower bound keeps chunks from collapsing below half the target
        // size and guarantees forward progress past the overlap region.
        let lower = (start + max / 2).max(start + overlap + 1);
        let end = find_boundary(&chars, lower, hard_end).unwrap_or(hard_end);

        chunks.push(chars[start..end].iter().collect());
        start = end - overlap;
    }

    chunks
}

/// Finds the best split position in `(lower, upper]`, scanning backwards from
/// `upper`. Paragraph breaks win over sentence ends, sentence ends over word
/// boundaries. Returns `None` when the window contains no boundary at all.
fn find_boundary(chars: &[char], lower: usize, upper: usize) -> Option<usize> {
    for position in (lower..=upper).rev() {
        if position >= 2 && chars[position - 1] == '\n' && chars[position - 2] == '\n' {
            return Some(position);
        }
    }

    for position in (lower..=upper).rev() {
        let sentence_end = position >= 2
            && matches!(chars[position - 2], '.' | '!' | '?')
            && chars[position - 1].is_whitespace();
        if sentence_end || chars[position - 1] == '\n' {
            return Some(position);
        }
    }

    for position in (lower..=upper).rev() {
        if chars[position - 1].is_whitespace() {
            return Some(position);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[String], overlap: usize) -> String {
        let mut text = String::new();
        for (index, chunk) in chunks.iter().enumerate() {
            if index == 0 {
                text.push_str(chunk);
            } else {
                text.extend(chunk.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        let config = ChunkingConfig::default();
        assert!(split_text("", config).is_empty());
        assert!(split_text("   \n\n  ", config).is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let chunks = split_text("The sky is blue.", ChunkingConfig::default());
        assert_eq!(chunks, vec!["The sky is blue.".to_string()]);
    }

    #[test]
    fn paragraph_breaks_are_preferred() {
        let text = format!("{}\n\n{}\n\n{}", "a".repeat(400), "b".repeat(400), "c".repeat(400));
        let chunks = split_text(&text, ChunkingConfig::default());

        assert!(chunks.len() >= 2);
        assert!(chunks[0].ends_with("\n\n"));
        assert_eq!(chunks[0].chars().count(), 804);
    }

    #[test]
    fn sentence_ends_are_used_when_no_paragraph_fits() {
        let text = "This is sentence number one of the running text. ".repeat(40);
        let chunks = split_text(&text, ChunkingConfig::default());

        assert!(chunks.len() >= 2);
        assert!(chunks[0].ends_with(". "));
    }

    #[test]
    fn word_boundaries_are_the_next_fallback() {
        let text = "alpha beta gamma delta epsilon ".repeat(60);
        let chunks = split_text(&text, ChunkingConfig::default());

        assert!(chunks.len() >= 2);
        assert!(chunks[0].ends_with(' '));
    }

    #[test]
    fn unbroken_text_is_hard_cut_at_the_limit() {
        let text = "x".repeat(3_000);
        let chunks = split_text(&text, ChunkingConfig::default());

        assert!(chunks.len() >= 3);
        assert_eq!(chunks[0].chars().count(), 1_000);
    }

    #[test]
    fn chunks_respect_length_and_overlap_bounds() {
        let config = ChunkingConfig::default();
        let text = normalize_text(
            &"Hydraulic systems require regular inspection. Pressure must stay in range.\n\n"
                .repeat(50),
        );
        let chunks = split_text(&text, config);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= config.max_chars);
        }
        assert_eq!(reassemble(&chunks, config.overlap_chars), text);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let config = ChunkingConfig {
            max_chars: 50,
            overlap_chars: 10,
        };
        let text = "müşteri belgesi içindeki bölüm ".repeat(20);
        let chunks = split_text(&text, config);

        assert!(chunks.len() > 1);
        assert_eq!(reassemble(&chunks, config.overlap_chars), text);
    }

    #[test]
    fn normalization_unifies_line_endings_and_blank_runs() {
        let normalized = normalize_text("first\r\n\r\n\r\n\r\nsecond\u{a0}part\r");
        assert_eq!(normalized, "first\n\nsecond part");
    }
}
