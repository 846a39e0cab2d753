use unicode_segmentation::UnicodeSegmentation;

use crate::config::ProcessingConfig;
use crate::models::Passage;

/// Splits document text into overlapping passages around a character
/// budget, preferring sentence boundaries and falling back to hard cuts
/// for unbroken spans. Deterministic: the same text always yields the
/// same passage sequence.
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Produce the ordered passage sequence for one document.
    pub fn split(&self, document: &str, text: &str) -> Vec<Passage> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let sentences = self.split_into_sentences(text);
        let chunks = self.merge_sentences_into_chunks(sentences);

        chunks
            .into_iter()
            .enumerate()
            .map(|(seq, text)| Passage {
                document: document.to_string(),
                seq,
                text,
            })
            .collect()
    }

    fn split_into_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();

        for grapheme in text.graphemes(true) {
            current.push_str(grapheme);

            if self.is_sentence_boundary(&current) {
                let trimmed = current.trim().to_string();
                if !trimmed.is_empty() {
                    sentences.push(trimmed);
                }
                current.clear();
            }
        }

        if !current.trim().is_empty() {
            sentences.push(current.trim().to_string());
        }

        // A single sentence longer than the budget gets hard-cut so no
        // chunk ever exceeds the budget by more than one sentence.
        sentences
            .into_iter()
            .flat_map(|s| self.hard_cut(s))
            .collect()
    }

    fn is_sentence_boundary(&self, text: &str) -> bool {
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            return false;
        }

        // Line breaks end a sentence: paragraph boundaries win over
        // punctuation detection.
        if text.ends_with('\n') {
            return true;
        }

        let last_char = trimmed.chars().last().unwrap();
        if !matches!(last_char, '.' | '!' | '?') {
            return false;
        }

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if let Some(last_word) = words.last() {
            let abbreviations = [
                "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "vs.", "etc.", "i.e.", "e.g.",
                "No.", "Vol.", "Ch.", "Fig.", "Eq.", "Sec.", "Std.",
            ];

            if abbreviations.contains(last_word) {
                return false;
            }
        }

        true
    }

    fn hard_cut(&self, sentence: String) -> Vec<String> {
        if sentence.len() <= self.chunk_size {
            return vec![sentence];
        }

        let graphemes: Vec<&str> = sentence.graphemes(true).collect();
        let mut pieces = Vec::new();
        let mut piece = String::new();

        for g in graphemes {
            if piece.len() + g.len() > self.chunk_size && !piece.is_empty() {
                pieces.push(std::mem::take(&mut piece));
            }
            piece.push_str(g);
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }

        pieces
    }

    fn merge_sentences_into_chunks(&self, sentences: Vec<String>) -> Vec<String> {
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current_chunk = String::new();
        let mut current_sentences: Vec<String> = Vec::new();

        for sentence in sentences {
            let potential_length = if current_chunk.is_empty() {
                sentence.len()
            } else {
                current_chunk.len() + 1 + sentence.len()
            };

            if potential_length > self.chunk_size && !current_chunk.is_empty() {
                chunks.push(current_chunk.clone());

                let overlap_sentences = self.get_overlap_sentences(&current_sentences);
                current_chunk = overlap_sentences.join(" ");
                current_sentences = overlap_sentences;
            }

            if !current_chunk.is_empty() {
                current_chunk.push(' ');
            }
            current_chunk.push_str(&sentence);
            current_sentences.push(sentence);
        }

        if !current_chunk.is_empty() {
            chunks.push(current_chunk);
        }

        chunks
    }

    /// Trailing sentences carried into the next chunk so nothing spanning
    /// a boundary is lost to both neighbors.
    fn get_overlap_sentences(&self, sentences: &[String]) -> Vec<String> {
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut overlap_text_len = 0;
        let mut overlap_sentences = Vec::new();

        for sentence in sentences.iter().rev() {
            if overlap_text_len + sentence.len() > self.chunk_overlap
                && !overlap_sentences.is_empty()
            {
                break;
            }
            overlap_text_len += sentence.len() + 1;
            overlap_sentences.push(sentence.clone());
        }

        overlap_sentences.reverse();
        overlap_sentences
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 150,
        }
    }
}
