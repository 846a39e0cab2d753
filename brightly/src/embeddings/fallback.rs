use sha2::{Digest, Sha256};

/// Deterministic offline embedder. Derives a vector from a SHA-256 hash of
/// the text by chaining digests until the target dimension is filled, each
/// byte normalized to `[0, 1]`.
///
/// Not semantically meaningful, but a pure function of the input text, so
/// the system stays available (degraded) when the remote model is not.
#[derive(Debug, Clone)]
pub struct FallbackEmbedder {
    dimensions: usize,
}

impl FallbackEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        if text.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut vec = Vec::with_capacity(self.dimensions);
        let mut prev: Vec<u8> = Sha256::digest(text.as_bytes()).to_vec();

        while vec.len() < self.dimensions {
            prev = Sha256::digest(&prev).to_vec();
            vec.extend(prev.iter().map(|b| *b as f32 / 255.0));
        }

        vec.truncate(self.dimensions);
        vec
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}
