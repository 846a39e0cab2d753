mod snapshot;
mod vector;

pub use snapshot::{IndexSnapshot, IndexedPassage, ScoredPassage};
pub use vector::{VectorIndex, DEFAULT_TOP_K};
