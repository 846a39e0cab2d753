mod conversation;
mod document;

pub use conversation::*;
pub use document::*;
