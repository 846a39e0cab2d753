pub mod admin;
pub mod ask;
pub mod auth;
pub mod documents;

pub use admin::*;
pub use ask::*;
pub use auth::*;
pub use documents::*;
