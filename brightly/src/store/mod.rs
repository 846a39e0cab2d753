mod mirror;
mod remote;

pub use mirror::{content_hash, manifest_fingerprint, DocumentMirror, HashManifest};
pub use remote::{normalize_object_name, DocumentStore, FsDocumentStore, HttpDocumentStore};
