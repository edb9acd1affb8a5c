//! Listing pipeline
//!
//! Turns raw directory entries into the ordered [`FileListing`] the
//! interface layer displays, and holds the currently published one.

pub mod decode;
pub mod pipeline;
pub mod store;
pub mod types;

pub use decode::{display_label, parse_captured_at};
pub use pipeline::{build_listing, is_media_file, MEDIA_EXTENSIONS};
pub use store::ListingStore;
pub use types::{FileListing, RemoteFile};
