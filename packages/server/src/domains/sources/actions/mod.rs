//! Source domain actions
//!
//! JSON creation handles URL and NOTE sources; FILE and IMAGE sources come
//! in through the multipart upload.

mod sources;
mod upload;

pub use sources::{
    add_source, delete_source, download_source, list_sources, AddSourceInput, SourceDownload,
};
pub use upload::{upload_source, UploadInput};
