//! Session coordinator and its I/O boundary.

pub mod coordinator;
pub mod response;
pub mod store;

pub use coordinator::{
    parse_pipeline_body, parse_pipeline_value, CurrentImage, ExportFailure, ExportReport,
    SessionCoordinator,
};
pub use response::ApiResponse;
pub use store::{sanitize_file_name, FsImageStore, ImageStore, MemoryImageStore, UploadPayload};
