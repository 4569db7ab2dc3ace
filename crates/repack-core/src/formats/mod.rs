//! Archive formats and default output locations.

pub mod detect;

pub use detect::ArchiveFormat;
pub use detect::default_extract_dir;
pub use detect::default_output_path;
pub use detect::detect_format;
