//! Validated path types for extraction.
//!
//! Entry names from an archive become filesystem paths only through
//! [`SafePath::validate`], and are only ever joined onto a canonical
//! [`DestDir`].

pub mod dest_dir;
pub mod safe_path;

pub use dest_dir::DestDir;
pub use safe_path::SafePath;
