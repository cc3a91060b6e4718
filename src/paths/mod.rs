//! Source resolution and destination provisioning

pub mod destination;
pub mod source;

pub use destination::{fallback_dir_name, provision, FALLBACK_DIR_PREFIX};
pub use source::{is_supported_extension, resolve, SourceKind, SourceSet, SUPPORTED_EXTENSIONS};
