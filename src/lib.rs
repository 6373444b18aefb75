#![forbid(unsafe_code)]

pub mod convert;
pub mod error;
pub mod gpu;
pub mod source;
pub mod tile;
pub mod viewer;

pub use convert::{convert_frame, pack_argb, unpack_argb};
pub use error::{FbError, FbResult};
pub use source::SourceBuffer;
pub use tile::{FbDims, source_texel, tile_align, tiled_pixel_index};
pub use viewer::{ViewerConfig, run_viewer};
