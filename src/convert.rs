//! CPU reference converter.
//!
//! De-swizzles a tiled source buffer into linear top-down RGBA8 rows at the
//! display resolution. The GPU kernel is the production path; this is the
//! oracle the tests check the address math against, and the engine behind
//! the headless `dump` subcommand.

use crate::error::{FbError, FbResult};
use crate::tile::{FbDims, source_texel, tiled_pixel_index};

/// Pack channels into the pixel word as seen through the little-endian u32
/// view of the source bytes: A in the high byte, then R, G, B.
pub const fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Inverse of [`pack_argb`]: `(r, g, b, a)`.
pub const fn unpack_argb(word: u32) -> (u8, u8, u8, u8) {
    (
        ((word >> 16) & 0xFF) as u8,
        ((word >> 8) & 0xFF) as u8,
        (word & 0xFF) as u8,
        ((word >> 24) & 0xFF) as u8,
    )
}

/// Convert a tiled source buffer to linear RGBA8 at `res_w × res_h`.
///
/// `src` must be exactly `tiled_w * tiled_h * 4` bytes of BGRA pixel data in
/// the tiled layout. Alpha passes through unchanged; callers that feed
/// hardware dumps usually force it opaque afterwards.
pub fn convert_frame(src: &[u8], dims: &FbDims) -> FbResult<Vec<u8>> {
    if src.len() != dims.source_len_bytes() {
        return Err(FbError::geometry(format!(
            "source buffer is {} bytes, geometry needs {}",
            src.len(),
            dims.source_len_bytes()
        )));
    }

    let (tiled_w, tiled_h) = (dims.tiled_w, dims.tiled_h);
    let (res_w, res_h) = (dims.res_w, dims.res_h);
    let mut out = vec![0u8; res_w as usize * res_h as usize * 4];

    for dy in 0..res_h {
        for dx in 0..res_w {
            let (sx, sy) = source_texel(dx, dy, tiled_w, tiled_h, res_w, res_h);
            let slot = tiled_pixel_index(tiled_w, (sy * tiled_w + sx) * 4) as usize * 4;
            // Source bytes are [B, G, R, A]; output rows are [R, G, B, A].
            let dst = (dy as usize * res_w as usize + dx as usize) * 4;
            out[dst] = src[slot + 2];
            out[dst + 1] = src[slot + 1];
            out[dst + 2] = src[slot];
            out[dst + 3] = src[slot + 3];
        }
    }
    Ok(out)
}
