//! Tile-aligned geometry and the Xenos framebuffer address permutation.
//!
//! The console stores the framebuffer as a raster of 32×32 macro-tiles.
//! Within a tile, pixels follow an interleaved bit permutation, and every
//! other 8-row band is additionally perturbed by an XOR. One wrong bit here
//! turns the picture into a checkerboard, so the permutation lives in
//! exactly one host function plus its WGSL twin in `convert.wgsl`, and the
//! host copy is the one the tests pin down. Keep the two expression-for-
//! expression identical.

use crate::error::{FbError, FbResult};

/// Round `x` up to the next multiple of 32, the macro-tile edge.
pub const fn tile_align(x: u32) -> u32 {
    (x + 31) & !31
}

/// Map a byte address in a hypothetical linear BGRA buffer of `width`
/// pixels to the slot where the tiled source actually stores that pixel.
///
/// `width` must be 32-aligned. The return value is a *pixel index* into the
/// u32 word view of the source buffer, not a byte offset.
pub const fn tiled_pixel_index(width: u32, addr: u32) -> u32 {
    let y = addr / (width * 4);
    let x = (addr % (width * 4)) / 4;
    let base = (y & !31) * width + (x & !31) * 32;
    let intra = (x & 3) + ((y & 1) << 2) + ((x & 28) << 1) + ((y & 30) << 5);
    let twist = (y & 8) << 2;
    base + (intra ^ twist)
}

/// Nearest-neighbor source texel for a display texel, integer truncation.
/// Mirrors the rescale in the conversion kernel.
pub const fn source_texel(
    dx: u32,
    dy: u32,
    tiled_w: u32,
    tiled_h: u32,
    res_w: u32,
    res_h: u32,
) -> (u32, u32) {
    (dx * tiled_w / res_w, dy * tiled_h / res_h)
}

/// Source and display geometry. `tiled_*` and `res_*` are 32-aligned by
/// construction; the address math relies on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbDims {
    pub internal_w: u32,
    pub internal_h: u32,
    pub tiled_w: u32,
    pub tiled_h: u32,
    pub res_w: u32,
    pub res_h: u32,
}

impl FbDims {
    pub fn new(internal_w: u32, internal_h: u32, display_w: u32, display_h: u32) -> FbResult<Self> {
        if internal_w == 0 || internal_h == 0 {
            return Err(FbError::geometry(format!(
                "source resolution must be nonzero, got {internal_w}x{internal_h}"
            )));
        }
        if display_w == 0 || display_h == 0 {
            return Err(FbError::geometry(format!(
                "display resolution must be nonzero, got {display_w}x{display_h}"
            )));
        }
        Ok(Self {
            internal_w,
            internal_h,
            tiled_w: tile_align(internal_w),
            tiled_h: tile_align(internal_h),
            res_w: tile_align(display_w),
            res_h: tile_align(display_h),
        })
    }

    /// Geometry with the display at the tile-aligned source size, so the
    /// rescale is the identity.
    pub fn native(internal_w: u32, internal_h: u32) -> FbResult<Self> {
        Self::new(
            internal_w,
            internal_h,
            tile_align(internal_w),
            tile_align(internal_h),
        )
    }

    /// Size of the source buffer in bytes.
    pub fn source_len_bytes(&self) -> usize {
        self.tiled_w as usize * self.tiled_h as usize * 4
    }

    /// Size of the source buffer in 32-bit pixel words.
    pub fn source_len_words(&self) -> usize {
        self.tiled_w as usize * self.tiled_h as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_align_rounds_up_to_32() {
        assert_eq!(tile_align(0), 0);
        assert_eq!(tile_align(1), 32);
        assert_eq!(tile_align(32), 32);
        assert_eq!(tile_align(33), 64);
        assert_eq!(tile_align(720), 736);
        assert_eq!(tile_align(1280), 1280);
    }

    fn index_of(width: u32, x: u32, y: u32) -> u32 {
        tiled_pixel_index(width, (y * width + x) * 4)
    }

    #[test]
    fn known_slots() {
        // Enumerated independently from the reference permutation.
        assert_eq!(index_of(1280, 0, 0), 0);
        assert_eq!(index_of(1280, 1, 0), 1);
        assert_eq!(index_of(1280, 0, 1), 4);
        assert_eq!(index_of(1280, 31, 31), 991);
        assert_eq!(index_of(1280, 32, 0), 1024);
        assert_eq!(index_of(1280, 0, 8), 288);
        assert_eq!(index_of(64, 5, 9), 301);
        assert_eq!(index_of(1280, 33, 40), 42273);
        assert_eq!(index_of(1280, 1279, 735), 942047);
    }

    #[test]
    fn deterministic() {
        for _ in 0..3 {
            assert_eq!(index_of(1312, 517, 21), index_of(1312, 517, 21));
        }
    }

    fn assert_bijection(width: u32, height: u32) {
        let mut seen = vec![false; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                let slot = index_of(width, x, y) as usize;
                assert!(
                    slot < seen.len(),
                    "({x},{y}) maps out of range: {slot} >= {}",
                    seen.len()
                );
                assert!(!seen[slot], "({x},{y}) aliases slot {slot}");
                seen[slot] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "{width}x{height} leaves holes");
    }

    #[test]
    fn bijective_over_single_band() {
        for width in [32, 64, 1280, 1312] {
            assert_bijection(width, 32);
        }
    }

    #[test]
    fn bijective_across_bands() {
        // Multiple 32-row bands, crossing the 8-row XOR boundaries.
        assert_bijection(64, 96);
        assert_bijection(32, 64);
    }

    #[test]
    fn rescale_is_identity_at_native_size() {
        let dims = FbDims::native(1280, 720).unwrap();
        assert_eq!(dims.tiled_w, 1280);
        assert_eq!(dims.tiled_h, 736);
        assert_eq!((dims.res_w, dims.res_h), (dims.tiled_w, dims.tiled_h));
        for (dx, dy) in [(0, 0), (1, 0), (639, 367), (1279, 735)] {
            assert_eq!(
                source_texel(dx, dy, dims.tiled_w, dims.tiled_h, dims.res_w, dims.res_h),
                (dx, dy)
            );
        }
    }

    #[test]
    fn rescale_truncates_toward_zero() {
        // 1280x736 source shown at 640x384: x halves exactly, y truncates.
        assert_eq!(source_texel(0, 0, 1280, 736, 640, 384), (0, 0));
        assert_eq!(source_texel(1, 1, 1280, 736, 640, 384), (2, 1));
        assert_eq!(source_texel(639, 383, 1280, 736, 640, 384), (1278, 734));
    }

    #[test]
    fn dims_validation() {
        assert!(FbDims::new(0, 720, 1280, 736).is_err());
        assert!(FbDims::new(1280, 720, 1280, 0).is_err());
        let dims = FbDims::new(1280, 720, 1270, 700).unwrap();
        // Display dims are aligned up on intake.
        assert_eq!((dims.res_w, dims.res_h), (1280, 704));
        assert_eq!(dims.source_len_bytes(), 1280 * 736 * 4);
        assert_eq!(dims.source_len_words(), 1280 * 736);
    }
}
