//! Host-side staging for the source framebuffer bytes.
//!
//! One allocation, made once at startup at the full tiled size and refilled
//! in place. Reads that come up short or fail outright never take the frame
//! loop down; the buffer always holds something displayable.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::warn;

use crate::tile::FbDims;

/// Fill pattern for a freshly allocated buffer: opaque dark grey, in the
/// on-wire BGRA byte order.
pub const FILL_BGRA: [u8; 4] = [0x1E, 0x1E, 0x1E, 0xFF];

pub struct SourceBuffer {
    bytes: Vec<u8>,
}

impl SourceBuffer {
    /// Allocate at the maximum required size for `dims`, prefilled grey.
    pub fn new(dims: &FbDims) -> Self {
        let mut bytes = vec![0u8; dims.source_len_bytes()];
        for px in bytes.chunks_exact_mut(4) {
            px.copy_from_slice(&FILL_BGRA);
        }
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Fill from any byte source. A short read leaves the tail at its
    /// previous contents. Returns the number of bytes read.
    pub fn load_from(&mut self, reader: &mut dyn Read) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Refresh from a file. Missing files, short reads, and read errors are
    /// logged and tolerated so the window stays responsive.
    pub fn load_file(&mut self, path: &Path) {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open framebuffer dump, keeping previous contents");
                return;
            }
        };
        match self.load_from(&mut file) {
            Ok(n) if n < self.bytes.len() => {
                warn!(path = %path.display(), read = n, expected = self.bytes.len(), "short framebuffer read, tail keeps previous contents");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "framebuffer read failed, keeping previous contents");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::FbDims;
    use std::io::Cursor;

    fn dims() -> FbDims {
        FbDims::native(64, 64).unwrap()
    }

    #[test]
    fn starts_dark_grey() {
        let buf = SourceBuffer::new(&dims());
        assert_eq!(buf.len(), 64 * 64 * 4);
        assert!(buf.bytes().chunks_exact(4).all(|px| px == FILL_BGRA));
    }

    #[test]
    fn full_read_replaces_everything() {
        let mut buf = SourceBuffer::new(&dims());
        let data = vec![0xABu8; buf.len()];
        let n = buf.load_from(&mut Cursor::new(data)).unwrap();
        assert_eq!(n, buf.len());
        assert!(buf.bytes().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn short_read_keeps_tail() {
        let mut buf = SourceBuffer::new(&dims());
        let half = buf.len() / 2;
        let n = buf.load_from(&mut Cursor::new(vec![0xCDu8; half])).unwrap();
        assert_eq!(n, half);
        assert!(buf.bytes()[..half].iter().all(|&b| b == 0xCD));
        assert!(buf.bytes()[half..].chunks_exact(4).all(|px| px == FILL_BGRA));
    }

    struct FailingReader;
    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn failed_read_keeps_previous_contents() {
        let mut buf = SourceBuffer::new(&dims());
        buf.load_from(&mut Cursor::new(vec![0x42u8; 64 * 64 * 4]))
            .unwrap();
        assert!(buf.load_from(&mut FailingReader).is_err());
        assert!(buf.bytes().iter().all(|&b| b == 0x42));
    }

    #[test]
    fn missing_file_is_tolerated() {
        let mut buf = SourceBuffer::new(&dims());
        buf.load_file(Path::new("definitely/not/here/fbmem.bin"));
        assert!(buf.bytes().chunks_exact(4).all(|px| px == FILL_BGRA));
    }
}
