//! zlib (RFC 1950) inflation.

use std::io::Read;

use flate2::read::ZlibDecoder;
use kstream::{Error, Inflate, Result};
use tracing::trace;

/// Inflates a complete zlib stream held in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibInflate;

impl Inflate for ZlibInflate {
    fn inflate(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(input);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::CompressionError(e.to_string()))?;

        trace!(compressed = input.len(), inflated = out.len(), "zlib payload inflated");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{Compression, write::ZlibEncoder};

    use super::*;

    #[test]
    fn test_inflate_roundtrip() {
        let data = b"the quick brown fox ".repeat(20);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&data).unwrap();
        let packed = encoder.finish().unwrap();

        assert!(packed.len() < data.len());
        assert_eq!(ZlibInflate.inflate(&packed).unwrap(), data);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        assert!(matches!(
            ZlibInflate.inflate(b"not zlib").unwrap_err(),
            Error::CompressionError(_)
        ));
    }
}
