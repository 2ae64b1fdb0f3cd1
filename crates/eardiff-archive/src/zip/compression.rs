//! Compression handling for ZIP entries
//!
//! Supports the methods found in Java deployment archives:
//! - Store (no compression)
//! - Deflate (standard ZIP)
//! - ZStd (method 93)

use std::io::Read;

use eardiff_core::{Error, Result};

use super::{CompressionMethod, ZipEntry};

/// Handles decompression and integrity checks for ZIP entries
pub struct ZipCompression;

impl ZipCompression {
    /// Wrap the raw entry stream in the decoder for its compression method
    pub fn decoder<'a, R: Read + 'a>(reader: R, entry: &ZipEntry) -> Result<Box<dyn Read + 'a>> {
        match entry.compression {
            CompressionMethod::Store => Ok(Box::new(reader)),

            CompressionMethod::Deflate => Ok(Box::new(flate2::read::DeflateDecoder::new(reader))),

            CompressionMethod::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(reader).map_err(|e| {
                    Error::DecompressionFailed {
                        entry: entry.name.clone(),
                        message: format!("ZSTD decoder init failed: {}", e),
                    }
                })?;
                Ok(Box::new(decoder))
            }

            CompressionMethod::Unknown(method) => Err(Error::UnsupportedCompression {
                entry: entry.name.clone(),
                method,
            }),
        }
    }

    /// Calculate CRC32 checksum
    pub fn crc32(data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(method: CompressionMethod) -> ZipEntry {
        ZipEntry {
            name: "payload.bin".to_string(),
            compression: method,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset: 0,
            flags: 0,
            is_directory: false,
        }
    }

    fn decode(data: &[u8], method: CompressionMethod) -> Vec<u8> {
        let mut output = Vec::new();
        ZipCompression::decoder(data, &entry(method))
            .unwrap()
            .read_to_end(&mut output)
            .unwrap();
        output
    }

    #[test]
    fn test_store_passthrough() {
        assert_eq!(decode(b"Hello, World!", CompressionMethod::Store), b"Hello, World!");
    }

    #[test]
    fn test_deflate_decoding() {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"Hello, eardiff! This is a test of DEFLATE decoding.";
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode(&compressed, CompressionMethod::Deflate), original);
    }

    #[test]
    fn test_zstd_decoding() {
        let original = b"Hello, eardiff! This is a test of ZSTD decoding.";
        let compressed = zstd::stream::encode_all(&original[..], 3).unwrap();

        assert_eq!(decode(&compressed, CompressionMethod::Zstd), original);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let result = ZipCompression::decoder(&b""[..], &entry(CompressionMethod::Unknown(14)));
        assert!(matches!(result, Err(Error::UnsupportedCompression { method: 14, .. })));
    }

    #[test]
    fn test_crc32() {
        let data = b"Hello, World!";
        let crc = ZipCompression::crc32(data);
        assert_eq!(crc, 0xEC4AC3D0);
    }
}
