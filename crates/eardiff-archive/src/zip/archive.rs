//! ZIP archive container structure

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian};
use eardiff_core::{Error, Result};

use super::{read_central_directory, ZipCompression, ZipEntry, LOCAL_HEADER_SIGNATURE};

/// Size of the fixed local file header
const LOCAL_HEADER_SIZE: usize = 30;

/// Chunk size used when streaming entry data
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// An open ZIP archive: its central directory plus the reader to extract from
#[derive(Debug)]
pub struct ZipArchive<R> {
    reader: R,
    entries: Vec<ZipEntry>,
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Read the central directory of `reader`
    pub fn open(mut reader: R) -> Result<Self> {
        let entries = read_central_directory(&mut reader)?;
        Ok(Self { reader, entries })
    }

    /// All entries, in central directory order
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Get total number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stream of an entry's decompressed bytes
    pub fn entry_reader(&mut self, entry: &ZipEntry) -> Result<Box<dyn Read + '_>> {
        self.reader.seek(SeekFrom::Start(entry.local_header_offset))?;

        let mut local_header = [0u8; LOCAL_HEADER_SIZE];
        self.reader.read_exact(&mut local_header)?;

        let sig = LittleEndian::read_u32(&local_header[0..4]);
        if sig != LOCAL_HEADER_SIGNATURE {
            return Err(Error::InvalidMagic {
                expected: LOCAL_HEADER_SIGNATURE.to_le_bytes().to_vec(),
                found: sig.to_le_bytes().to_vec(),
            });
        }

        let name_len = LittleEndian::read_u16(&local_header[26..28]) as i64;
        let extra_len = LittleEndian::read_u16(&local_header[28..30]) as i64;

        // Skip to data
        self.reader.seek(SeekFrom::Current(name_len + extra_len))?;

        let raw = (&mut self.reader).take(entry.compressed_size);
        ZipCompression::decoder(raw, entry)
    }

    /// Decompress an entry into `writer`, verifying size and CRC-32
    ///
    /// Read-side failures surface as archive errors; failures of `writer`
    /// surface as [`Error::ExtractionFailed`].
    pub fn extract_to<W: Write>(&mut self, entry: &ZipEntry, writer: &mut W) -> Result<u64> {
        if entry.is_encrypted() {
            return Err(Error::EncryptedEntry {
                entry: entry.name.clone(),
            });
        }

        let mut decoder = self.entry_reader(entry)?;
        let mut hasher = crc32fast::Hasher::new();
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut written: u64 = 0;

        loop {
            let n = match decoder.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(Error::DecompressionFailed {
                        entry: entry.name.clone(),
                        message: e.to_string(),
                    })
                }
            };

            written += n as u64;
            if written > entry.uncompressed_size {
                return Err(Error::DecompressionFailed {
                    entry: entry.name.clone(),
                    message: format!(
                        "data exceeds declared size of {} bytes",
                        entry.uncompressed_size
                    ),
                });
            }

            hasher.update(&buffer[..n]);
            writer
                .write_all(&buffer[..n])
                .map_err(|e| Error::extraction(&entry.name, e.to_string()))?;
        }

        if written != entry.uncompressed_size {
            return Err(Error::DecompressionFailed {
                entry: entry.name.clone(),
                message: format!(
                    "size mismatch: expected {}, got {}",
                    entry.uncompressed_size, written
                ),
            });
        }

        let actual = hasher.finalize();
        if actual != entry.crc32 {
            return Err(Error::ChecksumMismatch {
                entry: entry.name.clone(),
                expected: entry.crc32,
                actual,
            });
        }

        writer
            .flush()
            .map_err(|e| Error::extraction(&entry.name, e.to_string()))?;

        Ok(written)
    }

    /// Decompress an entry into memory
    pub fn read_entry(&mut self, entry: &ZipEntry) -> Result<Vec<u8>> {
        let capacity = usize::try_from(entry.uncompressed_size).unwrap_or(usize::MAX);
        let mut data = Vec::with_capacity(capacity.min(COPY_BUFFER_SIZE * 16));
        self.extract_to(entry, &mut data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::ZipBuilder;
    use eardiff_core::ErrorKind as Kind;
    use std::io::Cursor;

    fn open(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::open(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_entries_in_directory_order() {
        let bytes = ZipBuilder::new()
            .directory("META-INF/")
            .stored("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n")
            .deflated("index.html", b"<html></html>")
            .build();

        let archive = open(bytes);
        let names: Vec<_> = archive.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["META-INF/", "META-INF/MANIFEST.MF", "index.html"]);
        assert!(archive.entries()[0].is_directory);
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_central_directory_crc() {
        let archive = open(ZipBuilder::new().stored("hello.txt", b"Hello, World!").build());
        assert_eq!(archive.entries()[0].crc32, 0xEC4AC3D0);
    }

    #[test]
    fn test_read_each_method() {
        let body = b"The same payload, compressed three different ways.".repeat(8);
        let mut archive = open(
            ZipBuilder::new()
                .stored("a.bin", &body)
                .deflated("b.bin", &body)
                .zstd("c.bin", &body)
                .build(),
        );

        let entries = archive.entries().to_vec();
        for entry in &entries {
            assert_eq!(archive.read_entry(entry).unwrap(), body, "{}", entry.name);
        }
    }

    #[test]
    fn test_empty_archive() {
        let archive = open(ZipBuilder::new().build());
        assert!(archive.is_empty());
    }

    #[test]
    fn test_archive_comment_is_skipped() {
        let archive = open(
            ZipBuilder::new()
                .stored("a.txt", b"a")
                .comment("built by release pipeline #42")
                .build(),
        );
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let mut archive = open(
            ZipBuilder::new()
                .stored_with_crc("bad.txt", b"payload", 0x1234_5678)
                .build(),
        );

        let entry = archive.entries()[0].clone();
        let err = archive.read_entry(&entry).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { expected: 0x1234_5678, .. }));
        assert_eq!(err.kind(), Kind::ArchiveUnreadable);
    }

    #[test]
    fn test_truncated_archive_is_unreadable() {
        let bytes = ZipBuilder::new().stored("a.txt", b"abc").build();
        let truncated = bytes[..bytes.len() - 10].to_vec();

        let err = ZipArchive::open(Cursor::new(truncated)).unwrap_err();
        assert_eq!(err.kind(), Kind::ArchiveUnreadable);
    }

    #[test]
    fn test_writer_failure_is_extraction_failure() {
        struct FullDisk;
        impl Write for FullDisk {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::Other, "no space left on device"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut archive = open(ZipBuilder::new().stored("a.txt", b"abc").build());
        let entry = archive.entries()[0].clone();
        let err = archive.extract_to(&entry, &mut FullDisk).unwrap_err();
        assert_eq!(err.kind(), Kind::ExtractionFailure);
    }

    #[test]
    fn test_encrypted_entry_refused() {
        let mut archive = open(ZipBuilder::new().stored("a.txt", b"abc").build());
        let mut entry = archive.entries()[0].clone();
        entry.flags |= 0x01;

        assert!(matches!(
            archive.read_entry(&entry),
            Err(Error::EncryptedEntry { .. })
        ));
    }
}
