//! ZIP Archive Reader
//!
//! Reads the central directory of ZIP-based containers (JAR, WAR, EAR and
//! plain ZIP) and streams individual entries through their decompressor.
//!
//! # Format Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! |                         ZIP Archive                         |
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │        Local Headers + File Data (Compressed)           ││
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐                    ││
//! │  │  │ File 1  │ │ File 2  │ │ File N  │ ...                ││
//! │  │  └─────────┘ └─────────┘ └─────────┘                    ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │           Central Directory (Entries)                   ││
//! │  │  - name, method, CRC-32, sizes, local header offset     ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │            End of Central Directory                     ││
//! │  │  - Signature (0x06054B50)                               ││
//! │  │  - Central Directory offset                             ││
//! │  │  - Total entries count                                  ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod archive;
mod compression;
mod entry;

pub use archive::ZipArchive;
pub use compression::ZipCompression;
pub use entry::ZipEntry;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};
use eardiff_core::{Error, Result};

/// End of central directory signature
pub(crate) const EOCD_SIGNATURE: u32 = 0x06054B50;

/// Central directory file header signature
pub(crate) const CD_SIGNATURE: u32 = 0x02014B50;

/// Local file header signature
pub(crate) const LOCAL_HEADER_SIGNATURE: u32 = 0x04034B50;

/// ZIP64 end of central directory signature
const ZIP64_EOCD_SIGNATURE: u32 = 0x06064B50;

/// ZIP64 end of central directory locator signature
const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x07064B50;

/// Fixed part of the end of central directory record
const EOCD_SIZE: u64 = 22;

/// Maximum archive comment length
const MAX_COMMENT_SIZE: u64 = 65535;

/// Fixed part of a central directory file header
const CD_HEADER_SIZE: usize = 46;

/// Upper bound for pre-allocating the entry list
const MAX_PREALLOCATED_ENTRIES: u64 = 65536;

/// Compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Deflate,
    Zstd,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Store,
            8 => CompressionMethod::Deflate,
            93 => CompressionMethod::Zstd,
            other => CompressionMethod::Unknown(other),
        }
    }
}

impl From<CompressionMethod> for u16 {
    fn from(method: CompressionMethod) -> Self {
        match method {
            CompressionMethod::Store => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Zstd => 93,
            CompressionMethod::Unknown(other) => other,
        }
    }
}

/// End of Central Directory record
#[derive(Debug)]
struct EndOfCentralDirectory {
    total_entries: u64,
    cd_size: u64,
    cd_offset: u64,
}

/// Read every central directory entry, in directory order
pub(crate) fn read_central_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<ZipEntry>> {
    let eocd = parse_eocd(reader)?;
    tracing::trace!(
        entries = eocd.total_entries,
        cd_offset = eocd.cd_offset,
        cd_size = eocd.cd_size,
        "Located central directory"
    );

    reader.seek(SeekFrom::Start(eocd.cd_offset))?;

    let mut entries = Vec::with_capacity(eocd.total_entries.min(MAX_PREALLOCATED_ENTRIES) as usize);
    for _ in 0..eocd.total_entries {
        entries.push(parse_cd_entry(reader)?);
    }

    Ok(entries)
}

/// Parse the end of central directory record
fn parse_eocd<R: Read + Seek>(reader: &mut R) -> Result<EndOfCentralDirectory> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    if file_size < EOCD_SIZE {
        return Err(Error::unreadable(format!(
            "{} bytes is too small for a ZIP archive",
            file_size
        )));
    }

    // EOCD is at least 22 bytes, search within last 64KB for comment
    let search_start = file_size.saturating_sub(MAX_COMMENT_SIZE + EOCD_SIZE);
    reader.seek(SeekFrom::Start(search_start))?;

    let mut buffer = vec![0u8; (file_size - search_start) as usize];
    reader.read_exact(&mut buffer)?;

    let sig_bytes = EOCD_SIGNATURE.to_le_bytes();
    let last_candidate = buffer.len() - EOCD_SIZE as usize;
    let eocd_offset = buffer[..last_candidate + 4]
        .windows(4)
        .rposition(|w| w == sig_bytes)
        .ok_or_else(|| Error::InvalidMagic {
            expected: sig_bytes.to_vec(),
            found: vec![],
        })?;

    let eocd_data = &buffer[eocd_offset..eocd_offset + EOCD_SIZE as usize];
    let total_entries = LittleEndian::read_u16(&eocd_data[10..12]);
    let cd_size = LittleEndian::read_u32(&eocd_data[12..16]);
    let cd_offset = LittleEndian::read_u32(&eocd_data[16..20]);

    let eocd_abs_offset = search_start + eocd_offset as u64;

    if cd_offset == u32::MAX || cd_size == u32::MAX || total_entries == u16::MAX {
        if let Some(zip64) = parse_zip64_eocd(reader, eocd_abs_offset)? {
            return Ok(zip64);
        }
    }

    if u64::from(cd_offset) + u64::from(cd_size) > eocd_abs_offset {
        return Err(Error::unreadable(format!(
            "central directory at {} (+{} bytes) overlaps end record at {}",
            cd_offset, cd_size, eocd_abs_offset
        )));
    }

    Ok(EndOfCentralDirectory {
        total_entries: u64::from(total_entries),
        cd_size: u64::from(cd_size),
        cd_offset: u64::from(cd_offset),
    })
}

/// Parse ZIP64 end of central directory, if a locator precedes the EOCD
fn parse_zip64_eocd<R: Read + Seek>(
    reader: &mut R,
    eocd_offset: u64,
) -> Result<Option<EndOfCentralDirectory>> {
    if eocd_offset < 20 {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(eocd_offset - 20))?;
    let mut locator = [0u8; 20];
    reader.read_exact(&mut locator)?;

    if LittleEndian::read_u32(&locator[0..4]) != ZIP64_EOCD_LOCATOR_SIGNATURE {
        return Ok(None);
    }

    let zip64_eocd_offset = LittleEndian::read_u64(&locator[8..16]);
    reader.seek(SeekFrom::Start(zip64_eocd_offset))?;

    let mut zip64_eocd = [0u8; 56];
    reader.read_exact(&mut zip64_eocd)?;

    let sig = LittleEndian::read_u32(&zip64_eocd[0..4]);
    if sig != ZIP64_EOCD_SIGNATURE {
        return Err(Error::InvalidMagic {
            expected: ZIP64_EOCD_SIGNATURE.to_le_bytes().to_vec(),
            found: sig.to_le_bytes().to_vec(),
        });
    }

    Ok(Some(EndOfCentralDirectory {
        total_entries: LittleEndian::read_u64(&zip64_eocd[32..40]),
        cd_size: LittleEndian::read_u64(&zip64_eocd[40..48]),
        cd_offset: LittleEndian::read_u64(&zip64_eocd[48..56]),
    }))
}

/// Parse a single central directory entry
fn parse_cd_entry<R: Read>(reader: &mut R) -> Result<ZipEntry> {
    let mut header = [0u8; CD_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let sig = LittleEndian::read_u32(&header[0..4]);
    if sig != CD_SIGNATURE {
        return Err(Error::InvalidMagic {
            expected: CD_SIGNATURE.to_le_bytes().to_vec(),
            found: sig.to_le_bytes().to_vec(),
        });
    }

    let flags               = LittleEndian::read_u16(&header[8..10]);
    let compression         = CompressionMethod::from(LittleEndian::read_u16(&header[10..12]));
    let crc32               = LittleEndian::read_u32(&header[16..20]);
    let compressed_size     = LittleEndian::read_u32(&header[20..24]);
    let uncompressed_size   = LittleEndian::read_u32(&header[24..28]);
    let name_length         = LittleEndian::read_u16(&header[28..30]) as usize;
    let extra_length        = LittleEndian::read_u16(&header[30..32]) as usize;
    let comment_length      = LittleEndian::read_u16(&header[32..34]) as usize;
    let local_header_offset = LittleEndian::read_u32(&header[42..46]);

    // Name, extra field and comment follow back to back
    let mut variable = vec![0u8; name_length + extra_length + comment_length];
    reader.read_exact(&mut variable)?;

    let name = entry::decode_name(&variable[..name_length], flags);
    let extra = &variable[name_length..name_length + extra_length];

    let (compressed_size, uncompressed_size, local_header_offset) =
        parse_zip64_extra(extra, compressed_size, uncompressed_size, local_header_offset);

    Ok(ZipEntry {
        is_directory: name.ends_with('/'),
        name,
        compression,
        crc32,
        compressed_size,
        uncompressed_size,
        local_header_offset,
        flags,
    })
}

/// Apply the ZIP64 extended information extra field
///
/// Each 64-bit value is present only when its 32-bit header field is
/// saturated, in the order uncompressed, compressed, offset.
fn parse_zip64_extra(
    extra: &[u8],
    compressed_size: u32,
    uncompressed_size: u32,
    local_offset: u32,
) -> (u64, u64, u64) {
    let mut compressed = u64::from(compressed_size);
    let mut uncompressed = u64::from(uncompressed_size);
    let mut offset = u64::from(local_offset);

    let mut pos = 0;
    while pos + 4 <= extra.len() {
        let id = LittleEndian::read_u16(&extra[pos..pos + 2]);
        let size = LittleEndian::read_u16(&extra[pos + 2..pos + 4]) as usize;
        pos += 4;

        if pos + size > extra.len() {
            break;
        }

        if id == 0x0001 {
            let field = &extra[pos..pos + size];
            let mut field_pos = 0;
            let mut next = |current: &mut u64| {
                if field_pos + 8 <= field.len() {
                    *current = LittleEndian::read_u64(&field[field_pos..field_pos + 8]);
                    field_pos += 8;
                }
            };

            if uncompressed_size == u32::MAX {
                next(&mut uncompressed);
            }
            if compressed_size == u32::MAX {
                next(&mut compressed);
            }
            if local_offset == u32::MAX {
                next(&mut offset);
            }
            break;
        }

        pos += size;
    }

    (compressed, uncompressed, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_method_conversion() {
        assert_eq!(CompressionMethod::from(0), CompressionMethod::Store);
        assert_eq!(CompressionMethod::from(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from(93), CompressionMethod::Zstd);
        assert_eq!(CompressionMethod::from(12), CompressionMethod::Unknown(12));
        assert_eq!(u16::from(CompressionMethod::Unknown(12)), 12);
    }

    #[test]
    fn test_zip64_extra_only_saturated_fields() {
        let mut extra = vec![0x01, 0x00, 16, 0x00];
        extra.extend_from_slice(&5_000_000_000u64.to_le_bytes());
        extra.extend_from_slice(&9_000_000_000u64.to_le_bytes());

        let (compressed, uncompressed, offset) =
            parse_zip64_extra(&extra, 100, u32::MAX, u32::MAX);

        assert_eq!(uncompressed, 5_000_000_000);
        assert_eq!(compressed, 100);
        assert_eq!(offset, 9_000_000_000);
    }

    #[test]
    fn test_zip64_extra_skips_other_fields() {
        // Extended timestamp field followed by nothing relevant
        let extra = [0x55, 0x54, 0x05, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(parse_zip64_extra(&extra, 1, 2, 3), (1, 2, 3));
    }

    #[test]
    fn test_too_small_is_unreadable() {
        let mut reader = std::io::Cursor::new(vec![0u8; 10]);
        let err = read_central_directory(&mut reader).unwrap_err();
        assert_eq!(err.kind(), eardiff_core::ErrorKind::ArchiveUnreadable);
    }

    #[test]
    fn test_missing_eocd_is_invalid_magic() {
        let mut reader = std::io::Cursor::new(vec![0u8; 100]);
        assert!(matches!(
            read_central_directory(&mut reader),
            Err(Error::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_legacy_names_are_decoded_losslessly() {
        let bytes = crate::fixture::ZipBuilder::new()
            .stored_legacy_name(b"\xFF.txt", b"same")
            .stored_legacy_name(b"\xFE.txt", b"same")
            .stored("caf\u{e9}.txt", b"same")
            .build();

        let entries = read_central_directory(&mut std::io::Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["\u{A0}.txt", "■.txt", "café.txt"]);
    }
}
