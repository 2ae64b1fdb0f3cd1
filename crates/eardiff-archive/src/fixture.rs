//! In-memory ZIP builder for tests
//!
//! Produces minimal but well-formed archives (local headers, central
//! directory, end record) so tests can build nested bundles without
//! shipping binary fixtures.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::zip::{CompressionMethod, ZipCompression, CD_SIGNATURE, EOCD_SIGNATURE, LOCAL_HEADER_SIGNATURE};

/// 1980-01-01, the DOS epoch
const DOS_DATE: u16 = 0x0021;

/// Language encoding flag, names are UTF-8
const UTF8_FLAG: u16 = 0x0800;

struct FixtureEntry {
    name: Vec<u8>,
    flags: u16,
    method: CompressionMethod,
    crc32: u32,
    uncompressed_size: u32,
    payload: Vec<u8>,
    is_directory: bool,
}

/// Builder for archives used in tests
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<FixtureEntry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncompressed entry
    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        let crc = ZipCompression::crc32(data);
        self.push(name, CompressionMethod::Store, crc, data.len(), data.to_vec())
    }

    /// Add an uncompressed entry with a deliberately chosen CRC
    pub fn stored_with_crc(self, name: &str, data: &[u8], crc32: u32) -> Self {
        self.push(name, CompressionMethod::Store, crc32, data.len(), data.to_vec())
    }

    /// Add a DEFLATE-compressed entry
    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).expect("in-memory write");
        let payload = encoder.finish().expect("in-memory deflate");

        let crc = ZipCompression::crc32(data);
        self.push(name, CompressionMethod::Deflate, crc, data.len(), payload)
    }

    /// Add a Zstandard-compressed entry
    pub fn zstd(self, name: &str, data: &[u8]) -> Self {
        let payload = zstd::stream::encode_all(data, 3).expect("in-memory zstd");
        let crc = ZipCompression::crc32(data);
        self.push(name, CompressionMethod::Zstd, crc, data.len(), payload)
    }

    /// Add an uncompressed entry whose name bytes are written as-is, without the UTF-8 flag
    pub fn stored_legacy_name(mut self, name: &[u8], data: &[u8]) -> Self {
        self.entries.push(FixtureEntry {
            name: name.to_vec(),
            flags: 0,
            method: CompressionMethod::Store,
            crc32: ZipCompression::crc32(data),
            uncompressed_size: data.len() as u32,
            payload: data.to_vec(),
            is_directory: false,
        });
        self
    }

    /// Add an entry with an arbitrary method id and raw payload
    pub fn raw(self, name: &str, method: u16, crc32: u32, uncompressed_size: usize, payload: &[u8]) -> Self {
        self.push(name, CompressionMethod::from(method), crc32, uncompressed_size, payload.to_vec())
    }

    /// Add a directory entry, name should end with `/`
    pub fn directory(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry {
            name: name.as_bytes().to_vec(),
            flags: UTF8_FLAG,
            method: CompressionMethod::Store,
            crc32: 0,
            uncompressed_size: 0,
            payload: Vec::new(),
            is_directory: true,
        });
        self
    }

    /// Set the archive comment
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    fn push(
        mut self,
        name: &str,
        method: CompressionMethod,
        crc32: u32,
        uncompressed_size: usize,
        payload: Vec<u8>,
    ) -> Self {
        self.entries.push(FixtureEntry {
            name: name.as_bytes().to_vec(),
            flags: UTF8_FLAG,
            method,
            crc32,
            uncompressed_size: uncompressed_size as u32,
            payload,
            is_directory: false,
        });
        self
    }

    /// Serialize the archive
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            offsets.push(out.len() as u32);
            write_local_header(&mut out, entry);
            out.extend_from_slice(&entry.payload);
        }

        let cd_offset = out.len() as u32;
        for (entry, offset) in self.entries.iter().zip(&offsets) {
            write_cd_header(&mut out, entry, *offset);
        }
        let cd_size = out.len() as u32 - cd_offset;

        let count = self.entries.len() as u16;
        out.write_u32::<LittleEndian>(EOCD_SIGNATURE).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);

        out
    }
}

fn write_local_header(out: &mut Vec<u8>, entry: &FixtureEntry) {
    out.write_u32::<LittleEndian>(LOCAL_HEADER_SIGNATURE).unwrap();
    out.write_u16::<LittleEndian>(20).unwrap();
    out.write_u16::<LittleEndian>(entry.flags).unwrap();
    out.write_u16::<LittleEndian>(u16::from(entry.method)).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
    out.write_u32::<LittleEndian>(entry.crc32).unwrap();
    out.write_u32::<LittleEndian>(entry.payload.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
    out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.extend_from_slice(&entry.name);
}

fn write_cd_header(out: &mut Vec<u8>, entry: &FixtureEntry, offset: u32) {
    let external_attrs: u32 = if entry.is_directory { 0x10 } else { 0 };

    out.write_u32::<LittleEndian>(CD_SIGNATURE).unwrap();
    out.write_u16::<LittleEndian>(20).unwrap();
    out.write_u16::<LittleEndian>(20).unwrap();
    out.write_u16::<LittleEndian>(entry.flags).unwrap();
    out.write_u16::<LittleEndian>(u16::from(entry.method)).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
    out.write_u32::<LittleEndian>(entry.crc32).unwrap();
    out.write_u32::<LittleEndian>(entry.payload.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
    out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(external_attrs).unwrap();
    out.write_u32::<LittleEndian>(offset).unwrap();
    out.extend_from_slice(&entry.name);
}
