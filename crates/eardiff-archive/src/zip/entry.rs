//! ZIP archive entry structures

use super::CompressionMethod;

/// General purpose flag bit 11, names are UTF-8
pub(crate) const UTF8_NAME_FLAG: u16 = 0x0800;

/// IBM code page 437, bytes 0x80..=0xFF
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// Decode a raw entry name
///
/// Names flagged as UTF-8 are decoded as UTF-8. Everything else, including
/// flagged names that are not valid UTF-8, is decoded as code page 437.
/// Both decodings map distinct byte strings to distinct strings.
pub(crate) fn decode_name(raw: &[u8], flags: u16) -> String {
    if flags & UTF8_NAME_FLAG != 0 {
        if let Ok(name) = std::str::from_utf8(raw) {
            return name.to_string();
        }
    }

    raw.iter()
        .map(|&b| match b {
            0x00..=0x7F => char::from(b),
            _ => CP437_HIGH[usize::from(b - 0x80)],
        })
        .collect()
}

/// Represents a single entry in a ZIP central directory
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// Full name within the archive
    pub name: String,
    /// Compression method used
    pub compression: CompressionMethod,
    /// CRC32 checksum of uncompressed data
    pub crc32: u32,
    /// Size of compressed data
    pub compressed_size: u64,
    /// Size of uncompressed data
    pub uncompressed_size: u64,
    /// Offset to local file header
    pub local_header_offset: u64,
    /// General purpose bit flags
    pub flags: u16,
    /// Whether entry is a directory
    pub is_directory: bool,
}

impl ZipEntry {
    /// Get the filename without path
    pub fn filename(&self) -> &str {
        self.name
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.name)
    }

    /// Get the file extension
    pub fn extension(&self) -> Option<&str> {
        if self.is_directory {
            return None;
        }

        let filename = self.filename();
        filename.rfind('.').map(|idx| &filename[idx + 1..])
    }

    /// Case-insensitive extension check, leading dot optional
    pub fn has_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false)
    }

    /// Whether the traditional encryption bit is set
    pub fn is_encrypted(&self) -> bool {
        self.flags & 0x01 != 0
    }
}
