//! Opening top-level archives from disk

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;

use eardiff_core::{Error, Result};

use crate::options::ScanOptions;

/// Readable handle on a top-level archive file
pub enum FileSource {
    /// Read-only memory map, used for large archives
    Mapped(Cursor<Mmap>),
    /// Buffered file reader
    Buffered(BufReader<File>),
}

impl FileSource {
    /// Open `path`, memory mapping it when the options allow and it is large enough
    pub fn open(path: &Path, options: &ScanOptions) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(Error::unreadable(format!("{} is a directory", path.display())));
        }

        if options.use_memory_mapping && metadata.len() >= options.memory_mapping_threshold {
            // SAFETY: the map is read-only and lives only for this scan; archives
            // being rewritten mid-comparison are outside what the tool supports.
            let map = unsafe { Mmap::map(&file)? };
            tracing::debug!(archive = %path.display(), bytes = metadata.len(), "Memory mapped archive");
            return Ok(FileSource::Mapped(Cursor::new(map)));
        }

        Ok(FileSource::Buffered(BufReader::new(file)))
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, FileSource::Mapped(_))
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileSource::Mapped(cursor) => cursor.read(buf),
            FileSource::Buffered(reader) => reader.read(buf),
        }
    }
}

impl Seek for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            FileSource::Mapped(cursor) => cursor.seek(pos),
            FileSource::Buffered(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::ZipBuilder;
    use crate::zip::ZipArchive;

    #[test]
    fn test_missing_file() {
        let err = FileSource::open(Path::new("/definitely/not/here.ear"), &ScanOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_mapped_and_buffered_read_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.ear");
        std::fs::write(&path, ZipBuilder::new().stored("a.txt", b"abc").build()).unwrap();

        let mapped_options = ScanOptions {
            memory_mapping_threshold: 0,
            ..ScanOptions::default()
        };
        let buffered_options = ScanOptions {
            use_memory_mapping: false,
            ..ScanOptions::default()
        };

        let mapped = FileSource::open(&path, &mapped_options).unwrap();
        let buffered = FileSource::open(&path, &buffered_options).unwrap();
        assert!(mapped.is_mapped());
        assert!(!buffered.is_mapped());

        let a = ZipArchive::open(mapped).unwrap();
        let b = ZipArchive::open(buffered).unwrap();
        assert_eq!(a.entries()[0].crc32, b.entries()[0].crc32);
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSource::open(dir.path(), &ScanOptions::default()).err().unwrap();
        assert_eq!(err.kind(), eardiff_core::ErrorKind::ArchiveUnreadable);
    }
}
