//! Recursive archive flattening
//!
//! Walks an archive in central directory order and emits one
//! [`Fingerprint`] per entry. Entries recognized as nested archives are
//! materialized, opened as child archives, and flattened in place, so the
//! child's fingerprints directly follow the fingerprint of the entry that
//! contains them.

use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

use eardiff_core::{Error, Fingerprint, QualifiedPath, Result, ResultExt};

use crate::logging::nested_span;
use crate::options::{ExtractionStrategy, ScanOptions};
use crate::source::FileSource;
use crate::zip::{ZipArchive, ZipEntry};

/// Flattened fingerprints of one archive file
#[derive(Debug, Clone)]
pub struct ArchiveTree {
    /// File the tree was built from
    pub source: PathBuf,
    /// Fingerprints in depth-first descent order, duplicates preserved
    pub fingerprints: Vec<Fingerprint>,
}

impl ArchiveTree {
    /// Number of fingerprints, nested entries included
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Whether the archive had no entries at all
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Fingerprints in descent order
    pub fn iter(&self) -> std::slice::Iter<'_, Fingerprint> {
        self.fingerprints.iter()
    }

    /// Entries that live inside a nested archive
    pub fn nested_count(&self) -> usize {
        self.fingerprints.iter().filter(|fp| fp.path.depth() > 0).count()
    }

    /// Consume the tree, keeping only its fingerprints
    pub fn into_fingerprints(self) -> Vec<Fingerprint> {
        self.fingerprints
    }
}

/// Recursive flattener bound to one set of scan options
pub struct Flattener<'a> {
    options: &'a ScanOptions,
}

impl<'a> Flattener<'a> {
    /// Create a flattener that scans with `options`
    pub fn new(options: &'a ScanOptions) -> Self {
        Self { options }
    }

    /// Flatten `archive`, prefixing every path with `prefix`
    ///
    /// Any failure aborts the whole walk; no partial list is returned.
    pub fn flatten<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        prefix: &QualifiedPath,
    ) -> Result<Vec<Fingerprint>> {
        let mut fingerprints = Vec::with_capacity(archive.len());
        self.flatten_into(archive, prefix, 0, &mut fingerprints)?;
        Ok(fingerprints)
    }

    fn flatten_into<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        prefix: &QualifiedPath,
        depth: u32,
        out: &mut Vec<Fingerprint>,
    ) -> Result<()> {
        let entries = archive.entries().to_vec();

        for entry in &entries {
            let path = prefix.child(entry.name.as_str());
            out.push(Fingerprint::new(path.clone(), entry.crc32));

            if self.options.is_nested_archive(entry) {
                self.descend(archive, entry, &path, depth + 1, out)
                    .with_context(|| format!("in nested archive {}", path))?;
            }
        }

        Ok(())
    }

    /// Materialize a nested archive and flatten it under `path`
    ///
    /// The extracted copy is owned by this call and released when it returns.
    fn descend<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        entry: &ZipEntry,
        path: &QualifiedPath,
        depth: u32,
        out: &mut Vec<Fingerprint>,
    ) -> Result<()> {
        if depth > self.options.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                entry: entry.name.clone(),
                limit: self.options.max_nesting_depth,
            });
        }

        let span = nested_span(&entry.name, depth);
        let _guard = span.enter();

        match self.options.strategy_for(entry) {
            ExtractionStrategy::Disk => self.descend_via_temp_file(archive, entry, path, depth, out),
            _ => self.descend_in_memory(archive, entry, path, depth, out),
        }
    }

    fn descend_in_memory<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        entry: &ZipEntry,
        path: &QualifiedPath,
        depth: u32,
        out: &mut Vec<Fingerprint>,
    ) -> Result<()> {
        if entry.uncompressed_size > self.options.memory_limit {
            return Err(Error::extraction(
                &entry.name,
                format!(
                    "{} bytes exceeds the in-memory limit of {} bytes",
                    entry.uncompressed_size, self.options.memory_limit
                ),
            ));
        }

        let bytes = archive.read_entry(entry)?;
        tracing::debug!(bytes = bytes.len(), "Extracted nested archive into memory");

        let mut child = ZipArchive::open(Cursor::new(bytes))?;
        self.flatten_into(&mut child, path, depth, out)
    }

    fn descend_via_temp_file<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        entry: &ZipEntry,
        path: &QualifiedPath,
        depth: u32,
        out: &mut Vec<Fingerprint>,
    ) -> Result<()> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("eardiff-").suffix(".nested");
        let created = match &self.options.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut temp = created.map_err(|e| Error::extraction(&entry.name, e.to_string()))?;

        let bytes = archive.extract_to(entry, temp.as_file_mut())?;
        tracing::debug!(bytes, temp = %temp.path().display(), "Extracted nested archive to disk");

        temp.as_file_mut()
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::extraction(&entry.name, e.to_string()))?;

        let mut child = ZipArchive::open(BufReader::new(temp.as_file()))?;
        self.flatten_into(&mut child, path, depth, out)
        // `temp` drops here and deletes the file, on success and on `?` exits alike
    }
}

/// Open and flatten one archive file
pub fn flatten_file(path: &Path, options: &ScanOptions) -> Result<ArchiveTree> {
    crate::log_scan_start!(path);
    let start = Instant::now();

    let result = FileSource::open(path, options)
        .and_then(ZipArchive::open)
        .and_then(|mut archive| Flattener::new(options).flatten(&mut archive, &QualifiedPath::root()));

    match result {
        Ok(fingerprints) => {
            crate::log_scan_complete!(path, start.elapsed(), fingerprints.len());
            Ok(ArchiveTree {
                source: path.to_path_buf(),
                fingerprints,
            })
        }
        Err(error) => {
            crate::log_scan_error!(path, error);
            Err(error.with_context(format!("scanning {}", path.display())))
        }
    }
}
