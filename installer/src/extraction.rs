//! Archive extraction for downloaded release zips.
//!
//! Entries are written below a destination root in archive order. Paths that
//! would escape the root (absolute paths or `..` components) are rejected
//! before anything is written. On failure the paths already written are
//! returned alongside the error so callers can report or clean them up.

use log::{debug, trace};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Why an extraction stopped.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionFailure {
    /// The archive could not be opened or its directory read.
    #[error("cannot open archive {path}: {source}")]
    OpenArchive {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An entry header could not be read.
    #[error("cannot read archive entry #{index}: {source}")]
    ReadEntry {
        /// Zero-based position of the entry.
        index: usize,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {entry}")]
    PathTraversal {
        /// The offending entry name.
        entry: String,
    },

    /// A directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDirectory {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A destination file could not be created.
    #[error("cannot create file {path}: {source}")]
    CreateFile {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Copying an entry's content failed, including checksum mismatches.
    #[error("cannot extract {entry} to {path}: {source}")]
    WriteFile {
        /// The entry name inside the archive.
        entry: String,
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The entry's permission bits could not be applied.
    #[error("cannot set permissions on {path}: {source}")]
    SetPermissions {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// An aborted extraction together with the paths written before it stopped.
#[derive(Debug, thiserror::Error)]
#[error("extraction aborted after {} path(s) written: {failure}", .extracted.len())]
pub struct ExtractionError {
    /// Destination paths completed before the failure, in archive order.
    pub extracted: Vec<PathBuf>,
    /// The failure that stopped extraction.
    #[source]
    pub failure: ExtractionFailure,
}

impl ExtractionError {
    fn new(extracted: Vec<PathBuf>, failure: ExtractionFailure) -> Self {
        Self { extracted, failure }
    }
}

/// Trait for extracting artefact archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns every destination path written, files and directories, in
    /// archive order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] carrying the partial path list when any
    /// entry cannot be read, validated, or written.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Default extractor using the `zip` crate.
///
/// Validates each entry path before extraction to guard against
/// path traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let mut extracted = Vec::new();
        let open_failed = |source: zip::result::ZipError| ExtractionFailure::OpenArchive {
            path: archive_path.to_path_buf(),
            source,
        };

        let file = match File::open(archive_path) {
            Ok(file) => file,
            Err(e) => return Err(ExtractionError::new(extracted, open_failed(e.into()))),
        };
        let mut archive = match zip::ZipArchive::new(file) {
            Ok(archive) => archive,
            Err(e) => return Err(ExtractionError::new(extracted, open_failed(e))),
        };

        for index in 0..archive.len() {
            match extract_entry(&mut archive, index, dest_dir) {
                Ok(path) => {
                    trace!("extracted {}", path.display());
                    extracted.push(path);
                }
                Err(failure) => return Err(ExtractionError::new(extracted, failure)),
            }
        }

        debug!(
            "extracted {} entries from {} into {}",
            extracted.len(),
            archive_path.display(),
            dest_dir.display()
        );
        Ok(extracted)
    }
}

/// Write one entry and return its destination path.
fn extract_entry<R: io::Read + io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    index: usize,
    dest_dir: &Path,
) -> Result<PathBuf, ExtractionFailure> {
    let mut entry = archive
        .by_index(index)
        .map_err(|source| ExtractionFailure::ReadEntry { index, source })?;
    let name = entry.name().to_owned();

    let relative = Path::new(&name);
    validate_entry_path(relative)?;
    let dest_path = dest_dir.join(relative);

    if entry.is_dir() {
        create_dir_all(&dest_path)?;
        return Ok(dest_path);
    }

    if let Some(parent) = dest_path.parent() {
        create_dir_all(parent)?;
    }

    let mut out = File::create(&dest_path).map_err(|source| ExtractionFailure::CreateFile {
        path: dest_path.clone(),
        source,
    })?;
    io::copy(&mut entry, &mut out).map_err(|source| ExtractionFailure::WriteFile {
        entry: name.clone(),
        path: dest_path.clone(),
        source,
    })?;

    if let Some(mode) = entry.unix_mode() {
        apply_mode(&dest_path, mode)?;
    }

    Ok(dest_path)
}

fn create_dir_all(path: &Path) -> Result<(), ExtractionFailure> {
    fs::create_dir_all(path).map_err(|source| ExtractionFailure::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply the permission bits stored in the archive.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> Result<(), ExtractionFailure> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)).map_err(|source| {
        ExtractionFailure::SetPermissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> Result<(), ExtractionFailure> {
    Ok(())
}

/// Validate that an entry path does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionFailure> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionFailure::PathTraversal {
            entry: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    enum Entry<'a> {
        Dir(&'a str),
        File(&'a str, &'a [u8], u32),
    }

    fn build_zip(entries: &[Entry<'_>]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored =
            || SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for entry in entries {
            match entry {
                Entry::Dir(name) => writer
                    .add_directory(*name, stored().unix_permissions(0o755))
                    .expect("add directory"),
                Entry::File(name, content, mode) => {
                    writer
                        .start_file(*name, stored().unix_permissions(*mode))
                        .expect("start file");
                    writer.write_all(content).expect("write content");
                }
            }
        }
        writer.finish().expect("finish zip").into_inner()
    }

    fn write_archive(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("solr-8.5.1.zip");
        std::fs::write(&path, bytes).expect("write archive");
        path
    }

    #[test]
    fn round_trips_file_content_and_directories() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = write_archive(
            temp.path(),
            &build_zip(&[Entry::Dir("a/"), Entry::File("a/b.txt", b"hi", 0o644)]),
        );
        let dest = temp.path().join("D");

        let paths = ZipExtractor.extract(&archive, &dest).expect("extract");

        assert_eq!(paths, vec![dest.join("a"), dest.join("a/b.txt")]);
        assert_eq!(
            std::fs::read(dest.join("a/b.txt")).expect("read back"),
            b"hi"
        );
    }

    #[cfg(unix)]
    #[rstest]
    #[case::regular(0o644)]
    #[case::executable(0o755)]
    #[case::private(0o600)]
    fn preserves_mode_bits(#[case] mode: u32) {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("temp dir");
        let archive = write_archive(
            temp.path(),
            &build_zip(&[Entry::File("bin/solr", b"#!/bin/sh\n", mode)]),
        );
        let dest = temp.path().join("out");

        ZipExtractor.extract(&archive, &dest).expect("extract");

        let actual = std::fs::metadata(dest.join("bin/solr"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(actual & 0o777, mode);
    }

    #[test]
    fn creates_missing_parents_without_directory_entries() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = write_archive(
            temp.path(),
            &build_zip(&[Entry::File("solr-8.5.1/server/etc/jetty.xml", b"<x/>", 0o644)]),
        );
        let dest = temp.path().join("out");

        let paths = ZipExtractor.extract(&archive, &dest).expect("extract");

        assert_eq!(paths, vec![dest.join("solr-8.5.1/server/etc/jetty.xml")]);
        assert!(dest.join("solr-8.5.1/server/etc").is_dir());
    }

    #[test]
    fn rejects_parent_escape_without_writing() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = write_archive(
            temp.path(),
            &build_zip(&[Entry::File("../escape.txt", b"gotcha", 0o644)]),
        );
        let dest = temp.path().join("root");

        let err = ZipExtractor.extract(&archive, &dest).expect_err("should reject");

        assert!(matches!(
            err.failure,
            ExtractionFailure::PathTraversal { .. }
        ));
        assert!(err.extracted.is_empty());
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn returns_partial_paths_when_an_entry_is_corrupt() {
        const MARKER: &[u8] = b"entry-three-payload";
        let temp = tempfile::tempdir().expect("temp dir");
        let mut bytes = build_zip(&[
            Entry::File("one.txt", b"entry-one-payload", 0o644),
            Entry::File("two.txt", b"entry-two-payload", 0o644),
            Entry::File("three.txt", MARKER, 0o644),
            Entry::File("four.txt", b"entry-four-payload", 0o644),
            Entry::File("five.txt", b"entry-five-payload", 0o644),
        ]);
        let offset = bytes
            .windows(MARKER.len())
            .position(|w| w == MARKER)
            .expect("marker stored uncompressed");
        if let Some(byte) = bytes.get_mut(offset) {
            *byte ^= 0xFF;
        }
        let archive = write_archive(temp.path(), &bytes);
        let dest = temp.path().join("out");

        let err = ZipExtractor.extract(&archive, &dest).expect_err("should fail");

        assert_eq!(err.extracted, vec![dest.join("one.txt"), dest.join("two.txt")]);
        assert!(matches!(err.failure, ExtractionFailure::WriteFile { .. }));
        assert!(err.to_string().contains("after 2 path(s)"));
    }

    #[test]
    fn missing_archive_reports_open_failure() {
        let temp = tempfile::tempdir().expect("temp dir");
        let err = ZipExtractor
            .extract(&temp.path().join("absent.zip"), temp.path())
            .expect_err("should fail");
        assert!(matches!(err.failure, ExtractionFailure::OpenArchive { .. }));
        assert!(err.extracted.is_empty());
    }

    #[test]
    fn non_zip_input_reports_open_failure() {
        let temp = tempfile::tempdir().expect("temp dir");
        let archive = write_archive(temp.path(), b"<html>404 Not Found</html>");
        let err = ZipExtractor
            .extract(&archive, temp.path())
            .expect_err("should fail");
        assert!(matches!(err.failure, ExtractionFailure::OpenArchive { .. }));
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("foo/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let result = validate_entry_path(Path::new(bad_path));
        assert!(
            matches!(result, Err(ExtractionFailure::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[test]
    fn accepts_normal_paths() {
        assert!(validate_entry_path(Path::new("solr-8.5.1/bin/solr")).is_ok());
    }
}
