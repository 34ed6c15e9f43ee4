//! Streaming ZIP creation from a directory tree.
//!
//! Entries are named by their path relative to the source root; the root
//! directory itself never appears as an entry. File contents are streamed
//! into the writer in fixed-size chunks, so the archive never has to fit in
//! memory. Empty directories are preserved as explicit entries, non-empty
//! ones are implied by their children.

use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use walkdir::WalkDir;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::constants::{ARCHIVE_COMPRESSION_LEVEL, COMPRESSION_CHUNK_SIZE};
use crate::errors::PipelineError;

/// Compression options applied to every file entry. The level is a fixed
/// internal constant rather than a configuration knob.
fn file_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(ARCHIVE_COMPRESSION_LEVEL))
        .unix_permissions(0o644)
}

/// Compress the directory tree at `source` into a single ZIP file at `dest`,
/// returning the number of entries written.
///
/// Creates or overwrites `dest`. Any entry-level read error or output write
/// error aborts the whole operation as [`PipelineError::Archive`]; a partial
/// output file is left on disk for cleanup to remove. The archive is only
/// valid once the writer has been finalized and the output flushed, which
/// this function awaits before returning.
pub fn compress_dir(source: &Path, dest: &Path) -> Result<usize, PipelineError> {
    build_archive(source, dest).map_err(PipelineError::Archive)
}

fn build_archive(source: &Path, dest: &Path) -> Result<usize> {
    let out = fs::File::create(dest)
        .with_context(|| format!("Failed to create archive at {}", dest.display()))?;
    let mut zip = ZipWriter::new(out);
    let mut buffer = vec![0u8; COMPRESSION_CHUNK_SIZE];
    let mut entries = 0usize;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to walk directory {}", source.display()))?;
        let rel_path = entry
            .path()
            .strip_prefix(source)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();

        if entry.file_type().is_dir() {
            if dir_is_empty(entry.path())? {
                zip.add_directory(format!("{}/", rel_path), FileOptions::default())
                    .with_context(|| format!("Failed to add directory entry {}", rel_path))?;
                entries += 1;
                debug!("Added empty directory {}/", rel_path);
            }
        } else {
            zip.start_file(rel_path.clone(), file_options())
                .with_context(|| format!("Failed to start entry {}", rel_path))?;

            let file = fs::File::open(entry.path())
                .with_context(|| format!("Failed to open {}", entry.path().display()))?;
            let mut reader = BufReader::new(file);
            loop {
                let bytes_read = reader
                    .read(&mut buffer)
                    .with_context(|| format!("Failed to read from {}", entry.path().display()))?;
                if bytes_read == 0 {
                    break;
                }
                zip.write_all(&buffer[..bytes_read])
                    .with_context(|| format!("Failed to write entry {}", rel_path))?;
            }
            entries += 1;
            debug!("Compressed {}", rel_path);
        }
    }

    let mut out = zip.finish().context("Failed to finalize archive")?;
    out.flush().context("Failed to flush archive")?;

    info!(
        "Archive finalized at {} ({} entries)",
        dest.display(),
        entries
    );
    Ok(entries)
}

fn dir_is_empty(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory {}", path.display()))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;
    use zip::read::ZipArchive;

    fn entry_names(zip_path: &Path) -> Vec<String> {
        let file = fs::File::open(zip_path).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_entry_count_is_files_plus_empty_dirs() {
        let source = TempDir::new().unwrap();
        let base = source.path();
        fs::create_dir_all(base.join("sub/nested")).unwrap();
        fs::create_dir_all(base.join("empty1")).unwrap();
        fs::create_dir_all(base.join("empty2")).unwrap();
        fs::write(base.join("a.txt"), b"alpha").unwrap();
        fs::write(base.join("sub/b.txt"), b"beta").unwrap();
        fs::write(base.join("sub/nested/c.txt"), b"gamma").unwrap();

        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");
        let count = compress_dir(base, &zip_path).unwrap();

        // 3 files + 2 empty directories
        assert_eq!(count, 5);

        let names: HashSet<String> = entry_names(&zip_path).into_iter().collect();
        assert!(names.contains("a.txt"));
        assert!(names.contains("sub/b.txt"));
        assert!(names.contains("sub/nested/c.txt"));
        assert!(names.contains("empty1/"));
        assert!(names.contains("empty2/"));
    }

    #[test]
    fn test_root_directory_name_absent_from_entries() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("file.txt"), b"data").unwrap();

        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");
        compress_dir(source.path(), &zip_path).unwrap();

        let root_name = source
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        for name in entry_names(&zip_path) {
            assert!(
                !name.contains(&root_name),
                "Entry {} leaks the root directory name",
                name
            );
        }
    }

    #[test]
    fn test_round_trip_preserves_contents() {
        let source = TempDir::new().unwrap();
        let base = source.path();
        fs::create_dir_all(base.join("logs")).unwrap();
        fs::write(base.join("readme.md"), b"# readme\n").unwrap();
        fs::write(base.join("logs/app.log"), vec![0x42u8; 100_000]).unwrap();

        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");
        compress_dir(base, &zip_path).unwrap();

        let file = fs::File::open(&zip_path).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        for (name, original) in [
            ("readme.md", fs::read(base.join("readme.md")).unwrap()),
            ("logs/app.log", fs::read(base.join("logs/app.log")).unwrap()),
        ] {
            let mut entry = archive.by_name(name).unwrap();
            let mut extracted = Vec::new();
            entry.read_to_end(&mut extracted).unwrap();
            assert_eq!(extracted, original, "Contents differ for {}", name);
        }
    }

    #[test]
    fn test_empty_source_produces_empty_archive() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");

        let count = compress_dir(source.path(), &zip_path).unwrap();
        assert_eq!(count, 0);

        let file = fs::File::open(&zip_path).unwrap();
        let archive = ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_existing_output_is_overwritten() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("new.txt"), b"new").unwrap();

        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");
        fs::write(&zip_path, b"stale bytes that are not a zip").unwrap();

        compress_dir(source.path(), &zip_path).unwrap();

        let names = entry_names(&zip_path);
        assert_eq!(names, vec!["new.txt".to_string()]);
    }

    #[test]
    fn test_missing_source_fails_with_archive_error() {
        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("out.zip");

        let err = compress_dir(Path::new("/nonexistent/tree"), &zip_path).unwrap_err();
        assert!(matches!(err, PipelineError::Archive(_)));
        // The partial output file is left behind for cleanup.
        assert!(zip_path.exists());
    }
}
