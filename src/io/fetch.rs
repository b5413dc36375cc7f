//! Download and extract the SPARC rotation-curve archive.
//!
//! The SPARC database publishes Newtonian mass models for 175 disk galaxies
//! as a zip of `*_rotmod.dat` files. `rot fetch` mirrors the archive into the
//! local data directory so every other subcommand can work offline.

use std::fs::{create_dir_all, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Newtonian mass models (Rotmod_LTG.zip) from the SPARC website.
pub const SPARC_ARCHIVE_URL: &str = "http://astroweb.cwru.edu/SPARC/Rotmod_LTG.zip";

/// Download the archive at `url` and extract all `*_rotmod.dat` members into
/// `dir`. Returns the number of extracted files.
pub fn fetch_sparc_archive(dir: &Path, url: &str) -> Result<usize, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::config(format!(
            "Failed to create data directory '{}': {e}",
            dir.display()
        ))
    })?;

    let response = reqwest::blocking::Client::new()
        .get(url)
        .send()
        .map_err(|e| AppError::runtime(format!("Download failed for {url}: {e}")))?
        .error_for_status()
        .map_err(|e| AppError::runtime(format!("Download failed for {url}: {e}")))?;

    let bytes = response
        .bytes()
        .map_err(|e| AppError::runtime(format!("Failed to read archive body: {e}")))?;

    extract_rotmod_files(dir, &bytes)
}

/// Extract `*_rotmod.dat` members of a zip archive into `dir`.
///
/// Member paths are flattened to their file names so a hostile archive cannot
/// write outside the data directory.
pub fn extract_rotmod_files(dir: &Path, archive_bytes: &[u8]) -> Result<usize, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| AppError::runtime(format!("Invalid zip archive: {e}")))?;

    let mut extracted = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| AppError::runtime(format!("Failed to read zip entry: {e}")))?;
        if entry.is_dir() {
            continue;
        }

        let Some(file_name) = entry_file_name(entry.name()) else {
            continue;
        };
        if !file_name.ends_with("_rotmod.dat") {
            continue;
        }

        let target = dir.join(&file_name);
        let mut out = File::create(&target).map_err(|e| {
            AppError::runtime(format!("Failed to create '{}': {e}", target.display()))
        })?;
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| AppError::runtime(format!("Failed to read zip entry: {e}")))?;
        std::io::Write::write_all(&mut out, &contents).map_err(|e| {
            AppError::runtime(format!("Failed to write '{}': {e}", target.display()))
        })?;
        extracted += 1;
    }

    if extracted == 0 {
        return Err(AppError::runtime(
            "Archive contained no *_rotmod.dat files.",
        ));
    }
    Ok(extracted)
}

fn entry_file_name(name: &str) -> Option<String> {
    let file_name = PathBuf::from(name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())?;
    // Reject anything that could still escape the target directory.
    (!file_name.is_empty() && !file_name.contains("..")).then_some(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            for (name, content) in entries {
                writer
                    .start_file(name.to_string(), SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn extracts_only_rotmod_members_and_flattens_paths() {
        let archive = build_archive(&[
            ("Rotmod_LTG/NGC5005_rotmod.dat", "# Distance = 16.9 Mpc\n"),
            ("Rotmod_LTG/README.txt", "not data"),
            ("NGC2403_rotmod.dat", "# Distance = 3.2 Mpc\n"),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let n = extract_rotmod_files(dir.path(), &archive).unwrap();
        assert_eq!(n, 2);
        assert!(dir.path().join("NGC5005_rotmod.dat").exists());
        assert!(dir.path().join("NGC2403_rotmod.dat").exists());
        assert!(!dir.path().join("README.txt").exists());
    }

    #[test]
    fn empty_archive_is_runtime_error() {
        let archive = build_archive(&[("README.txt", "nothing useful")]);
        let dir = tempfile::tempdir().unwrap();
        let err = extract_rotmod_files(dir.path(), &archive).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn invalid_zip_is_runtime_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_rotmod_files(dir.path(), b"definitely not a zip").unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
