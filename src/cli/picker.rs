//! Interactive galaxy-file picker and data-directory resolution.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `rot` and choose a galaxy" UX
//!
//! The picker searches for `*_rotmod.dat` files under the data directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding data files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Resolve the data directory: `ROT_DATA_DIR` (env or `.env`), else `./data`.
pub fn data_dir() -> PathBuf {
    dotenvy::dotenv().ok();
    std::env::var("ROT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Discover `*_rotmod.dat` files under `dir` (sorted for determinism).
pub fn discover_rotmod_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(dir, DEFAULT_SEARCH_DEPTH, &mut files);
    files.sort();
    files
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth == 0 {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, depth - 1, out);
        } else if path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with("_rotmod.dat"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
}

/// Prompt the user to select a galaxy data file from the data directory.
///
/// Behavior:
/// - list discovered `*_rotmod.dat` files
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_data_file() -> Result<PathBuf, AppError> {
    let dir = data_dir();
    let files = discover_rotmod_files(&dir);
    if files.is_empty() {
        return Err(AppError::config(format!(
            "No *_rotmod.dat files found under '{}'. Run `rot fetch` to download the SPARC archive, \
             or pass `--synthetic` for the demo galaxy.",
            dir.display()
        )));
    }

    println!("Found {} galaxy file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!(
            "Select a galaxy by number (1-{}) or type a path (q to quit): ",
            files.len()
        );
        io::stdout()
            .flush()
            .map_err(|e| AppError::config(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::config(format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::config(
                "No input received. Provide a data file with `rot fit -f <file>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::config("Canceled."));
        }

        if let Ok(n) = input.parse::<usize>() {
            if (1..=files.len()).contains(&n) {
                return Ok(files[n - 1].clone());
            }
            println!("Out of range.");
            continue;
        }

        let path = PathBuf::from(input);
        if path.is_file() {
            return Ok(path);
        }
        println!("Not a file: {input}");
    }
}

fn pretty_path(path: &Path) -> String {
    path.strip_prefix(".")
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_rotmod_files_recursively_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sparc");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("B_rotmod.dat"), "x").unwrap();
        fs::write(nested.join("A_rotmod.dat"), "x").unwrap();
        fs::write(nested.join("notes.txt"), "x").unwrap();

        let files = discover_rotmod_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("B_rotmod.dat") || files[0].ends_with("sparc/A_rotmod.dat"));
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_directory_discovers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_rotmod_files(dir.path()).is_empty());
    }
}
