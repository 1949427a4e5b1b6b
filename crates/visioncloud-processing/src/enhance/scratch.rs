//! Ephemeral input/output file pair for the external enhancement tool.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INPUT_FILE: &str = "input.png";
const OUTPUT_FILE: &str = "output.png";

/// Private per-invocation directory inside the scratch directory holding the
/// tool's input and output files.
///
/// The directory and everything in it is removed when the guard is dropped,
/// on every exit path including a cancelled future. Concurrent invocations
/// sharing the scratch directory each get their own subdirectory.
#[derive(Debug)]
pub struct ScratchFiles {
    dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    /// Create the scratch directory if needed and reserve a fresh path pair.
    pub async fn allocate(scratch_dir: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(scratch_dir).await?;

        let dir = tempfile::Builder::new()
            .prefix("visioncloud-")
            .tempdir_in(scratch_dir)?;
        let input = dir.path().join(INPUT_FILE);
        let output = dir.path().join(OUTPUT_FILE);

        Ok(Self { dir, input, output })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_files_removed_on_drop() {
        let dir = tempdir().unwrap();
        let scratch = ScratchFiles::allocate(dir.path()).await.unwrap();

        tokio::fs::write(scratch.input(), b"in").await.unwrap();
        tokio::fs::write(scratch.output(), b"out").await.unwrap();
        let private = scratch.dir().to_path_buf();

        drop(scratch);

        assert!(!private.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_drop_without_files() {
        let dir = tempdir().unwrap();
        let scratch = ScratchFiles::allocate(dir.path()).await.unwrap();
        drop(scratch);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_allocate_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/visioncloud");
        let scratch = ScratchFiles::allocate(&nested).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(scratch.dir().parent(), Some(nested.as_path()));
        assert_eq!(scratch.input().parent(), Some(scratch.dir()));
        assert_eq!(scratch.output().file_name().unwrap(), "output.png");
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_unique() {
        let dir = tempdir().unwrap();
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let dir = dir.path().to_path_buf();
                tokio::spawn(async move { ScratchFiles::allocate(&dir).await.unwrap() })
            })
            .collect();

        let mut held = Vec::new();
        let mut seen = HashSet::new();
        for task in tasks {
            let scratch = task.await.unwrap();
            assert!(seen.insert(scratch.input().to_path_buf()));
            assert!(seen.insert(scratch.output().to_path_buf()));
            held.push(scratch);
        }
        assert_eq!(seen.len(), 128);

        drop(held);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
