use anyhow::Context;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Extensions picked up when a directory is passed to `process`.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Initialize tracing for the CLI. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays parseable JSON.
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Expand the given paths into image files. Files are taken as-is; directories
/// contribute their direct entries with an image extension. Output is sorted
/// and deduplicated.
pub fn collect_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("Cannot access {}", path.display()))?;

        if meta.is_dir() {
            let entries = std::fs::read_dir(path)
                .with_context(|| format!("Cannot read directory {}", path.display()))?;
            for entry in entries {
                let entry_path = entry?.path();
                if entry_path.is_file() && has_image_extension(&entry_path) {
                    files.push(entry_path);
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Object key for a file: its file name.
pub fn object_key_for(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

/// Read every input into memory keyed by object key. Two inputs mapping to
/// the same key are rejected.
pub fn load_images(files: &[PathBuf]) -> anyhow::Result<HashMap<String, Bytes>> {
    let mut images = HashMap::with_capacity(files.len());

    for file in files {
        let key = object_key_for(file)?;
        let data =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        if images.insert(key.clone(), Bytes::from(data)).is_some() {
            anyhow::bail!("Duplicate object key '{}' ({})", key, file.display());
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn image_extension_filter() {
        assert!(has_image_extension(Path::new("a.png")));
        assert!(has_image_extension(Path::new("a.JPG")));
        assert!(has_image_extension(Path::new("dir/b.webp")));
        assert!(!has_image_extension(Path::new("a.gif")));
        assert!(!has_image_extension(Path::new("README")));
    }

    #[test]
    fn collect_inputs_filters_directories() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("one.png"), b"1").unwrap();
        std::fs::write(dir.path().join("two.jpeg"), b"2").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"3").unwrap();
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = collect_inputs(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("one.png"), dir.path().join("two.jpeg")]
        );
    }

    #[test]
    fn collect_inputs_keeps_explicit_files() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("scan.tiff");
        std::fs::write(&explicit, b"x").unwrap();

        let files = collect_inputs(&[explicit.clone(), explicit.clone()]).unwrap();

        assert_eq!(files, vec![explicit]);
    }

    #[test]
    fn collect_inputs_missing_path() {
        let dir = tempdir().unwrap();
        assert!(collect_inputs(&[dir.path().join("absent.png")]).is_err());
    }

    #[test]
    fn load_images_rejects_duplicate_keys() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        let first = dir.path().join("a/same.png");
        let second = dir.path().join("b/same.png");
        std::fs::write(&first, b"1").unwrap();
        std::fs::write(&second, b"2").unwrap();

        let single = load_images(std::slice::from_ref(&first)).unwrap();
        assert_eq!(single["same.png"], Bytes::from_static(b"1"));

        let err = load_images(&[first, second]).unwrap_err();
        assert!(err.to_string().contains("Duplicate object key"));
    }
}
