//! Shared object address generation for storage backends.
//!
//! Address format: `{category}/{key}`.

use visioncloud_core::Category;

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape their category prefix.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    // Dots are fine inside a file name; only whole `.`/`..` segments navigate.
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains an invalid path segment: {}",
            key
        )));
    }
    Ok(())
}

/// Full object address for `key` in `category`.
pub fn object_key(category: Category, key: &str) -> StorageResult<String> {
    validate_key(key)?;
    Ok(format!("{}/{}", category.as_str(), key))
}

/// Listing prefix for `category`, with trailing slash.
pub fn category_prefix(category: Category) -> String {
    format!("{}/", category.as_str())
}
