//! Shared fakes and fixtures for pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use visioncloud_core::{Category, StorageBackend};
use visioncloud_processing::{Enhancer, ProcessingError};
use visioncloud_storage::{Storage, StorageError, StorageResult};

/// Minimal PNG whose header declares `width`×`height`.
///
/// Only the signature, IHDR and an empty IDAT are present, which is all a
/// header-only decoder reads. Keeps 4K-sized fixtures tiny.
pub fn png_header(width: u32, height: u32) -> Bytes {
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // bit depth 8, grayscale, deflate, adaptive filter, no interlace
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend(chunk(b"IHDR", &ihdr));
    png.extend(chunk(b"IDAT", &[0x78, 0x9C]));
    png.extend(chunk(b"IEND", &[]));
    Bytes::from(png)
}

fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc_input = kind.to_vec();
    crc_input.extend_from_slice(data);
    out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
    out
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// In-memory storage that records every put and can be told to fail
/// specific categories.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<(Category, String), Bytes>>,
    puts: Mutex<Vec<(Category, String)>>,
    failing: Mutex<HashSet<Category>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(categories: &[Category]) -> Self {
        let storage = Self::default();
        storage
            .failing
            .lock()
            .unwrap()
            .extend(categories.iter().copied());
        storage
    }

    pub fn object(&self, category: Category, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(category, key.to_string()))
            .cloned()
    }

    pub fn puts(&self) -> Vec<(Category, String)> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, category: Category, key: &str, data: Bytes) -> StorageResult<String> {
        self.puts.lock().unwrap().push((category, key.to_string()));
        if self.failing.lock().unwrap().contains(&category) {
            return Err(StorageError::UploadFailed(format!(
                "simulated outage for {}",
                category
            )));
        }
        self.objects
            .lock()
            .unwrap()
            .insert((category, key.to_string()), data);
        Ok(self.locator(category, key))
    }

    async fn get(&self, category: Category, key: &str) -> StorageResult<Bytes> {
        self.object(category, key)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", category, key)))
    }

    async fn list(&self, category: Category) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, category: Category, key: &str) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(category, key.to_string()));
        Ok(())
    }

    fn locator(&self, category: Category, key: &str) -> String {
        format!("mem://{}/{}", category, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub enum Behavior {
    /// Append `:x{scale}` to the input.
    Succeed,
    /// Fail as a non-zero exit with this diagnostic.
    Fail(&'static str),
    /// Block until cancelled.
    Hang,
}

/// Scripted enhancer that records the scale of every call.
pub struct FakeEnhancer {
    behavior: Behavior,
    calls: Mutex<Vec<u32>>,
}

impl FakeEnhancer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Enhancer for FakeEnhancer {
    async fn enhance(
        &self,
        cancel: &CancellationToken,
        data: Bytes,
        scale: u32,
    ) -> Result<Bytes, ProcessingError> {
        self.calls.lock().unwrap().push(scale);
        match self.behavior {
            Behavior::Succeed => {
                let mut out = data.to_vec();
                out.extend_from_slice(format!(":x{}", scale).as_bytes());
                Ok(Bytes::from(out))
            }
            Behavior::Fail(diagnostic) => Err(ProcessingError::ProcessExecution {
                exit: "exit status: 1".to_string(),
                diagnostic: diagnostic.to_string(),
            }),
            Behavior::Hang => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(ProcessingError::Cancelled),
                    _ = tokio::time::sleep(Duration::from_secs(60)) => {
                        panic!("enhancer was never cancelled")
                    }
                }
            }
        }
    }
}
