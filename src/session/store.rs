//! The I/O boundary: where originals, staged previews, and finals live.
//!
//! The workflow never touches files directly. Everything goes through an
//! [`ImageStore`], so the same coordinator runs against the filesystem or
//! entirely in memory.

use crate::core::config::Config;
use crate::core::error::{StoreError, StoreResult};
use crate::core::types::{ImageFormat, ImageId};
use crate::workflow::record::StagedArtifact;
use image::DynamicImage;
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    /// Client-supplied file name; untrusted.
    pub filename: String,
    /// Raw encoded bytes.
    pub bytes: Vec<u8>,
}

impl UploadPayload {
    /// Create a payload.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a payload from disk, keeping only the file name.
    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let bytes = fs::read(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }
}

/// Storage used by the session coordinator.
pub trait ImageStore: Send + Sync {
    /// Check the extension, assign a fresh id, and keep the bytes.
    fn accept_upload(&self, payload: &UploadPayload) -> StoreResult<ImageId>;

    /// Decode the untouched original.
    fn load_original(&self, id: &ImageId) -> StoreResult<DynamicImage>;

    /// Keep a preview result, replacing any earlier one for the same image.
    fn save_staged(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<StagedArtifact>;

    /// Read back a staged preview.
    fn load_staged(&self, artifact: &StagedArtifact) -> StoreResult<DynamicImage>;

    /// Write a confirmed image to the export area.
    fn persist_final(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<()>;

    /// Release the original and any staged preview of an image that left
    /// its session. Exports are kept. Discarding an unknown id is a no-op.
    fn discard(&self, id: &ImageId) -> StoreResult<()>;
}

/// Strip directory components and anything outside `[A-Za-z0-9._-]`.
///
/// Whitespace becomes `_`; leading dots are dropped so the result can never
/// name a hidden file or a parent directory.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

fn check_upload(config: &Config, payload: &UploadPayload) -> StoreResult<String> {
    let name = sanitize_file_name(&payload.filename);
    if name.is_empty() || !config.accepts(&name) {
        return Err(StoreError::Rejected(payload.filename.clone()));
    }
    Ok(name)
}

// ============================================================================
// Filesystem store
// ============================================================================

/// Store backed by an upload directory and an output directory.
///
/// Originals are written as `<upload_dir>/<id>`, staged previews as
/// `<upload_dir>/temp_<id>`, finals as `<output_dir>/<id>`. The id keeps the
/// original extension, which selects the encoder.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    config: Config,
}

impl FsImageStore {
    /// Create the store and both directories.
    pub fn new(config: Config) -> StoreResult<Self> {
        for dir in [&config.upload_dir, &config.output_dir] {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.display().to_string(),
                source,
            })?;
        }
        debug!(
            "File store ready: uploads in {}, exports in {}",
            config.upload_dir.display(),
            config.output_dir.display()
        );
        Ok(Self { config })
    }

    /// Directory holding originals and staged previews.
    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    /// Directory receiving exports.
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Path of a stored original.
    pub fn original_path(&self, id: &ImageId) -> PathBuf {
        self.config.upload_dir.join(id.as_str())
    }

    /// Path of a staged preview.
    pub fn staged_path(&self, artifact: &StagedArtifact) -> PathBuf {
        self.config.upload_dir.join(artifact.name())
    }

    /// Path of an exported final.
    pub fn final_path(&self, id: &ImageId) -> PathBuf {
        self.config.output_dir.join(id.as_str())
    }

    fn open(path: &Path) -> StoreResult<DynamicImage> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        image::open(path).map_err(|source| StoreError::Image {
            name: path.display().to_string(),
            source,
        })
    }

    fn remove(path: &Path) -> StoreResult<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(StoreError::Io {
                path: path.display().to_string(),
                source: e,
            }),
            _ => Ok(()),
        }
    }

    fn write(path: &Path, image: &DynamicImage) -> StoreResult<()> {
        let format = ImageFormat::from_path(path);
        let encoding = format
            .to_image_format()
            .ok_or_else(|| StoreError::Rejected(path.display().to_string()))?;
        let result = match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, encoding),
            _ => image.save_with_format(path, encoding),
        };
        result.map_err(|source| StoreError::Image {
            name: path.display().to_string(),
            source,
        })
    }
}

impl ImageStore for FsImageStore {
    fn accept_upload(&self, payload: &UploadPayload) -> StoreResult<ImageId> {
        let name = check_upload(&self.config, payload)?;
        let id = ImageId::generate(&name);
        let path = self.original_path(&id);
        fs::write(&path, &payload.bytes).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(id)
    }

    fn load_original(&self, id: &ImageId) -> StoreResult<DynamicImage> {
        Self::open(&self.original_path(id))
    }

    fn save_staged(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<StagedArtifact> {
        let artifact = StagedArtifact::for_image(id);
        Self::write(&self.staged_path(&artifact), image)?;
        Ok(artifact)
    }

    fn load_staged(&self, artifact: &StagedArtifact) -> StoreResult<DynamicImage> {
        Self::open(&self.staged_path(artifact))
    }

    fn persist_final(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<()> {
        Self::write(&self.final_path(id), image)
    }

    fn discard(&self, id: &ImageId) -> StoreResult<()> {
        Self::remove(&self.staged_path(&StagedArtifact::for_image(id)))?;
        Self::remove(&self.original_path(id))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    config: Config,
    originals: RwLock<HashMap<ImageId, Vec<u8>>>,
    staged: RwLock<HashMap<StagedArtifact, DynamicImage>>,
    finals: RwLock<HashMap<ImageId, DynamicImage>>,
}

impl MemoryImageStore {
    /// Create an empty store accepting the default extensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every exported image, sorted.
    pub fn exported(&self) -> Vec<ImageId> {
        let mut ids: Vec<ImageId> = self.finals.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// A copy of an exported image.
    pub fn exported_image(&self, id: &ImageId) -> Option<DynamicImage> {
        self.finals.read().get(id).cloned()
    }

    /// Number of originals and staged previews currently held.
    pub fn held(&self) -> (usize, usize) {
        (self.originals.read().len(), self.staged.read().len())
    }

    /// Drop a staged preview, as if the file had been removed underneath us.
    pub fn discard_staged(&self, artifact: &StagedArtifact) -> bool {
        self.staged.write().remove(artifact).is_some()
    }
}

impl ImageStore for MemoryImageStore {
    fn accept_upload(&self, payload: &UploadPayload) -> StoreResult<ImageId> {
        let name = check_upload(&self.config, payload)?;
        let id = ImageId::generate(&name);
        self.originals.write().insert(id.clone(), payload.bytes.clone());
        Ok(id)
    }

    fn load_original(&self, id: &ImageId) -> StoreResult<DynamicImage> {
        let originals = self.originals.read();
        let bytes = originals
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        image::load_from_memory(bytes).map_err(|source| {
            warn!("Stored bytes for {} do not decode", id);
            StoreError::Image {
                name: id.to_string(),
                source,
            }
        })
    }

    fn save_staged(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<StagedArtifact> {
        let artifact = StagedArtifact::for_image(id);
        self.staged.write().insert(artifact.clone(), image.clone());
        Ok(artifact)
    }

    fn load_staged(&self, artifact: &StagedArtifact) -> StoreResult<DynamicImage> {
        self.staged
            .read()
            .get(artifact)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(artifact.to_string()))
    }

    fn persist_final(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<()> {
        self.finals.write().insert(id.clone(), image.clone());
        Ok(())
    }

    fn discard(&self, id: &ImageId) -> StoreResult<()> {
        self.staged.write().remove(&StagedArtifact::for_image(id));
        self.originals.write().remove(id);
        Ok(())
    }
}
