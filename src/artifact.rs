//! The composited image on disk.
//!
//! An [`Artifact`] owns the JPEG it wrote. Dropping it removes the file, so
//! the image is cleaned up whether publishing succeeds, partially fails, or
//! the run bails out with an error. Marking it retained skips the removal.
//!
//! File names are content-addressed: the first 12 hex digits of a SHA-256 over
//! the tip text and the chosen background and font. Identical inputs hash to
//! the same name, so [`Artifact::write_unique`] claims the file with
//! `create_new` and falls back to `tip-{hex}-1.jpg`, `tip-{hex}-2.jpg`, ...
//! when the name is taken. A run never overwrites or deletes another run's
//! image.

use crate::imaging::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to write artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

pub const MEDIA_TYPE: &str = "image/jpeg";

/// Suffixed names tried before giving up on a taken base name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Content-addressed artifact file name.
pub fn artifact_file_name(tip: &str, background: &Path, font: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tip.as_bytes());
    hasher.update([0]);
    hasher.update(background.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(font.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..6].iter().map(|b| format!("{b:02x}")).collect();
    format!("tip-{hex}.jpg")
}

#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    retain: bool,
}

impl Artifact {
    /// Encode `image` as JPEG and write it to `path`, replacing any file there.
    ///
    /// The encoded bytes are kept in memory so publishers can upload them
    /// without re-reading the file.
    pub fn write(
        image: &RgbaImage,
        path: &Path,
        quality: Quality,
        retain: bool,
    ) -> Result<Self, ArtifactError> {
        let bytes = encode_jpeg(image, quality)?;
        create_parent(path)?;
        // Guard exists before the write so a partial file is also removed.
        let artifact = Self::guard(path.to_path_buf(), bytes, image, retain);
        fs::write(&artifact.path, &artifact.bytes).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = artifact.bytes.len(), "wrote artifact");
        Ok(artifact)
    }

    /// Encode `image` as JPEG into a file in `dir` that did not exist before.
    ///
    /// Starts from `file_name` and appends `-1`, `-2`, ... to its stem while
    /// the name is taken. An existing file is never opened for writing.
    pub fn write_unique(
        image: &RgbaImage,
        dir: &Path,
        file_name: &str,
        quality: Quality,
        retain: bool,
    ) -> Result<Self, ArtifactError> {
        let bytes = encode_jpeg(image, quality)?;
        fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(numbered_name(file_name, attempt));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(ArtifactError::Io { path, source }),
            };
            // Only guard a file this call created.
            let artifact = Self::guard(path, bytes, image, retain);
            file.write_all(&artifact.bytes)
                .map_err(|source| ArtifactError::Io {
                    path: artifact.path.clone(),
                    source,
                })?;
            tracing::debug!(
                path = %artifact.path.display(),
                bytes = artifact.bytes.len(),
                "wrote artifact"
            );
            return Ok(artifact);
        }

        Err(ArtifactError::Io {
            path: dir.join(file_name),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{MAX_NAME_ATTEMPTS} names already taken"),
            ),
        })
    }

    fn guard(path: PathBuf, bytes: Vec<u8>, image: &RgbaImage, retain: bool) -> Self {
        Self {
            path,
            bytes,
            width: image.width(),
            height: image.height(),
            retain,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &'static str {
        MEDIA_TYPE
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("tip.jpg")
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_retained(&self) -> bool {
        self.retain
    }

    pub fn retain(&mut self) {
        self.retain = true;
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if self.retain {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to remove artifact"),
        }
    }
}

fn create_parent(path: &Path) -> Result<(), ArtifactError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

/// `tip-ab.jpg` becomes `tip-ab-2.jpg` for attempt 2; attempt 0 is unchanged.
fn numbered_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{attempt}.{ext}"),
        None => format!("{file_name}-{attempt}"),
    }
}

fn encode_jpeg(image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, ArtifactError> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value()).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
