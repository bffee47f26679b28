//! Background and font pools.
//!
//! Each pool is a flat directory listing taken once at startup. Selection is
//! uniform-random with replacement: nothing remembers which asset the previous
//! run used. The RNG is passed in so selection is reproducible under a seed.
//!
//! ## Directory Layout
//!
//! ```text
//! backgrounds/
//! ├── dusk.jpg
//! ├── grid.png
//! └── .DS_Store          # hidden files are ignored
//! fonts/
//! ├── Inter-Bold.ttf
//! └── Lora.otf
//! ```
//!
//! Subdirectories are not descended into. Files with unsupported extensions
//! are skipped; a pool with no usable file is an error.

use crate::config::AssetsConfig;
use crate::imaging::{FontSpec, RenderError};
use image::{DynamicImage, ImageFormat};
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("No usable {kind} found in {dir}")]
    PoolEmpty { kind: AssetKind, dir: PathBuf },
    #[error("Cannot list {dir}: {source}")]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to decode background {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Backgrounds,
    Fonts,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssetKind::Backgrounds => "backgrounds",
            AssetKind::Fonts => "fonts",
        })
    }
}

/// Background formats whose decoders are compiled in.
const BACKGROUND_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static BACKGROUND_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    BACKGROUND_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

impl AssetKind {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Backgrounds => &BACKGROUND_EXTENSIONS,
            AssetKind::Fonts => FONT_EXTENSIONS,
        }
    }
}

/// Immutable listing of one asset directory.
#[derive(Debug, Clone)]
pub struct AssetPool {
    kind: AssetKind,
    dir: PathBuf,
    entries: Vec<PathBuf>,
}

impl AssetPool {
    /// List `dir` (non-recursive), keeping files whose extension suits `kind`.
    ///
    /// Entries are sorted by file name so a seeded RNG picks the same file on
    /// every machine.
    pub fn scan(dir: &Path, kind: AssetKind) -> Result<Self, AssetError> {
        let extensions = kind.extensions();
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| AssetError::Walk {
                dir: dir.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() || is_hidden(entry.path()) {
                continue;
            }
            if has_extension(entry.path(), extensions) {
                entries.push(entry.into_path());
            }
        }

        if entries.is_empty() {
            return Err(AssetError::PoolEmpty {
                kind,
                dir: dir.to_path_buf(),
            });
        }
        tracing::debug!(%kind, dir = %dir.display(), count = entries.len(), "scanned asset pool");
        Ok(Self {
            kind,
            dir: dir.to_path_buf(),
            entries,
        })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick one entry uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Path {
        &self.entries[rng.gen_range(0..self.entries.len())]
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// A decoded background image, owned for the duration of one render.
#[derive(Debug, Clone)]
pub struct BackgroundAsset {
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl BackgroundAsset {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let image = image::open(path).map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Both pools plus the font size every selected font is loaded at.
#[derive(Debug, Clone)]
pub struct AssetSelector {
    backgrounds: AssetPool,
    fonts: AssetPool,
    font_size: f32,
}

impl AssetSelector {
    pub fn new(backgrounds: AssetPool, fonts: AssetPool, font_size: f32) -> Self {
        Self {
            backgrounds,
            fonts,
            font_size,
        }
    }

    /// Scan both configured directories.
    pub fn from_config(config: &AssetsConfig, font_size: f32) -> Result<Self, AssetError> {
        let backgrounds = AssetPool::scan(&config.backgrounds_dir, AssetKind::Backgrounds)?;
        let fonts = AssetPool::scan(&config.fonts_dir, AssetKind::Fonts)?;
        Ok(Self::new(backgrounds, fonts, font_size))
    }

    pub fn backgrounds(&self) -> &AssetPool {
        &self.backgrounds
    }

    pub fn fonts(&self) -> &AssetPool {
        &self.fonts
    }

    pub fn select_background<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<BackgroundAsset, AssetError> {
        let path = self.backgrounds.choose(rng);
        tracing::info!(background = %path.display(), "selected background");
        BackgroundAsset::load(path)
    }

    pub fn select_font<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FontSpec, RenderError> {
        let path = self.fonts.choose(rng);
        tracing::info!(font = %path.display(), size = self.font_size, "selected font");
        FontSpec::load(path, self.font_size)
    }
}
