//! Run orchestration.
//!
//! One run is strictly sequential:
//!
//! ```text
//! tip source ─► asset selector ─► layout ─► compose ─► artifact ─► fan-out
//! ```
//!
//! Every stage before the fan-out is fatal on error: the run aborts and
//! nothing is published. The fan-out itself never fails; its per-platform
//! outcomes land in the [`RunSummary`].
//!
//! ## Artifact Lifetime
//!
//! The [`Artifact`] is a drop guard over its file. It lives until the end of
//! [`Pipeline::run`], so the file is removed after the fan-out, after an
//! early return, and during unwinding alike. With `artifact.retain` set the
//! file is left in `artifact.dir`.

use crate::artifact::{Artifact, ArtifactError, artifact_file_name};
use crate::assets::{AssetError, AssetSelector};
use crate::config::{PipelineConfig, Secrets};
use crate::http::{HttpClient, HttpError, ReqwestClient};
use crate::imaging::{
    CanvasSpec, LayoutError, LayoutParams, LayoutPlan, Quality, RenderError, compose, layout,
};
use crate::publish::{FanOut, PublishCapability, PublishReport, build_platforms, publish_all};
use crate::tip::{OpenAiTipSource, StaticTipSource, TipError, TipSource, TipText};
use image::Rgba;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Tip generation failed: {0}")]
    TipGeneration(#[from] TipError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] HttpError),
}

/// Output of the render half of a run.
#[derive(Debug)]
pub struct Rendered {
    pub background: PathBuf,
    pub font: PathBuf,
    pub plan: LayoutPlan,
    pub artifact: Artifact,
}

/// What a completed run did. Publishing may have partially failed.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tip: TipText,
    pub background: PathBuf,
    pub font: PathBuf,
    pub plan: LayoutPlan,
    pub artifact_path: PathBuf,
    pub retained: bool,
    pub report: PublishReport,
}

pub struct Pipeline {
    config: PipelineConfig,
    selector: AssetSelector,
    tip_source: Box<dyn TipSource>,
    platforms: Vec<Box<dyn PublishCapability>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        selector: AssetSelector,
        tip_source: Box<dyn TipSource>,
        platforms: Vec<Box<dyn PublishCapability>>,
    ) -> Self {
        Self {
            config,
            selector,
            tip_source,
            platforms,
        }
    }

    /// Wire up the production collaborators.
    ///
    /// With `fixed_tip` the tip service is never contacted and needs no key.
    pub fn from_config(
        config: PipelineConfig,
        fixed_tip: Option<String>,
        secrets: &dyn Secrets,
    ) -> Result<Self, PipelineError> {
        let selector = AssetSelector::from_config(&config.assets, config.text.font_size)?;

        let tip_source: Box<dyn TipSource> = match fixed_tip {
            Some(text) => Box::new(StaticTipSource(text)),
            None => {
                let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::with_timeout(
                    Duration::from_secs(config.tip.timeout_secs),
                )?);
                Box::new(OpenAiTipSource::from_config(&config.tip, secrets, http)?)
            }
        };

        let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::with_timeout(
            Duration::from_secs(config.publish.timeout_secs),
        )?);
        let platforms = build_platforms(&config.publish, secrets, http);

        Ok(Self::new(config, selector, tip_source, platforms))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn platforms(&self) -> &[Box<dyn PublishCapability>] {
        &self.platforms
    }

    /// Ask the tip source for text.
    pub fn generate_tip(&self) -> Result<TipText, PipelineError> {
        let raw = self.tip_source.generate_tip()?;
        let tip = TipText::new(&raw)?;
        tracing::info!(tip = %tip, "generated tip");
        Ok(tip)
    }

    /// Select assets, lay out, compose and write the artifact.
    ///
    /// With `output` the artifact goes to that path and is always retained.
    /// Otherwise it gets a fresh content-addressed name in `artifact.dir` and
    /// follows `artifact.retain`.
    pub fn render<R: Rng + ?Sized>(
        &self,
        tip: &TipText,
        rng: &mut R,
        output: Option<&Path>,
    ) -> Result<Rendered, PipelineError> {
        let background = self.selector.select_background(rng)?;
        let font = self.selector.select_font(rng)?;

        let params = LayoutParams::from_config(&self.config);
        let plan = layout(tip.as_str(), &font, &params)?;
        for line in plan.overflowing(params.max_width) {
            tracing::warn!(
                word = %line.text,
                width = line.width,
                max = params.max_width,
                "word wider than wrap width"
            );
        }
        tracing::debug!(
            lines = plan.lines.len(),
            block_height = plan.block_height(),
            "laid out tip"
        );

        let [r, g, b] = self.config.text_rgb();
        let image = compose(
            &background.image,
            &plan,
            &font,
            Rgba([r, g, b, 255]),
            &CanvasSpec::from_config(&self.config),
        )?;

        let quality = Quality::new(self.config.artifact.quality);
        let artifact = match output {
            Some(path) => Artifact::write(&image, path, quality, true)?,
            None => Artifact::write_unique(
                &image,
                &self.config.artifact.dir,
                &artifact_file_name(tip.as_str(), &background.path, font.path()),
                quality,
                self.config.artifact.retain,
            )?,
        };
        tracing::info!(path = %artifact.path().display(), "rendered artifact");

        Ok(Rendered {
            background: background.path,
            font: font.path().to_path_buf(),
            plan,
            artifact,
        })
    }

    /// One full run: tip, render, publish everywhere, clean up.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunSummary, PipelineError> {
        let tip = self.generate_tip()?;
        let rendered = self.render(&tip, rng, None)?;

        let report = publish_all(
            &tip,
            &rendered.artifact,
            &self.platforms,
            FanOut::from_config(&self.config.publish),
        );
        tracing::info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "publish complete"
        );

        Ok(RunSummary {
            tip,
            background: rendered.background,
            font: rendered.font,
            plan: rendered.plan,
            artifact_path: rendered.artifact.path().to_path_buf(),
            retained: rendered.artifact.is_retained(),
            report,
        })
    }
}
