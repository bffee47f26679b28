//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! The tip is the headline. Assets, layout and the artifact are context
//! underneath it, and each platform gets exactly one line in the publish
//! section, failures included. Paths are secondary and always indented.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Tip
//!     Review AI-written code as carefully as a colleague's.
//!
//! Render
//!     Background: backgrounds/dusk.jpg
//!     Font: fonts/Inter-Bold.ttf
//!     001 Review AI-written code as (812×44 at 134,400)
//!     002 carefully as a colleague's. (790×46 at 145,454)
//!     Artifact: ./tip-3f9a1c0b22de.jpg (removed)
//!
//! Publish
//!     001 twitter: ok 1846213377
//!     002 bluesky: FAILED Missing credential: $BLUESKY_PASSWORD is not set
//!
//! Published to 1 of 2 platforms
//! ```
//!
//! ## Check
//!
//! ```text
//! Assets
//!     Backgrounds: 3 in backgrounds
//!     Fonts: 2 in fonts
//!
//! Platforms
//!     001 twitter: ready
//!     002 threads: unavailable (Not configured: ...)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assets::AssetSelector;
use crate::imaging::{LayoutLine, LayoutPlan};
use crate::pipeline::{Rendered, RunSummary};
use crate::publish::{PublishCapability, PublishOutcome, PublishReport};
use crate::tip::TipText;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// ```text
/// 001 Review AI-written code as (812×44 at 134,400)
/// ```
fn layout_line(index: usize, line: &LayoutLine) -> String {
    format!(
        "{}{} {} ({}×{} at {},{})",
        indent(1),
        format_index(index),
        line.text,
        line.width,
        line.height,
        line.x,
        line.y
    )
}

/// ```text
/// 001 twitter: ok 1846213377
/// 002 bluesky: FAILED HTTP 401 from ...
/// ```
fn outcome_line(index: usize, outcome: &PublishOutcome) -> String {
    let status = if outcome.success {
        match &outcome.post_id {
            Some(id) => format!("ok {id}"),
            None => "ok".to_string(),
        }
    } else {
        format!("FAILED {}", outcome.error.as_deref().unwrap_or("unknown error"))
    };
    format!(
        "{}{} {}: {}",
        indent(1),
        format_index(index),
        outcome.platform,
        status
    )
}

fn tip_section(tip: &TipText) -> Vec<String> {
    vec!["Tip".to_string(), format!("{}{}", indent(1), tip)]
}

fn render_section(
    background: &Path,
    font: &Path,
    plan: &LayoutPlan,
    artifact: &Path,
    retained: bool,
) -> Vec<String> {
    let mut lines = vec![
        "Render".to_string(),
        format!("{}Background: {}", indent(1), background.display()),
        format!("{}Font: {}", indent(1), font.display()),
    ];
    lines.extend(
        plan.lines
            .iter()
            .enumerate()
            .map(|(i, line)| layout_line(i + 1, line)),
    );
    let fate = if retained { "kept" } else { "removed" };
    lines.push(format!(
        "{}Artifact: {} ({fate})",
        indent(1),
        artifact.display()
    ));
    lines
}

fn publish_section(report: &PublishReport) -> Vec<String> {
    let mut lines = vec!["Publish".to_string()];
    if report.is_empty() {
        lines.push(format!("{}(no platforms configured)", indent(1)));
    }
    lines.extend(
        report
            .outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| outcome_line(i + 1, o)),
    );
    lines
}

// ============================================================================
// Run
// ============================================================================

pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = tip_section(&summary.tip);
    lines.push(String::new());
    lines.extend(render_section(
        &summary.background,
        &summary.font,
        &summary.plan,
        &summary.artifact_path,
        summary.retained,
    ));
    lines.push(String::new());
    lines.extend(publish_section(&summary.report));
    lines.push(String::new());
    lines.push(format!(
        "Published to {} of {} platforms",
        summary.report.succeeded().count(),
        summary.report.len()
    ));
    lines
}

/// Print run summary to stdout.
pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview
// ============================================================================

pub fn format_preview(tip: &TipText, rendered: &Rendered) -> Vec<String> {
    let mut lines = tip_section(tip);
    lines.push(String::new());
    lines.extend(render_section(
        &rendered.background,
        &rendered.font,
        &rendered.plan,
        rendered.artifact.path(),
        rendered.artifact.is_retained(),
    ));
    lines
}

/// Print preview output to stdout.
pub fn print_preview(tip: &TipText, rendered: &Rendered) {
    for line in format_preview(tip, rendered) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check(
    selector: &AssetSelector,
    platforms: &[Box<dyn PublishCapability>],
) -> Vec<String> {
    let mut lines = vec![
        "Assets".to_string(),
        format!(
            "{}Backgrounds: {} in {}",
            indent(1),
            selector.backgrounds().len(),
            selector.backgrounds().dir().display()
        ),
        format!(
            "{}Fonts: {} in {}",
            indent(1),
            selector.fonts().len(),
            selector.fonts().dir().display()
        ),
        String::new(),
        "Platforms".to_string(),
    ];
    if platforms.is_empty() {
        lines.push(format!("{}(no platforms configured)", indent(1)));
    }
    for (i, platform) in platforms.iter().enumerate() {
        let status = match platform.unavailable_reason() {
            None => "ready".to_string(),
            Some(reason) => format!("unavailable ({reason})"),
        };
        lines.push(format!(
            "{}{} {}: {}",
            indent(1),
            format_index(i + 1),
            platform.name(),
            status
        ));
    }
    lines
}

/// Print check output to stdout.
pub fn print_check(selector: &AssetSelector, platforms: &[Box<dyn PublishCapability>]) {
    for line in format_check(selector, platforms) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetKind, AssetPool};
    use crate::config::Platform;
    use crate::publish::{PostId, UnavailablePlatform};
    use crate::test_helpers::{RecordingPublisher, sample_artifact, write_background};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn plan() -> LayoutPlan {
        LayoutPlan {
            lines: vec![
                LayoutLine {
                    text: "Review AI code".into(),
                    word_count: 3,
                    width: 400,
                    height: 44,
                    x: 340,
                    y: 400,
                },
                LayoutLine {
                    text: "carefully.".into(),
                    word_count: 1,
                    width: 250,
                    height: 40,
                    x: 415,
                    y: 454,
                },
            ],
            start_y: 400,
            line_spacing: 10,
        }
    }

    fn summary(outcomes: Vec<PublishOutcome>) -> RunSummary {
        RunSummary {
            tip: TipText::new("Review AI code carefully.").unwrap(),
            background: PathBuf::from("backgrounds/dusk.jpg"),
            font: PathBuf::from("fonts/Inter.ttf"),
            plan: plan(),
            artifact_path: PathBuf::from("./tip-abc.jpg"),
            retained: false,
            report: PublishReport { outcomes },
        }
    }

    fn ok(platform: &str, id: &str) -> PublishOutcome {
        PublishOutcome {
            platform: platform.into(),
            success: true,
            post_id: Some(PostId(id.into())),
            error: None,
        }
    }

    fn failed(platform: &str, error: &str) -> PublishOutcome {
        PublishOutcome {
            platform: platform.into(),
            success: false,
            post_id: None,
            error: Some(error.into()),
        }
    }

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn layout_line_shows_geometry() {
        let line = &plan().lines[0];
        assert_eq!(layout_line(1, line), "    001 Review AI code (400×44 at 340,400)");
    }

    #[test]
    fn layout_line_negative_x() {
        let line = LayoutLine {
            text: "Pneumonoultramicroscopic".into(),
            word_count: 1,
            width: 1200,
            height: 50,
            x: -60,
            y: 400,
        };
        assert!(layout_line(1, &line).ends_with("at -60,400)"));
    }

    #[test]
    fn run_summary_full_output() {
        let lines = format_run_summary(&summary(vec![
            ok("twitter", "1846"),
            failed("bluesky", "Missing credential: $BLUESKY_PASSWORD is not set"),
        ]));
        assert_eq!(
            lines,
            vec![
                "Tip",
                "    Review AI code carefully.",
                "",
                "Render",
                "    Background: backgrounds/dusk.jpg",
                "    Font: fonts/Inter.ttf",
                "    001 Review AI code (400×44 at 340,400)",
                "    002 carefully. (250×40 at 415,454)",
                "    Artifact: ./tip-abc.jpg (removed)",
                "",
                "Publish",
                "    001 twitter: ok 1846",
                "    002 bluesky: FAILED Missing credential: $BLUESKY_PASSWORD is not set",
                "",
                "Published to 1 of 2 platforms",
            ]
        );
    }

    #[test]
    fn run_summary_without_platforms() {
        let lines = format_run_summary(&summary(vec![]));
        assert!(lines.contains(&"    (no platforms configured)".to_string()));
        assert_eq!(lines.last().unwrap(), "Published to 0 of 0 platforms");
    }

    #[test]
    fn retained_artifact_marked_kept() {
        let mut s = summary(vec![]);
        s.retained = true;
        let lines = format_run_summary(&s);
        assert!(lines.contains(&"    Artifact: ./tip-abc.jpg (kept)".to_string()));
    }

    #[test]
    fn preview_has_no_publish_section() {
        let tmp = TempDir::new().unwrap();
        let mut artifact = sample_artifact(tmp.path());
        artifact.retain();
        let rendered = Rendered {
            background: PathBuf::from("bg.png"),
            font: PathBuf::from("f.ttf"),
            plan: plan(),
            artifact,
        };
        let tip = TipText::new("Review AI code carefully.").unwrap();
        let lines = format_preview(&tip, &rendered);
        assert_eq!(lines[0], "Tip");
        assert!(lines.iter().all(|l| l != "Publish"));
        assert!(lines.last().unwrap().ends_with("sample.jpg (kept)"));
    }

    #[test]
    fn check_lists_pools_and_platform_readiness() {
        let tmp = TempDir::new().unwrap();
        let bg_dir = tmp.path().join("bg");
        let font_dir = tmp.path().join("fonts");
        fs::create_dir_all(&bg_dir).unwrap();
        fs::create_dir_all(&font_dir).unwrap();
        write_background(&bg_dir.join("a.png"), 4, 4);
        write_background(&bg_dir.join("b.png"), 4, 4);
        fs::write(font_dir.join("f.ttf"), b"font").unwrap();
        let selector = AssetSelector::new(
            AssetPool::scan(&bg_dir, AssetKind::Backgrounds).unwrap(),
            AssetPool::scan(&font_dir, AssetKind::Fonts).unwrap(),
            60.0,
        );
        let platforms: Vec<Box<dyn PublishCapability>> = vec![
            Box::new(RecordingPublisher::new("twitter")),
            Box::new(UnavailablePlatform::missing_credential(
                Platform::Bluesky,
                "BLUESKY_EMAIL",
            )),
        ];

        let lines = format_check(&selector, &platforms);
        assert_eq!(lines[0], "Assets");
        assert_eq!(lines[1], format!("    Backgrounds: 2 in {}", bg_dir.display()));
        assert_eq!(lines[2], format!("    Fonts: 1 in {}", font_dir.display()));
        assert_eq!(lines[5], "    001 twitter: ready");
        assert_eq!(
            lines[6],
            "    002 bluesky: unavailable (Missing credential: $BLUESKY_EMAIL is not set)"
        );
    }
}
