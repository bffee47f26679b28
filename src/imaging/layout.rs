//! Greedy word-wrap layout.
//!
//! Turns an arbitrary-length tip into a [`LayoutPlan`]: an ordered list of
//! lines, each with its measured size and the top-left corner where the
//! compositor will draw it.
//!
//! ## Wrapping
//!
//! The text is split on whitespace. Words are appended to a candidate line one
//! at a time and the candidate is re-measured after each append. When the
//! measurement exceeds `max_width` and the candidate holds more than one word,
//! the last word is moved to a fresh line. A word that is too wide on its own
//! is kept whole: no hyphenation, no truncation, no clipping. Such a line is
//! the only kind allowed to exceed `max_width`.
//!
//! ## Placement
//!
//! - **Vertical**: lines stack from `start_y`, each followed by its own
//!   measured height plus `line_spacing`.
//! - **Horizontal**: every line is centered on its own, so a short last line
//!   sits in the middle rather than flush with the block's left edge.
//!
//! Layout is deterministic: the same text, measurer and parameters always
//! produce the same plan.

use super::calculations::{center_offset, line_tops};
use super::font::{TextExtent, TextMeasure};
use super::params::LayoutParams;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Tip text contains no words")]
    EmptyText,
}

/// One wrapped, positioned line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLine {
    /// Words joined by single spaces.
    pub text: String,
    pub word_count: usize,
    /// Measured ink width.
    pub width: u32,
    /// Measured ink height.
    pub height: u32,
    /// Left edge. Negative when the line is wider than the canvas.
    pub x: i32,
    /// Top edge.
    pub y: i32,
}

impl LayoutLine {
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split(' ')
    }
}

/// Fully resolved placement of every line for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub lines: Vec<LayoutLine>,
    pub start_y: i32,
    pub line_spacing: u32,
}

impl LayoutPlan {
    /// All words across all lines, in reading order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flat_map(LayoutLine::words)
    }

    /// Distance from the top of the first line to the bottom of the last.
    pub fn block_height(&self) -> u32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => (last.y - first.y) as u32 + last.height,
            _ => 0,
        }
    }

    /// Lines wider than `max_width`. Only single-word lines can appear here.
    pub fn overflowing(&self, max_width: u32) -> impl Iterator<Item = &LayoutLine> {
        self.lines.iter().filter(move |l| l.width > max_width)
    }
}

/// A wrapped line before placement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MeasuredLine {
    text: String,
    word_count: usize,
    extent: TextExtent,
}

/// Wrap `text` and position every line.
pub fn layout(
    text: &str,
    measure: &impl TextMeasure,
    params: &LayoutParams,
) -> Result<LayoutPlan, LayoutError> {
    let wrapped = wrap(text, measure, params.max_width)?;

    let heights: Vec<u32> = wrapped.iter().map(|l| l.extent.height).collect();
    let tops = line_tops(&heights, params.start_y, params.line_spacing);

    let lines = wrapped
        .into_iter()
        .zip(tops)
        .map(|(line, y)| LayoutLine {
            x: center_offset(params.canvas_width, line.extent.width),
            y,
            width: line.extent.width,
            height: line.extent.height,
            word_count: line.word_count,
            text: line.text,
        })
        .collect();

    Ok(LayoutPlan {
        lines,
        start_y: params.start_y,
        line_spacing: params.line_spacing,
    })
}

/// Greedy wrap. Each returned line carries the extent measured while it was
/// the candidate, so no line is measured twice.
fn wrap(
    text: &str,
    measure: &impl TextMeasure,
    max_width: u32,
) -> Result<Vec<MeasuredLine>, LayoutError> {
    let mut words = text.split_whitespace().peekable();
    if words.peek().is_none() {
        return Err(LayoutError::EmptyText);
    }

    let mut lines = Vec::new();
    let mut candidate: Vec<&str> = Vec::new();
    let mut candidate_extent = TextExtent::default();

    for word in words {
        candidate.push(word);
        let extent = measure.measure(&candidate.join(" "));

        if extent.width > max_width && candidate.len() > 1 {
            candidate.pop();
            lines.push(MeasuredLine {
                text: candidate.join(" "),
                word_count: candidate.len(),
                extent: candidate_extent,
            });
            candidate.clear();
            candidate.push(word);
            candidate_extent = measure.measure(word);
        } else {
            candidate_extent = extent;
        }
    }

    lines.push(MeasuredLine {
        text: candidate.join(" "),
        word_count: candidate.len(),
        extent: candidate_extent,
    });

    tracing::debug!(lines = lines.len(), max_width, "wrapped tip text");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FixedAdvance;

    const EXAMPLE_TIP: &str = "Use AI to draft, then edit with a human eye for clarity and tone.";

    fn params(max_width: u32) -> LayoutParams {
        LayoutParams {
            max_width,
            canvas_width: 1080,
            start_y: 400,
            line_spacing: 10,
        }
    }

    fn line_texts(plan: &LayoutPlan) -> Vec<&str> {
        plan.lines.iter().map(|l| l.text.as_str()).collect()
    }

    // =========================================================================
    // Wrapping
    // =========================================================================

    #[test]
    fn empty_text_fails() {
        let result = layout("", &FixedAdvance::default(), &params(900));
        assert_eq!(result, Err(LayoutError::EmptyText));
    }

    #[test]
    fn whitespace_only_text_fails() {
        let result = layout("  \n\t  ", &FixedAdvance::default(), &params(900));
        assert_eq!(result, Err(LayoutError::EmptyText));
    }

    #[test]
    fn narrow_text_is_single_line() {
        let plan = layout("Prompt with examples.", &FixedAdvance::default(), &params(900)).unwrap();
        assert_eq!(line_texts(&plan), vec!["Prompt with examples."]);
    }

    #[test]
    fn example_tip_wraps_into_two_or_three_lines() {
        // 65 chars × 12px = 780px fits 900px on one line, so narrow the wrap
        // width the way a 60px font would.
        let measure = FixedAdvance::new(24, 44);
        let plan = layout(EXAMPLE_TIP, &measure, &params(900)).unwrap();
        assert!(
            (2..=3).contains(&plan.lines.len()),
            "got {:?}",
            line_texts(&plan)
        );
        for line in &plan.lines {
            assert!(line.width <= 900);
            assert_eq!(line.x, center_offset(1080, line.width));
        }
    }

    #[test]
    fn greedy_wrap_breaks_at_exact_boundary() {
        // 10px per char; "aaaa bbbb" = 90px fits 90, adding " cccc" = 140px does not.
        let measure = FixedAdvance::new(10, 20);
        let plan = layout("aaaa bbbb cccc", &measure, &params(90)).unwrap();
        assert_eq!(line_texts(&plan), vec!["aaaa bbbb", "cccc"]);
        assert_eq!(plan.lines[0].width, 90);
        assert_eq!(plan.lines[1].width, 40);
    }

    #[test]
    fn width_equal_to_max_does_not_wrap() {
        let measure = FixedAdvance::new(10, 20);
        let plan = layout("abc def", &measure, &params(70)).unwrap();
        assert_eq!(plan.lines.len(), 1);
    }

    #[test]
    fn single_overlong_word_is_kept_whole() {
        let measure = FixedAdvance::new(12, 20);
        let word = "Supercalifragilisticexpialidocious".repeat(3);
        let plan = layout(&word, &measure, &params(300)).unwrap();
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].text, word);
        assert_eq!(plan.lines[0].word_count, 1);
        assert!(plan.lines[0].width > 300);
        assert!(plan.lines[0].x < 0, "overflowing line is not clipped");
    }

    #[test]
    fn overlong_word_mid_text_gets_its_own_line() {
        let measure = FixedAdvance::new(10, 20);
        let plan = layout("use averyveryverylongword here", &measure, &params(100)).unwrap();
        assert_eq!(
            line_texts(&plan),
            vec!["use", "averyveryverylongword", "here"]
        );
        let overflowing: Vec<&str> = plan.overflowing(100).map(|l| l.text.as_str()).collect();
        assert_eq!(overflowing, vec!["averyveryverylongword"]);
    }

    #[test]
    fn leading_trailing_and_repeated_whitespace_ignored() {
        let measure = FixedAdvance::new(10, 20);
        let plan = layout("  \n one   two\t\tthree \n\n", &measure, &params(1000)).unwrap();
        assert_eq!(line_texts(&plan), vec!["one two three"]);
    }

    #[test]
    fn embedded_newlines_are_not_honored() {
        let measure = FixedAdvance::new(10, 20);
        let plan = layout("first\nsecond", &measure, &params(1000)).unwrap();
        assert_eq!(line_texts(&plan), vec!["first second"]);
    }

    #[test]
    fn word_order_preserved() {
        let measure = FixedAdvance::new(13, 20);
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let plan = layout(text, &measure, &params(150)).unwrap();
        assert!(plan.lines.len() > 1);
        let words: Vec<&str> = plan.words().collect();
        let expected: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(words, expected);
        let counted: usize = plan.lines.iter().map(|l| l.word_count).sum();
        assert_eq!(counted, expected.len());
    }

    #[test]
    fn no_multi_word_line_exceeds_max_width() {
        let measure = FixedAdvance::new(11, 20);
        let text = "a bb ccc dddd eeeee ffffff ggggggg hhhhhhhh iiiiiiiii jjjjjjjjjj";
        let plan = layout(text, &measure, &params(120)).unwrap();
        for line in &plan.lines {
            if line.word_count > 1 {
                assert!(line.width <= 120, "line {:?} too wide", line.text);
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let measure = FixedAdvance::new(12, 30);
        let a = layout(EXAMPLE_TIP, &measure, &params(400)).unwrap();
        let b = layout(EXAMPLE_TIP, &measure, &params(400)).unwrap();
        assert_eq!(a, b);
    }

    // =========================================================================
    // Placement
    // =========================================================================

    #[test]
    fn lines_stack_from_start_y_with_spacing() {
        let measure = FixedAdvance::new(10, 30);
        let plan = layout("aaaa bbbb cccc", &measure, &params(40)).unwrap();
        let ys: Vec<i32> = plan.lines.iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![400, 440, 480]);
        assert_eq!(plan.start_y, 400);
        assert_eq!(plan.line_spacing, 10);
        assert_eq!(plan.block_height(), 110);
    }

    #[test]
    fn each_line_centered_independently() {
        let measure = FixedAdvance::new(10, 20);
        let plan = layout("aaaaaaaa bb", &measure, &params(90)).unwrap();
        assert_eq!(line_texts(&plan), vec!["aaaaaaaa", "bb"]);
        assert_eq!(plan.lines[0].x, (1080 - 80) / 2);
        assert_eq!(plan.lines[1].x, (1080 - 20) / 2);
    }

    #[test]
    fn single_line_plan_block_height_is_line_height() {
        let measure = FixedAdvance::new(10, 42);
        let plan = layout("short", &measure, &params(900)).unwrap();
        assert_eq!(plan.block_height(), 42);
    }
}
