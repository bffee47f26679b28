//! Pure placement arithmetic for the text layout.
//!
//! All functions here are pure and testable without fonts or images.

/// Horizontal offset that centers `content_width` inside `canvas_width`.
///
/// Uses floor division, so content wider than the canvas gets a negative
/// offset and overflows evenly on both sides (the extra odd pixel goes left).
///
/// # Examples
/// ```
/// # use tipcard::imaging::center_offset;
/// assert_eq!(center_offset(1080, 900), 90);
/// assert_eq!(center_offset(1080, 901), 89);
/// assert_eq!(center_offset(1080, 1181), -51);
/// ```
pub fn center_offset(canvas_width: u32, content_width: u32) -> i32 {
    let slack = i64::from(canvas_width) - i64::from(content_width);
    slack.div_euclid(2) as i32
}

/// Top edge of each stacked line.
///
/// Line `i` starts at `start_y + Σ_{j<i} (heights[j] + spacing)`.
///
/// # Examples
/// ```
/// # use tipcard::imaging::line_tops;
/// assert_eq!(line_tops(&[40, 44, 38], 400, 10), vec![400, 450, 504]);
/// ```
pub fn line_tops(heights: &[u32], start_y: i32, spacing: u32) -> Vec<i32> {
    let mut tops = Vec::with_capacity(heights.len());
    let mut y = i64::from(start_y);
    for &height in heights {
        tops.push(y as i32);
        y += i64::from(height) + i64::from(spacing);
    }
    tops
}
