//! Human-readable rendering of remaining time and progress.

/// Render milliseconds as `MM:SS`. Minutes are not wrapped into hours.
///
/// Partial seconds round up, so a tick that lands a little late (58_999 ms)
/// still reads `00:59` and only zero reads `00:00`.
pub fn remaining_time_string(ms: u64) -> String {
    let total_secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Fixed-width text progress bar, e.g. `[#####-----] 5/10`.
pub fn progress_bar(value: u64, max: u64, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((value.min(max) as u128 * width as u128) / max as u128) as usize
    };
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        value.min(max),
        max
    )
}
