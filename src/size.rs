// Human-readable byte sizes for progress lines and summaries.

use std::fmt;

/// Units above bytes; anything past GB is reported in TB.
const SCALED_UNITS: [&str; 3] = ["KB", "MB", "GB"];

/// Format a byte count with the largest unit that keeps the value below 1024.
///
/// Plain byte counts render as integers (`"512B"`). Scaled values are rounded
/// to two decimal places and keep at least one fractional digit, so
/// `1536` becomes `"1.5KB"` and `1 << 30` becomes `"1.0GB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes}B");
    }

    let mut value = bytes as f64 / 1024.0;
    for unit in SCALED_UNITS {
        if value < 1024.0 {
            return format!("{}{unit}", round2(value));
        }
        value /= 1024.0;
    }
    format!("{}TB", round2(value))
}

fn round2(value: f64) -> String {
    // Halfway cases go to the even digit: 1152 bytes is "1.12KB".
    let rounded = (value * 100.0).round_ties_even() / 100.0;
    // Debug keeps the trailing ".0" that Display drops.
    format!("{rounded:?}")
}

/// A before/after byte measurement for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChange {
    pub before: u64,
    pub after: u64,
}

impl SizeChange {
    pub fn new(before: u64, after: u64) -> Self {
        Self { before, after }
    }

    /// Bytes saved; zero when the file grew.
    pub fn saved(&self) -> u64 {
        self.before.saturating_sub(self.after)
    }

    /// `after / before`, or 1.0 for an empty input.
    pub fn ratio(&self) -> f64 {
        if self.before == 0 {
            1.0
        } else {
            self.after as f64 / self.before as f64
        }
    }

    pub fn shrank(&self) -> bool {
        self.after < self.before
    }
}

impl fmt::Display for SizeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            format_size(self.before),
            format_size(self.after)
        )
    }
}
