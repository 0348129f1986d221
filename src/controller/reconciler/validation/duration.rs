//! # Duration Validation
//!
//! Parses `refreshInterval` duration strings.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_FORMAT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(\d+(\.\d+)?(ms|s|m|h|d))+$"));

static DURATION_COMPONENT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?P<number>\d+(?:\.\d+)?)(?P<unit>ms|s|m|h|d)"));

/// Parse a Kubernetes duration string into std::time::Duration
///
/// Supports single and compound forms: "30s", "10m", "1h30m", "1.5h", "500ms", "1d"
pub fn parse_kubernetes_duration(duration_str: &str) -> Result<Duration> {
    let duration_trimmed = duration_str.trim();

    if duration_trimmed.is_empty() {
        return Err(anyhow::anyhow!("Duration string cannot be empty"));
    }

    let format = DURATION_FORMAT
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;
    let component = DURATION_COMPONENT
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    let interval_lower = duration_trimmed.to_lowercase();
    if !format.is_match(&interval_lower) {
        return Err(anyhow::anyhow!(
            "Invalid duration format '{}'. Expected <number><unit>[<number><unit>...] with units ms, s, m, h, d (e.g., '10m', '1h30m')",
            duration_trimmed
        ));
    }

    let mut total_secs = 0f64;
    for captures in component.captures_iter(&interval_lower) {
        let number: f64 = captures["number"].parse().map_err(|e| {
            anyhow::anyhow!(
                "Invalid duration number '{}' in '{}': {}",
                &captures["number"],
                duration_trimmed,
                e
            )
        })?;

        total_secs += match &captures["unit"] {
            "ms" => number / 1000.0,
            "s" => number,
            "m" => number * 60.0,
            "h" => number * 3600.0,
            "d" => number * 86400.0,
            unit => {
                return Err(anyhow::anyhow!(
                    "Invalid unit '{}' in duration '{}'. Expected: ms, s, m, h, or d",
                    unit,
                    duration_trimmed
                ));
            }
        };
    }

    Duration::try_from_secs_f64(total_secs)
        .map_err(|e| anyhow::anyhow!("Duration '{duration_trimmed}' is out of range: {e}"))
}
