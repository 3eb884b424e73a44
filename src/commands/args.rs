//! Argument parsing shared by the command handlers.

use crate::commands::CommandError;

/// Parses a base-10 signed 64-bit integer argument.
pub fn parse_integer(raw: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::NotInteger)
}

/// Parses a score argument. Accepts `inf`, `+inf` and `-inf`; rejects NaN.
pub fn parse_score(raw: &[u8]) -> Result<f64, CommandError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|score| !score.is_nan())
        .ok_or(CommandError::NotFloat)
}

/// Formats a score the way it is returned to clients (`5`, `1.5`, `inf`).
///
/// Like `%.17g`, a decimal exponent below -4 or above 16 switches to
/// scientific notation with a signed, two-digit exponent (`1e+300`).
pub fn format_score(score: f64) -> String {
    if !score.is_finite() || score == 0.0 {
        return score.to_string();
    }

    let scientific = format!("{:e}", score);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return score.to_string(),
    };

    if (-4..17).contains(&exponent) {
        score.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}
