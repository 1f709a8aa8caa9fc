//! Text formatting for the face: temperatures and the digital time.

/// Placeholder replaced by the rounded temperature in a template.
pub const TEMPERATURE_PLACEHOLDER: &str = "%d";

/// Default temperature template.
pub const DEFAULT_TEMPERATURE_FORMAT: &str = "%d°";

/// Round to the nearest integer, halves going up (71.5 → 72, -0.5 → 0).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Round `degrees` and substitute it into `template`.
///
/// Only the first `%d` is replaced. A template without a placeholder is
/// returned unchanged; [`crate::config::Config`] rejects such templates at load.
///
/// # Example
/// ```
/// use sunshine_face_lib::format::format_temperature;
///
/// assert_eq!(format_temperature("%d°", 71.5), "72°");
/// assert_eq!(format_temperature("%d°", -0.4), "0°");
/// ```
pub fn format_temperature(template: &str, degrees: f64) -> String {
    template.replacen(TEMPERATURE_PLACEHOLDER, &round_half_up(degrees).to_string(), 1)
}

/// `H:MM` in ambient mode, `H:MM:SS` otherwise. Hours are 0-23, unpadded.
pub fn format_time(hour: u32, minute: u32, second: u32, ambient: bool) -> String {
    if ambient {
        format!("{}:{:02}", hour, minute)
    } else {
        format!("{}:{:02}:{:02}", hour, minute, second)
    }
}
