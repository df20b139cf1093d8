//! Small utility helpers used across modules.

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
  let factor = 10f64.powi(places as i32);
  (value * factor).round() / factor
}

/// Lowercase and drop all whitespace.
/// Used for string equality checks that ignore spacing and case.
pub fn normalize(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

/// Log-safe truncation for learner-supplied text.
/// Avoids spamming logs with huge request payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}
