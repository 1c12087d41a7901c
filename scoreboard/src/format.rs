/// Formats a second count as `MM:SS`.
///
/// Minutes are not wrapped into hours: 1015 s renders as `16:55`.
pub fn mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parses `MM:SS` (or `M:SS`) back into seconds.
///
/// Returns `None` unless the seconds field is two digits below 60.
pub fn parse_mmss(text: &str) -> Option<u32> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    if seconds.len() != 2 || minutes.is_empty() {
        return None;
    }
    if !minutes.bytes().chain(seconds.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}
