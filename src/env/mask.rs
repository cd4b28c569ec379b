//! Masking of env values for display.

/// Mask a value for printing.
///
/// Values of four characters or fewer are fully starred. Longer values keep
/// their first and last two characters.
///
/// ```
/// use fleetenv::env::mask;
///
/// assert_eq!(mask("abc"), "***");
/// assert_eq!(mask("postgres://db"), "po****db");
/// ```
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}****{}", head, tail)
}
