//! Hex color parsing for palette swatches and UI color pickers.

use crate::error::ColorError;

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional) into RGBA
/// factors in `[0, 1]`.
pub fn parse_hex_color(input: &str) -> Result<[f64; 4], ColorError> {
    let invalid = || ColorError(input.to_string());

    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    let bytes: [u8; 4] = match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in hex.char_indices() {
                let nibble = channel(&hex[i..i + c.len_utf8()])?;
                out[i] = nibble * 17;
            }
            out
        }
        6 => [
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ],
        8 => [
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ],
        _ => return Err(invalid()),
    };

    Ok(bytes.map(|b| f64::from(b) / 255.0))
}
