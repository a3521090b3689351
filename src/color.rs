//! sRGB colors.

/// sRGB color represented by a 4-byte hexadecimal number.
///
/// ```rust
/// # #![allow(unused)]
/// let red = 0xFF0000;
/// let green = 0x00FF00;
/// let blue = 0x0000FF;
/// ```
pub type Color = u32;

/// Black.
pub const BLACK: Color = 0x000000;

/// Red.
pub const RED: Color = 0xFF0000;

/// Green.
pub const GREEN: Color = 0x00FF00;

/// Blue.
pub const BLUE: Color = 0x0000FF;

/// White.
pub const WHITE: Color = RED | BLUE | GREEN;

/// Splits a color into its red, green and blue channels.
pub fn to_rgb(c: Color) -> [u8; 3] {
    [(c >> 16) as u8, (c >> 8) as u8, c as u8]
}

/// Packs red, green and blue channels into a color.
pub fn from_rgb(rgb: [u8; 3]) -> Color {
    (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32
}

/// Channel-wise product of two colors, used when a parent color cascades
/// down to its children.
pub fn modulate(a: Color, b: Color) -> Color {
    let (a, b) = (to_rgb(a), to_rgb(b));
    let f = |x: u8, y: u8| (x as u32 * y as u32 / 255) as u8;
    from_rgb([f(a[0], b[0]), f(a[1], b[1]), f(a[2], b[2])])
}

/// Product of two opacities in `[0, 255]`.
pub fn modulate_opacity(a: u8, b: u8) -> u8 {
    (a as u32 * b as u32 / 255) as u8
}
