use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Neutral fill for undefined cells.
pub const UNDEFINED: RGBColor = RGBColor(200, 200, 200);

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> RGBColor {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_rgb((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging map for correlation cells
// ---------------------------------------------------------------------------

/// Maps a coefficient in [-1, 1] to blue (negative) through white to red
/// (positive). `None` maps to [`UNDEFINED`].
pub fn diverging(value: Option<f64>) -> RGBColor {
    let Some(v) = value else {
        return UNDEFINED;
    };
    let v = v.clamp(-1.0, 1.0) as f32;
    let hue = if v < 0.0 { 220.0 } else { 0.0 };
    // Lightness runs from white at 0 to a saturated tone at |v| = 1.
    hsl_to_rgb(hue, 0.7, 1.0 - 0.5 * v.abs())
}

/// Black text on light cells, white on dark ones.
pub fn text_on(background: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = background;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 {
        RGBColor(0, 0, 0)
    } else {
        RGBColor(255, 255, 255)
    }
}
