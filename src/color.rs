//! Heatmap shading: gradient interpolation and foreground selection.
//!
//! A cell value is normalized against the column maximum, optionally
//! gamma-compressed and softened toward white at the low end, then mapped
//! through a multi-stop palette. The foreground is chosen from the final
//! background's relative luminance so every cell stays readable.

use serde::{Deserialize, Serialize};

use crate::constants::color::{
    DARK_TEXT, DEFAULT_NEUTRAL_BAND, LIGHT_TEXT, LUMA_THRESHOLD, WHITE,
};
use crate::errors::HeatgridError;

/// An sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel, 0-255.
    pub r: u8,
    /// Green channel, 0-255.
    pub g: u8,
    /// Blue channel, 0-255.
    pub b: u8,
}

impl Rgb {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. `#d7301f`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linearly interpolate toward `other` by `amount` in [0, 1].
    pub fn blend(self, other: Rgb, amount: f64) -> Rgb {
        let t = amount.clamp(0.0, 1.0);
        Rgb::new(
            lerp_channel(self.r, other.r, t),
            lerp_channel(self.g, other.g, t),
            lerp_channel(self.b, other.b, t),
        )
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}

/// Background plus the foreground chosen for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    /// Cell background.
    pub background: Rgb,
    /// Text color guaranteed readable on the background.
    pub foreground: Rgb,
}

/// An ordered sequence of gradient stops.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    stops: Vec<Rgb>,
}

impl Palette {
    /// Build a palette from at least two stops.
    pub fn new(stops: Vec<Rgb>) -> Result<Self, HeatgridError> {
        if stops.len() < 2 {
            return Err(HeatgridError::Configuration(
                "palette needs at least two stops".to_string(),
            ));
        }
        Ok(Self { stops })
    }

    /// The gradient stops, low to high.
    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// Sample the gradient at `fraction` in [0, 1]: the fraction is mapped
    /// onto the stop segments and the two bracketing stops are linearly
    /// interpolated.
    pub fn sample(&self, fraction: f64) -> Rgb {
        let t = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let segments = self.stops.len() - 1;
        let scaled = t * segments as f64;
        let idx = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - idx as f64;
        self.stops[idx].blend(self.stops[idx + 1], local)
    }
}

/// White-blend strength endpoints; the blend fades as the fraction rises,
/// giving low cells a softer wash than a raw palette lookup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhiteBlend {
    /// Blend amount at fraction 0.
    pub low: f64,
    /// Blend amount at fraction 1.
    pub high: f64,
}

impl WhiteBlend {
    fn amount(&self, fraction: f64) -> f64 {
        (self.low + (self.high - self.low) * fraction).clamp(0.0, 1.0)
    }
}

impl Default for WhiteBlend {
    fn default() -> Self {
        Self { low: 0.85, high: 0.0 }
    }
}

/// Options controlling how a value maps onto the gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadeOptions {
    /// Exponent applied to the normalized fraction; values above 1 compress
    /// the low end so mid-range differences read more clearly.
    pub gamma: f64,
    /// Flip polarity for lower-is-better metrics (cost per sale).
    pub invert: bool,
    /// Optional soft-white wash at the low end.
    pub white_blend: Option<WhiteBlend>,
}

impl Default for ShadeOptions {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            invert: false,
            white_blend: None,
        }
    }
}

/// Normalize a value against the column maximum, applying polarity and
/// gamma.
///
/// `max <= 0` (or a non-finite value) yields 0 outright: the cell renders
/// as the neutral empty cell regardless of polarity, not an interpolation
/// artifact.
pub fn normalized_fraction(value: f64, max: f64, options: &ShadeOptions) -> f64 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let mut p = (value / max).clamp(0.0, 1.0);
    if options.invert {
        p = 1.0 - p;
    }
    if options.gamma > 0.0 && options.gamma != 1.0 {
        p = p.powf(options.gamma);
    }
    p
}

/// Shade one cell: normalized gradient lookup plus foreground selection.
pub fn shade(value: f64, max: f64, palette: &Palette, options: &ShadeOptions) -> CellStyle {
    let fraction = normalized_fraction(value, max, options);
    let mut background = palette.sample(fraction);
    if let Some(blend) = &options.white_blend {
        background = background.blend(WHITE, blend.amount(fraction));
    }
    CellStyle {
        background,
        foreground: foreground_for(background),
    }
}

/// A three-zone diverging scale for metrics with a meaningful center, like
/// ROAS around 1.0.
///
/// The zones interpolate independently so the neutral band stays visually
/// flat near the center regardless of the data range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DivergingPalette {
    /// Color at the far low end.
    pub low: Rgb,
    /// Flat center color.
    pub neutral: Rgb,
    /// Color at the far high end.
    pub high: Rgb,
    /// Half-width of the flat neutral band, in normalized deviation units.
    pub neutral_band: f64,
}

impl DivergingPalette {
    /// Build a diverging palette with the default neutral band.
    pub fn new(low: Rgb, neutral: Rgb, high: Rgb) -> Self {
        Self {
            low,
            neutral,
            high,
            neutral_band: DEFAULT_NEUTRAL_BAND,
        }
    }
}

/// Shade one cell on a diverging scale centered at `center`, where
/// `max_deviation` is the absolute deviation mapped to a zone's far end.
pub fn shade_diverging(
    value: f64,
    center: f64,
    max_deviation: f64,
    palette: &DivergingPalette,
) -> CellStyle {
    let deviation = if max_deviation <= 0.0 || !value.is_finite() {
        0.0
    } else {
        ((value - center) / max_deviation).clamp(-1.0, 1.0)
    };
    let band = palette.neutral_band.clamp(0.0, 0.99);
    let background = if deviation.abs() <= band {
        palette.neutral
    } else {
        let t = (deviation.abs() - band) / (1.0 - band);
        if deviation < 0.0 {
            palette.neutral.blend(palette.low, t)
        } else {
            palette.neutral.blend(palette.high, t)
        }
    };
    CellStyle {
        background,
        foreground: foreground_for(background),
    }
}

/// Relative luminance of a color, channels normalized to [0, 1]:
/// `0.2126 R + 0.7152 G + 0.0722 B`.
pub fn relative_luminance(color: Rgb) -> f64 {
    (0.2126 * f64::from(color.r) + 0.7152 * f64::from(color.g) + 0.0722 * f64::from(color.b))
        / 255.0
}

/// Choose a readable foreground for a background: dark text on light
/// backgrounds, light text on saturated ones.
pub fn foreground_for(background: Rgb) -> Rgb {
    if relative_luminance(background) > LUMA_THRESHOLD {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// WCAG-style contrast ratio between two colors, using gamma-linearized
/// channels.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = linear_luminance(a);
    let lb = linear_luminance(b);
    let (lighter, darker) = if la > lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

fn linear_luminance(color: Rgb) -> f64 {
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Built-in palettes used by the standard dashboard modules.
pub mod palettes {
    use super::{DivergingPalette, Palette, Rgb};

    /// Sequential low-to-high heat ramp (pale amber to deep red).
    pub fn heat() -> Palette {
        Palette::new(vec![
            Rgb::new(254, 240, 217),
            Rgb::new(253, 204, 138),
            Rgb::new(252, 141, 89),
            Rgb::new(215, 48, 31),
        ])
        .expect("built-in palette has two or more stops")
    }

    /// Sequential low-to-high green ramp for volume metrics.
    pub fn cool() -> Palette {
        Palette::new(vec![
            Rgb::new(237, 248, 233),
            Rgb::new(161, 217, 155),
            Rgb::new(49, 163, 84),
            Rgb::new(0, 109, 44),
        ])
        .expect("built-in palette has two or more stops")
    }

    /// Diverging red / gray / green scale for ROAS-style centered metrics.
    pub fn roas_diverging() -> DivergingPalette {
        DivergingPalette::new(
            Rgb::new(215, 48, 39),
            Rgb::new(229, 231, 235),
            Rgb::new(27, 120, 55),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::color::MIN_CONTRAST_RATIO;

    #[test]
    fn palette_rejects_fewer_than_two_stops() {
        assert!(Palette::new(vec![Rgb::new(0, 0, 0)]).is_err());
        assert!(Palette::new(Vec::new()).is_err());
    }

    #[test]
    fn sample_hits_stops_at_segment_boundaries() {
        let palette = palettes::heat();
        assert_eq!(palette.sample(0.0), palette.stops()[0]);
        assert_eq!(palette.sample(1.0), palette.stops()[3]);
        assert_eq!(palette.sample(-2.0), palette.stops()[0]);
        assert_eq!(palette.sample(2.0), palette.stops()[3]);
    }

    #[test]
    fn nonpositive_max_renders_as_empty_even_inverted() {
        let inverted = ShadeOptions {
            invert: true,
            ..ShadeOptions::default()
        };
        assert_eq!(normalized_fraction(5.0, 0.0, &inverted), 0.0);
        assert_eq!(normalized_fraction(5.0, -3.0, &inverted), 0.0);
    }

    #[test]
    fn invert_flips_polarity() {
        let options = ShadeOptions {
            invert: true,
            ..ShadeOptions::default()
        };
        assert_eq!(normalized_fraction(0.0, 100.0, &options), 1.0);
        assert_eq!(normalized_fraction(100.0, 100.0, &options), 0.0);
    }

    #[test]
    fn gamma_above_one_compresses_low_fractions() {
        let options = ShadeOptions {
            gamma: 2.0,
            ..ShadeOptions::default()
        };
        let compressed = normalized_fraction(25.0, 100.0, &options);
        assert!(compressed < 0.25);
        assert!((compressed - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn white_blend_softens_the_low_end_more() {
        let palette = palettes::heat();
        let options = ShadeOptions {
            white_blend: Some(WhiteBlend::default()),
            ..ShadeOptions::default()
        };
        let low = shade(5.0, 100.0, &palette, &options);
        let bare = shade(5.0, 100.0, &palette, &ShadeOptions::default());
        assert!(relative_luminance(low.background) > relative_luminance(bare.background));
        let high = shade(100.0, 100.0, &palette, &options);
        assert_eq!(high.background, palette.sample(1.0));
    }

    #[test]
    fn diverging_center_band_stays_flat() {
        let palette = palettes::roas_diverging();
        let at_center = shade_diverging(1.0, 1.0, 0.5, &palette);
        let near_center = shade_diverging(1.04, 1.0, 0.5, &palette);
        assert_eq!(at_center.background, palette.neutral);
        assert_eq!(near_center.background, palette.neutral);
        let low = shade_diverging(0.5, 1.0, 0.5, &palette);
        let high = shade_diverging(1.5, 1.0, 0.5, &palette);
        assert_eq!(low.background, palette.low);
        assert_eq!(high.background, palette.high);
    }

    #[test]
    fn foreground_tracks_background_luminance() {
        assert_eq!(foreground_for(Rgb::new(255, 255, 255)), DARK_TEXT);
        assert_eq!(foreground_for(Rgb::new(20, 20, 20)), LIGHT_TEXT);
    }

    #[test]
    fn chosen_foregrounds_meet_the_contrast_floor() {
        let style = shade(80.0, 100.0, &palettes::heat(), &ShadeOptions::default());
        assert!(contrast_ratio(style.background, style.foreground) >= MIN_CONTRAST_RATIO);
    }

    #[test]
    fn hex_renders_lowercase_with_padding() {
        assert_eq!(Rgb::new(215, 48, 31).hex(), "#d7301f");
        assert_eq!(Rgb::new(0, 0, 0).hex(), "#000000");
    }
}
