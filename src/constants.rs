use crate::color::Rgb;

/// Constants used by field coercion and categorical cleanup.
pub mod coerce {
    /// Spreadsheet null sentinels treated as empty cells (compared uppercase).
    pub const NULL_SENTINELS: [&str; 5] = ["NONE", "N/A", "NA", "NULL", "<NA>"];
    /// Fallback label offered for empty categorical cells.
    pub const DEFAULT_TEXT_FALLBACK: &str = "Unknown";
    /// Fallback label for unresolvable station names.
    pub const UNKNOWN_STATION: &str = "UNKNOWN";
}

/// Constants used by grouping and breakdown assembly.
pub mod aggregate {
    /// Separator joining dimension values into a composite group key.
    ///
    /// NUL never survives a spreadsheet export, so composite keys cannot
    /// collide with real cell content.
    pub const GROUP_KEY_SEPARATOR: &str = "\u{0}";
}

/// Constants used by heatmap shading and foreground selection.
pub mod color {
    use super::Rgb;

    /// Relative-luminance threshold above which dark text is used.
    pub const LUMA_THRESHOLD: f64 = 0.62;
    /// Contrast floor every generated background/foreground pair must meet.
    pub const MIN_CONTRAST_RATIO: f64 = 2.0;
    /// Dark foreground used on light backgrounds.
    pub const DARK_TEXT: Rgb = Rgb::new(26, 32, 44);
    /// Light foreground used on saturated backgrounds.
    pub const LIGHT_TEXT: Rgb = Rgb::new(255, 255, 255);
    /// Blend target for the optional soft low end.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    /// Half-width of the flat neutral band in a diverging shade.
    pub const DEFAULT_NEUTRAL_BAND: f64 = 0.12;
}
