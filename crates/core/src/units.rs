//! Conversions from PowerPoint-native units.

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Screen resolution used for pixel conversion.
pub const DEFAULT_DPI: f64 = 96.0;

/// Font size used when a run carries no size.
pub const DEFAULT_FONT_SIZE_PT: f64 = 12.0;

/// Angles are stored in 60000ths of a degree.
pub const ANGLE_UNITS_PER_DEGREE: f64 = 60_000.0;

/// Convert EMU to pixels at 96 DPI.
pub fn emu_to_pixels(emu: f64) -> i64 {
    emu_to_pixels_at(emu, DEFAULT_DPI)
}

/// Convert EMU to pixels at an arbitrary resolution.
pub fn emu_to_pixels_at(emu: f64, dpi: f64) -> i64 {
    if !emu.is_finite() {
        return 0;
    }
    (emu / EMU_PER_INCH * dpi).round() as i64
}

/// Convert EMU to whole points.
pub fn emu_to_points(emu: f64) -> i64 {
    if !emu.is_finite() {
        return 0;
    }
    (emu / EMU_PER_INCH * 72.0).round() as i64
}

/// Convert a run size (hundredths of a point) to points, defaulting to 12.
pub fn font_size_to_points(size: Option<f64>) -> f64 {
    match size {
        Some(n) if n.is_finite() => n / 100.0,
        _ => DEFAULT_FONT_SIZE_PT,
    }
}

/// Convert 60000ths of a degree to degrees.
pub fn angle_to_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    angle / ANGLE_UNITS_PER_DEGREE
}

/// Convert thousandths of a percent (crop rectangles) to percent.
pub fn thousandths_to_percent(value: f64) -> f64 {
    value / 1000.0
}

/// Convert hundred-thousandths (alpha, gradient positions) to a 0..=1 fraction.
pub fn fraction_from_hundred_thousandths(value: f64) -> f64 {
    (value / 100_000.0).clamp(0.0, 1.0)
}
