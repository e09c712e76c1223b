//! Conversion between device pixels and the normalized injection space.

use super::errors::GeometryError;
use super::types::{NORMALIZED_MAX, NormalizedPoint, ScreenPoint, ScreenSize};

/// Convert a pixel coordinate on one axis into normalized space.
///
/// Computes `round(65535 / axis * coordinate)`, then adds `bias`.
pub fn normalize_axis(coordinate: i32, axis: i32, bias: i32) -> i32 {
    let scaled = (f64::from(NORMALIZED_MAX) / f64::from(axis)) * f64::from(coordinate);
    (scaled.round() as i32).saturating_add(bias)
}

/// Convert a screen point into the normalized space of the given resolution.
///
/// # Errors
///
/// Returns `GeometryError::InvalidResolution` when either axis is not positive.
pub fn normalize_point(
    point: ScreenPoint,
    screen: ScreenSize,
    bias: i32,
) -> Result<NormalizedPoint, GeometryError> {
    validate_resolution(screen)?;
    Ok(NormalizedPoint::new(
        normalize_axis(point.x, screen.width, bias),
        normalize_axis(point.y, screen.height, bias),
    ))
}

/// Map a normalized point back to pixels, rounding to the nearest pixel.
///
/// This is the translation the simulated desktop applies when it receives an
/// absolute move; results are clamped onto the screen.
pub fn denormalize_point(
    point: NormalizedPoint,
    screen: ScreenSize,
) -> Result<ScreenPoint, GeometryError> {
    validate_resolution(screen)?;
    Ok(ScreenPoint::new(
        denormalize_axis(point.x, screen.width),
        denormalize_axis(point.y, screen.height),
    ))
}

fn denormalize_axis(value: i32, axis: i32) -> i32 {
    let pixel = (i64::from(value) * i64::from(axis) + 32768) / 65536;
    (pixel as i32).clamp(0, axis - 1)
}

fn validate_resolution(screen: ScreenSize) -> Result<(), GeometryError> {
    if screen.width <= 0 || screen.height <= 0 {
        return Err(GeometryError::InvalidResolution {
            width: screen.width,
            height: screen.height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_axis_matches_reference_values() {
        // 65535 / 1920 * 100 = 3413.28
        assert_eq!(normalize_axis(100, 1920, 0), 3413);
        assert_eq!(normalize_axis(100, 1920, 1), 3414);
        assert_eq!(normalize_axis(0, 1920, 1), 1);
    }

    #[test]
    fn test_normalize_point_rejects_empty_screen() {
        let err = normalize_point(ScreenPoint::new(1, 1), ScreenSize::new(0, 1080), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidResolution {
                width: 0,
                height: 1080
            }
        ));
    }

    #[test]
    fn test_normalize_point_clamps_to_range() {
        let point = normalize_point(ScreenPoint::new(5000, -50), ScreenSize::new(800, 600), 1)
            .unwrap();
        assert_eq!(point.x, NORMALIZED_MAX);
        assert_eq!(point.y, 0);
    }

    #[test]
    fn test_every_pixel_survives_the_round_trip() {
        for screen in [
            ScreenSize::new(800, 600),
            ScreenSize::new(1366, 768),
            ScreenSize::new(1920, 1080),
            ScreenSize::new(3840, 2160),
        ] {
            for x in 0..screen.width {
                let normalized = normalize_axis(x, screen.width, 1);
                assert_eq!(
                    denormalize_axis(normalized, screen.width),
                    x,
                    "x={} on {}",
                    x,
                    screen
                );
            }
        }
    }

    #[test]
    fn test_denormalize_clamps_to_screen() {
        let screen = ScreenSize::new(1024, 768);
        let point = denormalize_point(NormalizedPoint::new(65535, 65535), screen).unwrap();
        assert_eq!(point, ScreenPoint::new(1023, 767));
    }
}
