//! Color utilities
//!
//! Target generation, threshold matching and the accelerometer-to-color mapping.

use crate::domain::models::MotionSample;
use rand::Rng;
use std::fmt;

/// Maximum per-channel difference (exclusive) for two colors to match.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 20.0;

/// Nominal accelerometer range of a single axis, in g.
const AXIS_RANGE: f64 = 10.0;

/// RGB color with unclamped floating point channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Round each channel and clamp it into a displayable byte.
    pub fn to_rgb8(&self) -> [u8; 3] {
        self.channels()
            .map(|c| c.round().clamp(0.0, 255.0) as u8)
    }

    /// CSS style `rgb(r, g, b)` string with rounded channels.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgb({}, {}, {})",
            self.r.round(),
            self.g.round(),
            self.b.round()
        )
    }
}

/// Random color, each channel uniform in `[0, 255)`.
pub fn random_color() -> Rgb {
    random_color_with(&mut rand::thread_rng())
}

pub fn random_color_with<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    Rgb::new(
        rng.gen_range(0.0..255.0),
        rng.gen_range(0.0..255.0),
        rng.gen_range(0.0..255.0),
    )
}

/// Per-channel box test: every channel must differ by strictly less than `threshold`.
pub fn colors_match(target: &Rgb, current: &Rgb, threshold: f64) -> bool {
    target
        .channels()
        .iter()
        .zip(current.channels().iter())
        .all(|(t, c)| (t - c).abs() < threshold)
}

/// Map an accelerometer sample to a color, one axis per channel.
///
/// `-10g` maps to 0 and `+10g` to 255. Readings outside that range are not
/// clamped and produce channels outside `[0, 255]`.
pub fn color_from_motion(sample: &MotionSample) -> Rgb {
    Rgb::new(
        axis_to_channel(sample.x),
        axis_to_channel(sample.y),
        axis_to_channel(sample.z),
    )
}

fn axis_to_channel(axis: f32) -> f64 {
    (axis as f64 + AXIS_RANGE).abs() / (2.0 * AXIS_RANGE) * 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_rgb() -> impl Strategy<Value = Rgb> {
        (-50.0f64..300.0, -50.0f64..300.0, -50.0f64..300.0).prop_map(|(r, g, b)| Rgb::new(r, g, b))
    }

    proptest! {
        #[test]
        fn matching_is_symmetric(a in arb_rgb(), b in arb_rgb(), t in 0.0f64..100.0) {
            prop_assert_eq!(colors_match(&a, &b, t), colors_match(&b, &a, t));
        }

        #[test]
        fn color_matches_itself(c in arb_rgb(), t in 0.001f64..100.0) {
            prop_assert!(colors_match(&c, &c, t));
        }

        #[test]
        fn random_channels_stay_in_range(_seed in 0u8..16) {
            let c = random_color();
            for ch in c.channels() {
                prop_assert!((0.0..255.0).contains(&ch));
            }
        }
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        let target = Rgb::new(100.0, 100.0, 100.0);
        assert!(colors_match(
            &target,
            &Rgb::new(119.0, 100.0, 100.0),
            DEFAULT_MATCH_THRESHOLD
        ));
        assert!(!colors_match(
            &target,
            &Rgb::new(120.0, 100.0, 100.0),
            DEFAULT_MATCH_THRESHOLD
        ));
    }

    #[test]
    fn every_channel_must_match() {
        let target = Rgb::new(100.0, 100.0, 100.0);
        assert!(!colors_match(&target, &Rgb::new(100.0, 100.0, 130.0), 20.0));
        assert!(!colors_match(&target, &Rgb::new(100.0, 70.0, 100.0), 20.0));
    }

    #[test]
    fn motion_maps_to_channels() {
        let c = color_from_motion(&MotionSample::new(0.0, -10.0, 10.0));
        assert_eq!(c.r, 127.5);
        assert_eq!(c.g, 0.0);
        assert_eq!(c.b, 255.0);
    }

    #[test]
    fn motion_out_of_range_is_not_clamped() {
        let c = color_from_motion(&MotionSample::new(12.0, -12.0, 0.0));
        assert!(c.r > 255.0);
        // |(-12) + 10| folds back to a positive channel
        assert!((c.g - 25.5).abs() < 1e-9);
    }

    #[test]
    fn rendering_rounds_and_clamps() {
        let c = Rgb::new(127.5, -3.0, 300.0);
        assert_eq!(c.to_rgb8(), [128, 0, 255]);
        assert_eq!(Rgb::new(12.4, 0.0, 254.6).to_css(), "rgb(12, 0, 255)");
    }
}
