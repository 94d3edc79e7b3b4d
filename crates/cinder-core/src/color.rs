//! Byte colors and lifetime-driven color interpolation.

/// RGBA color with 8 bits per channel; alpha lives in `[3]`.
pub type Rgba8 = [u8; 4];

/// Index of the alpha channel in an [`Rgba8`].
pub const ALPHA: usize = 3;

/// Whether the color has already been faded out completely.
pub fn is_transparent(color: &Rgba8) -> bool {
    color[ALPHA] == 0
}

/// Linear interpolation between two byte colors.
pub fn lerp_rgba(a: Rgba8, b: Rgba8, t: f32) -> Rgba8 {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = a[i] as f32 + (b[i] as f32 - a[i] as f32) * t;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Three-stop color curve over a normalised lifetime.
///
/// The color goes `initial → faded_in` over `[0, finish_fading_in_at]`,
/// holds `faded_in` until `start_fading_out_at`, then goes to `faded_out`
/// by the end of the lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorLifespan {
    /// Color at spawn.
    pub initial: Rgba8,
    /// Color held in the middle of the lifetime.
    pub faded_in: Rgba8,
    /// Color at expiry.
    pub faded_out: Rgba8,
    /// Lifetime fraction at which fading in completes.
    pub finish_fading_in_at: f32,
    /// Lifetime fraction at which fading out begins.
    pub start_fading_out_at: f32,
}

impl ColorLifespan {
    /// A lifespan that fades the given color's alpha out over the second half.
    pub fn fade_out(color: Rgba8) -> Self {
        Self {
            initial: color,
            faded_in: color,
            faded_out: [color[0], color[1], color[2], 0],
            finish_fading_in_at: 0.0,
            start_fading_out_at: 0.5,
        }
    }

    /// Evaluate the curve at `fraction` in `[0, 1]`.
    pub fn color_at(&self, fraction: f32) -> Rgba8 {
        let f = fraction.clamp(0.0, 1.0);
        if f < self.finish_fading_in_at {
            lerp_rgba(self.initial, self.faded_in, f / self.finish_fading_in_at)
        } else if f <= self.start_fading_out_at {
            self.faded_in
        } else {
            let span = (1.0 - self.start_fading_out_at).max(f32::EPSILON);
            lerp_rgba(self.faded_in, self.faded_out, (f - self.start_fading_out_at) / span)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        let a = [0, 0, 0, 0];
        let b = [255, 128, 64, 255];
        assert_eq!(lerp_rgba(a, b, 0.0), a);
        assert_eq!(lerp_rgba(a, b, 1.0), b);
        assert_eq!(lerp_rgba(a, b, 2.0), b);
    }

    #[test]
    fn lifespan_holds_then_fades() {
        let ls = ColorLifespan::fade_out([255, 200, 100, 255]);
        assert_eq!(ls.color_at(0.25), [255, 200, 100, 255]);
        assert_eq!(ls.color_at(1.0)[ALPHA], 0);
        assert!(ls.color_at(0.75)[ALPHA] < 255);
    }

    #[test]
    fn lifespan_fades_in() {
        let ls = ColorLifespan {
            initial: [0, 0, 0, 0],
            faded_in: [100, 100, 100, 200],
            faded_out: [100, 100, 100, 0],
            finish_fading_in_at: 0.2,
            start_fading_out_at: 0.8,
        };
        assert_eq!(ls.color_at(0.0), [0, 0, 0, 0]);
        assert_eq!(ls.color_at(0.1), [50, 50, 50, 100]);
        assert_eq!(ls.color_at(0.5), [100, 100, 100, 200]);
    }
}
