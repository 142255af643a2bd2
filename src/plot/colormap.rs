//! Viridis colour map.
use plotters::style::RGBColor;

/// Evenly spaced samples of the viridis colour map.
const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

/// Map `t` in `[0, 1]` to a colour, values outside are clamped.
pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let x = t * (VIRIDIS.len() - 1) as f64;
    let i = (x.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = x - i as f64;

    let (r0, g0, b0) = VIRIDIS[i];
    let (r1, g1, b1) = VIRIDIS[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + frac * (b as f64 - a as f64)).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Position of `value` within `[min, max]`, clamped to `[0, 1]`.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis() {
        assert_eq!(viridis(0.0), RGBColor(68, 1, 84));
        assert_eq!(viridis(1.0), RGBColor(253, 231, 37));
        assert_eq!(viridis(0.5), RGBColor(33, 144, 141));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(7.0), viridis(1.0));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0.5, 0.0, 1.0), 0.5);
        assert_eq!(normalize(3.0, 1.0, 2.0), 1.0);
        assert_eq!(normalize(3.0, 1.0, 1.0), 0.0);
    }
}
