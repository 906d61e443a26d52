use std::time::Instant;

#[inline]
pub fn now_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

/// 逻辑函数 1/(1+e^-z)。
///
/// 不做溢出保护：f64 下 |z| 很大时 exp 会得到 inf / 0，结果饱和为 0.0 / 1.0，不会出现 NaN。
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Round to `decimals` places, half away from zero.
#[inline]
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (x * p).round() / p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_saturates_without_nan() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(sigmoid(1e6), 1.0);
        assert_eq!(sigmoid(-1e6), 0.0);
        assert!(!sigmoid(-800.0).is_nan());
    }

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(0.123456, 3), 0.123);
        assert_eq!(round_to(73.4567, 2), 73.46);
    }
}
