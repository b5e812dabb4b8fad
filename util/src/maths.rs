//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is
/// returned. Differences too large to square are scaled down by the largest
/// of them first, so any finite input gives a finite norm.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float + std::ops::AddAssign,
{
    // Check that the dimentions match
    if point_0.len() != point_1.len() {
        return None;
    }

    let mut sum = T::zero();

    for (a, b) in point_0.iter().zip(point_1.iter()) {
        sum += (*a - *b).powi(2);
    }

    if sum.is_finite() {
        return Some(sum.sqrt());
    }

    // Overflowed, redo the sum relative to the largest difference
    let scale = point_0
        .iter()
        .zip(point_1.iter())
        .map(|(a, b)| (*a - *b).abs())
        .fold(T::zero(), T::max);

    if !scale.is_finite() || scale == T::zero() {
        return Some(sum.sqrt());
    }

    let mut scaled_sum = T::zero();
    for (a, b) in point_0.iter().zip(point_1.iter()) {
        scaled_sum += ((*a - *b) / scale).powi(2);
    }

    Some(scaled_sum.sqrt() * scale)
}

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Round to the nearest integer, with ties going to the even neighbour.
///
/// Unlike `Float::round` (which rounds ties away from zero) this has no bias
/// when summing many rounded values.
pub fn round_half_even<T>(value: T) -> T
where
    T: Float,
{
    let rounded = value.round();
    let two = T::one() + T::one();

    if (value - value.trunc()).abs() == T::one() / two {
        // Exact tie, pick whichever neighbour is even
        let floor = value.floor();
        if floor % two == T::zero() {
            floor
        } else {
            floor + T::one()
        }
    } else {
        rounded
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_norm() {
        assert_eq!(norm(&[3f64, 4f64], &[0f64, 0f64]), Some(5f64));
        assert_eq!(norm(&[1f64, 2f64, 2f64], &[0f64, 0f64, 0f64]), Some(3f64));
        assert_eq!(norm(&[1f64], &[0f64, 0f64]), None);
    }

    #[test]
    fn test_norm_large_values() {
        assert_eq!(norm(&[1e200f64, 0f64], &[0f64, 0f64]), Some(1e200f64));
        assert_eq!(norm(&[0f64, -1e160f64, 0f64], &[0f64; 3]), Some(1e160f64));

        let n = norm(&[3e300f64, 4e300f64], &[0f64, 0f64]).unwrap();
        assert!((n / 5e300 - 1.0).abs() < 1e-15);

        assert_eq!(norm(&[std::f64::INFINITY, 0f64], &[0f64, 0f64]), Some(std::f64::INFINITY));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5f64, &-1f64, &1f64), 1f64);
        assert_eq!(clamp(&-1.5f64, &-1f64, &1f64), -1f64);
        assert_eq!(clamp(&0.25f64, &-1f64, &1f64), 0.25f64);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(0.5f64), 0f64);
        assert_eq!(round_half_even(1.5f64), 2f64);
        assert_eq!(round_half_even(2.5f64), 2f64);
        assert_eq!(round_half_even(-0.5f64), 0f64);
        assert_eq!(round_half_even(-1.5f64), -2f64);
        assert_eq!(round_half_even(-2.5f64), -2f64);
        assert_eq!(round_half_even(2.4f64), 2f64);
        assert_eq!(round_half_even(-2.6f64), -3f64);
    }
}
