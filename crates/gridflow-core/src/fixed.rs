use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Electrical quantities (volts, amperes, ohms) are carried in this type so
/// that every allocation in a tick is bit-for-bit reproducible.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `value * numerator / denominator`, computed in a widened intermediate so
/// that proportional shares of large totals neither overflow nor lose the
/// low bits. Truncates toward zero. Returns zero for a zero denominator.
#[inline]
pub fn mul_div_64(value: Fixed64, numerator: Fixed64, denominator: Fixed64) -> Fixed64 {
    if denominator == Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    // Q32.32 * Q32.32 = Q64.64; dividing by a Q32.32 bit pattern lands back on Q32.32.
    let wide = i128::from(value.to_bits()) * i128::from(numerator.to_bits());
    let bits = wide / i128::from(denominator.to_bits());
    let clamped = bits.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
    Fixed64::from_bits(clamped)
}

/// Square of a fixed-point value, saturating at the numeric bounds.
#[inline]
pub fn square_64(v: Fixed64) -> Fixed64 {
    v.saturating_mul(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn mul_div_exact_for_integral_shares() {
        let flow = Fixed64::from_num(40);
        let share = mul_div_64(flow, Fixed64::from_num(15), Fixed64::from_num(40));
        assert_eq!(share, Fixed64::from_num(15));
    }

    #[test]
    fn mul_div_zero_denominator_is_zero() {
        let v = mul_div_64(Fixed64::from_num(10), Fixed64::from_num(3), Fixed64::ZERO);
        assert_eq!(v, Fixed64::ZERO);
    }

    #[test]
    fn mul_div_large_values_do_not_overflow() {
        // 100_000 * 100_000 overflows Q32.32 directly, but the quotient fits.
        let big = Fixed64::from_num(100_000);
        let v = mul_div_64(big, big, Fixed64::from_num(200_000));
        assert_eq!(v, Fixed64::from_num(50_000));
    }

    #[test]
    fn mul_div_truncates_toward_zero() {
        let third = mul_div_64(Fixed64::from_num(1), Fixed64::from_num(1), Fixed64::from_num(3));
        assert!(third * Fixed64::from_num(3) <= Fixed64::from_num(1));
    }

    #[test]
    fn square_saturates() {
        assert_eq!(square_64(Fixed64::MAX), Fixed64::MAX);
        assert_eq!(square_64(Fixed64::from_num(-3)), Fixed64::from_num(9));
    }
}
