//! Electrical unit helpers: power, resistive loss, and heating.
//!
//! All quantities are [`Fixed64`]. One tick is `1 / TICKS_PER_SECOND` seconds.

use gridflow_core::fixed::{Fixed64, square_64};

pub use gridflow_core::config::TICKS_PER_SECOND;

/// `P = V * I`, in watts.
pub fn power_w(voltage: Fixed64, current: Fixed64) -> Fixed64 {
    voltage.saturating_mul(current)
}

/// Energy in joules delivered by `current` at `voltage` over one tick.
pub fn energy_per_tick_j(voltage: Fixed64, current: Fixed64) -> Fixed64 {
    power_w(voltage, current) / Fixed64::from_num(TICKS_PER_SECOND)
}

/// Resistive loss `I^2 * R * t` in joules over `ticks` ticks.
pub fn resistive_loss_j(current: Fixed64, resistance: Fixed64, ticks: u32) -> Fixed64 {
    let seconds = Fixed64::from_num(ticks) / Fixed64::from_num(TICKS_PER_SECOND);
    square_64(current)
        .saturating_mul(resistance)
        .saturating_mul(seconds)
}

/// Temperature rise `Q / (m * c)` in kelvin. The heat capacity is floored at
/// 0.001 J/K so a massless body does not divide by zero.
pub fn heat_rise(joules: Fixed64, mass_kg: Fixed64, specific_heat: Fixed64) -> Fixed64 {
    let floor = Fixed64::from_num(0.001);
    let capacity = mass_kg.saturating_mul(specific_heat).max(floor);
    joules.saturating_div(capacity)
}

pub fn is_overheated(temperature_c: Fixed64, threshold_c: Fixed64) -> bool {
    temperature_c >= threshold_c
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridflow_core::test_utils::fixed;

    #[test]
    fn power_is_volts_times_amps() {
        assert_eq!(power_w(fixed(240.0), fixed(10.0)), fixed(2400.0));
    }

    #[test]
    fn energy_per_tick_divides_by_tick_rate() {
        // 2400 W for 1/20 s = 120 J.
        assert_eq!(energy_per_tick_j(fixed(240.0), fixed(10.0)), fixed(120.0));
    }

    #[test]
    fn resistive_loss_over_one_second() {
        // 10 A through 0.5 ohm for 20 ticks = 100 * 0.5 * 1 = 50 J.
        assert_eq!(resistive_loss_j(fixed(10.0), fixed(0.5), 20), fixed(50.0));
        assert_eq!(resistive_loss_j(fixed(10.0), fixed(0.5), 0), Fixed64::ZERO);
    }

    #[test]
    fn heat_rise_of_copper() {
        // 770 J into 2 kg at 385 J/(kg K) = 1 K.
        assert_eq!(heat_rise(fixed(770.0), fixed(2.0), fixed(385.0)), fixed(1.0));
    }

    #[test]
    fn heat_rise_floors_capacity() {
        let rise = heat_rise(fixed(1.0), Fixed64::ZERO, fixed(385.0));
        assert!(rise > fixed(999.0));
    }

    #[test]
    fn overheat_threshold_is_inclusive() {
        assert!(is_overheated(fixed(90.0), fixed(90.0)));
        assert!(!is_overheated(fixed(89.5), fixed(90.0)));
    }
}
