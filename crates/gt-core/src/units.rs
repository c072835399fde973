// gt-core/src/units.rs

use uom::si::f64::ElectricPotential as UomElectricPotential;

/// Canonical voltage type (SI, f64).
pub type Voltage = UomElectricPotential;

#[inline]
pub fn volts(v: f64) -> Voltage {
    use uom::si::electric_potential::volt;
    Voltage::new::<volt>(v)
}

#[inline]
pub fn kilovolts(v: f64) -> Voltage {
    use uom::si::electric_potential::kilovolt;
    Voltage::new::<kilovolt>(v)
}

#[inline]
pub fn as_volts(v: Voltage) -> f64 {
    use uom::si::electric_potential::volt;
    v.get::<volt>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kilovolts_scale_to_volts() {
        assert!((as_volts(kilovolts(11.0)) - 11_000.0).abs() < 1e-9);
        assert!((as_volts(volts(415.0)) - 415.0).abs() < 1e-12);
    }
}
