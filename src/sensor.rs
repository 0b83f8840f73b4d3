//! WCS6800 hall-effect current sensor on a 12-bit ADC input.

/// Raw sample source for the sensor input, 12-bit right-aligned counts.
pub trait AdcChannel {
    fn read_counts(&mut self) -> u16;
}

/// Current reading collaborator as seen by the monitor loop.
pub trait CurrentSensor {
    fn read_current_amps(&mut self) -> f32;

    /// Boot-time plausibility check. Defaults to passing for sources that
    /// have nothing to verify.
    fn check(&mut self) -> bool {
        true
    }
}

/// Pure linear conversion: counts to volts at the ADC reference, then volts
/// to amps around the sensor's zero-current offset.
pub struct Wcs6800<A> {
    adc: A,
}

impl<A> Wcs6800<A> {
    pub const ADC_MAX_COUNTS: f32 = 4095.0;
    pub const ADC_REF_VOLTAGE: f32 = 3.3;
    /// Volts per amp.
    pub const SENSITIVITY: f32 = 0.0429;
    /// Output voltage at 0 A.
    pub const OFFSET_VOLTAGE: f32 = 1.65;

    pub fn new(adc: A) -> Self {
        Self { adc }
    }
}

impl<A: AdcChannel> Wcs6800<A> {
    pub fn read_voltage(&mut self) -> f32 {
        (self.adc.read_counts() as f32 / Self::ADC_MAX_COUNTS) * Self::ADC_REF_VOLTAGE
    }
}

impl<A: AdcChannel> CurrentSensor for Wcs6800<A> {
    fn read_current_amps(&mut self) -> f32 {
        (self.read_voltage() - Self::OFFSET_VOLTAGE) / Self::SENSITIVITY
    }

    /// With no current flowing the output should sit near the offset
    /// voltage; far outside that band the sensor is miswired or absent.
    fn check(&mut self) -> bool {
        let voltage = self.read_voltage();
        if !(0.5..=3.0).contains(&voltage) {
            error!("WCS6800 sensor check failed, voltage: {} V", voltage);
            return false;
        }
        info!("WCS6800 sensor check passed, voltage: {} V", voltage);
        true
    }
}
