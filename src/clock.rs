/// Prescaler ratios dividing the peripheral clock down to the ADC's
/// conversion clock.
///
/// On a 16 MHz AVR, `Div128` gives the default 125 kHz ADC clock and
/// `Div16` gives 1 MHz, the fastest setting characterized in the
/// datasheet. `Div8` and below exceed that limit: conversions still
/// complete, but the hardware is no longer guaranteed to deliver its full
/// native resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescaler {
    Div128,
    Div64,
    Div32,
    Div16,
    Div8,
    Div4,
    Div2,
}

impl Prescaler {
    /// Returns the clock-division ratio for this setting.
    pub fn divisor(&self) -> u32 {
        match self {
            Prescaler::Div128 => 128,
            Prescaler::Div64 => 64,
            Prescaler::Div32 => 32,
            Prescaler::Div16 => 16,
            Prescaler::Div8 => 8,
            Prescaler::Div4 => 4,
            Prescaler::Div2 => 2,
        }
    }
}

impl Default for Prescaler {
    /// The power-on prescaler on most targets, and the slowest setting.
    fn default() -> Self {
        Prescaler::Div128
    }
}

/// Programs the sample-source conversion clock.
///
/// Implementations own the device-specific register access. The reader
/// only calls [`set_prescaler`](AdcClock::set_prescaler) when the
/// configured prescaler actually changes, and surfaces the returned
/// frequency through
/// [`clock_frequency`](crate::AdcOversampler::clock_frequency).
///
/// # Examples
///
/// ```
/// use adc_oversampler::{AdcClock, Prescaler};
///
/// struct SystemClock;
///
/// impl AdcClock for SystemClock {
///     fn set_prescaler(&mut self, prescaler: Prescaler) -> u32 {
///         // A real implementation writes the prescaler bits to the
///         // ADC control register here.
///         16_000_000 / prescaler.divisor()
///     }
/// }
///
/// let mut clock = SystemClock;
/// assert_eq!(clock.set_prescaler(Prescaler::Div128), 125_000);
/// assert_eq!(clock.set_prescaler(Prescaler::Div16), 1_000_000);
/// ```
pub trait AdcClock {
    /// Reprograms the conversion clock and returns the resulting
    /// effective clock frequency in Hz.
    fn set_prescaler(&mut self, prescaler: Prescaler) -> u32;
}

#[cfg(test)]
mod tests {
    use super::Prescaler;

    #[test]
    fn divisors() {
        assert_eq!(Prescaler::Div128.divisor(), 128);
        assert_eq!(Prescaler::Div64.divisor(), 64);
        assert_eq!(Prescaler::Div32.divisor(), 32);
        assert_eq!(Prescaler::Div16.divisor(), 16);
        assert_eq!(Prescaler::Div8.divisor(), 8);
        assert_eq!(Prescaler::Div4.divisor(), 4);
        assert_eq!(Prescaler::Div2.divisor(), 2);
    }

    #[test]
    fn default_is_slowest() {
        assert_eq!(Prescaler::default(), Prescaler::Div128);
    }
}
