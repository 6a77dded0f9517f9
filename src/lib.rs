#![cfg_attr(not(test), no_std)]

mod clock;
mod decimate;

pub use clock::{AdcClock, Prescaler};

use decimate::decimate;
use embedded_hal::adc::{Channel, OneShot};

/// The largest number of resolution bits that can be requested beyond the
/// native resolution.
///
/// Each extra bit quadruples the number of raw samples per reading, so at
/// `native + 11` a single reading already accumulates 4^11 (about 4.19
/// million) raw conversions. The accumulator is sized for that maximum;
/// resolution requests beyond it are clamped.
pub const MAX_EXTRA_BITS: u32 = 11;

/// Reads an ADC at a higher resolution than the hardware provides by
/// oversampling and decimating, per Atmel application note AVR121.
///
/// A reading at `native + n` bits accumulates `4^n` raw samples and
/// right-shifts the sum by `n` with round-to-nearest. Readings can
/// additionally be averaged. Some noise on the analog input is required
/// for oversampling to gain real resolution; the extra bits are
/// theoretical otherwise.
#[derive(Debug)]
pub struct AdcOversampler<Pin, Clock> {
    pin: Pin,
    clock: Clock,
    native_bits: u32,
    resolution_bits: u32,
    samples_to_average: u32,
    prescaler: Prescaler,
    clock_frequency: u32,
}

type Error<Adc, ADC, Word, Pin> = nb::Error<<Adc as OneShot<ADC, Word, Pin>>::Error>;

impl<Pin, Clock> AdcOversampler<Pin, Clock> {
    /// Returns an oversampler for a pin whose raw conversions are
    /// `native_bits` wide (eg. `10` for the AVR ADC).
    ///
    /// The reader starts out at native resolution, averaging a single
    /// reading, with the slowest prescaler. The clock collaborator is
    /// programmed once here so that
    /// [`clock_frequency`](AdcOversampler::clock_frequency) reports a
    /// meaningful value before any reconfiguration.
    ///
    /// # Examples
    ///
    /// ```
    /// use adc_oversampler::{AdcClock, AdcOversampler, Prescaler};
    /// # use embedded_hal_mock::adc::MockChan0;
    /// #
    /// # struct SystemClock;
    /// # impl AdcClock for SystemClock {
    /// #     fn set_prescaler(&mut self, prescaler: Prescaler) -> u32 {
    /// #         16_000_000 / prescaler.divisor()
    /// #     }
    /// # }
    /// #
    /// # let pin = MockChan0 {};
    ///
    /// let reader = AdcOversampler::new(pin, SystemClock, 10);
    ///
    /// assert_eq!(reader.resolution_bits(), 10);
    /// assert_eq!(reader.samples_to_average(), 1);
    /// assert_eq!(reader.prescaler(), Prescaler::Div128);
    /// assert_eq!(reader.clock_frequency(), 125_000);
    /// ```
    pub fn new<ADC>(pin: Pin, mut clock: Clock, native_bits: u32) -> Self
    where
        Pin: Channel<ADC>,
        Clock: AdcClock,
    {
        debug_assert!(
            (1..=16).contains(&native_bits),
            "native_bits must be between 1 and 16"
        );

        let prescaler = Prescaler::default();
        let clock_frequency = clock.set_prescaler(prescaler);

        Self {
            pin,
            clock,
            native_bits,
            resolution_bits: native_bits,
            samples_to_average: 1,
            prescaler,
            clock_frequency,
        }
    }

    /// Destroys the oversampler and returns the pin and clock.
    pub fn free(self) -> (Pin, Clock) {
        (self.pin, self.clock)
    }

    /// Sets resolution, averaging count, and prescaler in one call.
    ///
    /// Equivalent to calling the three individual setters, with the same
    /// clamping rules: out-of-range values are brought into range rather
    /// than rejected, and the clock is only reprogrammed if the prescaler
    /// actually changed. Check the accessors afterwards if the effective
    /// values matter.
    ///
    /// # Examples
    ///
    /// ```
    /// use adc_oversampler::{AdcClock, AdcOversampler, Prescaler};
    /// # use embedded_hal_mock::adc::MockChan0;
    /// #
    /// # struct SystemClock;
    /// # impl AdcClock for SystemClock {
    /// #     fn set_prescaler(&mut self, prescaler: Prescaler) -> u32 {
    /// #         16_000_000 / prescaler.divisor()
    /// #     }
    /// # }
    /// #
    /// # let pin = MockChan0 {};
    ///
    /// let mut reader = AdcOversampler::new(pin, SystemClock, 10);
    /// reader.configure(24, 0, Prescaler::Div16);
    ///
    /// assert_eq!(reader.resolution_bits(), 21); // clamped to native + 11
    /// assert_eq!(reader.samples_to_average(), 1); // clamped to 1
    /// assert_eq!(reader.clock_frequency(), 1_000_000);
    /// ```
    pub fn configure(
        &mut self,
        resolution_bits: u32,
        samples_to_average: u32,
        prescaler: Prescaler,
    ) where
        Clock: AdcClock,
    {
        self.set_resolution_bits(resolution_bits);
        self.set_samples_to_average(samples_to_average);
        self.set_prescaler(prescaler);
    }

    /// Sets the resolution of subsequent readings, clamped to
    /// `[native_bits, native_bits + 11]`.
    pub fn set_resolution_bits(&mut self, resolution_bits: u32) {
        self.resolution_bits =
            resolution_bits.clamp(self.native_bits, self.native_bits + MAX_EXTRA_BITS);
    }

    /// Sets how many oversampled readings [`read`](AdcOversampler::read)
    /// averages. Zero is clamped to 1.
    pub fn set_samples_to_average(&mut self, samples_to_average: u32) {
        self.samples_to_average = samples_to_average.max(1);
    }

    /// Sets the conversion-clock prescaler.
    ///
    /// The clock collaborator is reprogrammed only when the setting
    /// differs from the current one.
    pub fn set_prescaler(&mut self, prescaler: Prescaler)
    where
        Clock: AdcClock,
    {
        if prescaler != self.prescaler {
            self.prescaler = prescaler;
            self.clock_frequency = self.clock.set_prescaler(prescaler);
        }
    }

    /// Returns the width of a raw conversion in bits.
    pub fn native_resolution_bits(&self) -> u32 {
        self.native_bits
    }

    /// Returns the effective resolution of a reading in bits.
    pub fn resolution_bits(&self) -> u32 {
        self.resolution_bits
    }

    /// Returns the number of readings averaged per
    /// [`read`](AdcOversampler::read).
    pub fn samples_to_average(&self) -> u32 {
        self.samples_to_average
    }

    /// Returns the configured conversion-clock prescaler.
    pub fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    /// Returns the conversion-clock frequency in Hz, as last reported by
    /// the clock collaborator.
    pub fn clock_frequency(&self) -> u32 {
        self.clock_frequency
    }

    /// Returns the largest value [`read`](AdcOversampler::read) can
    /// produce at the current resolution:
    /// `(2^native_bits - 1) * 2^extra_bits`. Useful for scaling readings
    /// to a voltage.
    ///
    /// # Examples
    ///
    /// ```
    /// use adc_oversampler::{AdcClock, AdcOversampler, Prescaler};
    /// # use embedded_hal_mock::adc::MockChan0;
    /// #
    /// # struct SystemClock;
    /// # impl AdcClock for SystemClock {
    /// #     fn set_prescaler(&mut self, prescaler: Prescaler) -> u32 {
    /// #         16_000_000 / prescaler.divisor()
    /// #     }
    /// # }
    /// #
    /// # let pin = MockChan0 {};
    ///
    /// let mut reader = AdcOversampler::new(pin, SystemClock, 10);
    /// assert_eq!(reader.max_possible_reading(), 1023);
    ///
    /// reader.set_resolution_bits(12);
    /// assert_eq!(reader.max_possible_reading(), 4092);
    /// ```
    pub fn max_possible_reading(&self) -> u32 {
        ((1u32 << self.native_bits) - 1) << self.extra_bits()
    }

    /// Takes one averaged reading at the configured resolution.
    ///
    /// Pulls `4^extra_bits` raw samples per reading and
    /// `samples_to_average` readings in total, blocking on each
    /// conversion, then returns the average as a float. An error from the
    /// ADC aborts the reading and is passed through unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use adc_oversampler::{AdcClock, AdcOversampler, Prescaler};
    /// # use embedded_hal_mock::{
    /// #     adc::{Mock, MockChan0, Transaction},
    /// #     common::Generic,
    /// # };
    /// #
    /// # struct SystemClock;
    /// # impl AdcClock for SystemClock {
    /// #     fn set_prescaler(&mut self, prescaler: Prescaler) -> u32 {
    /// #         16_000_000 / prescaler.divisor()
    /// #     }
    /// # }
    /// #
    /// # let expectations: [Transaction<u16>; 4] = [
    /// #     Transaction::read(0, 100),
    /// #     Transaction::read(0, 100),
    /// #     Transaction::read(0, 101),
    /// #     Transaction::read(0, 101),
    /// # ];
    /// # let mut adc = Mock::new(&expectations);
    /// # let pin = MockChan0 {};
    ///
    /// let mut reader = AdcOversampler::new(pin, SystemClock, 10);
    /// reader.set_resolution_bits(11);
    ///
    /// // Four raw 10-bit samples make one 11-bit reading.
    /// assert_eq!(reader.read(&mut adc), Ok(201.0));
    /// ```
    pub fn read<Adc, ADC, Word>(&mut self, adc: &mut Adc) -> Result<f32, Error<Adc, ADC, Word, Pin>>
    where
        Word: Copy + Into<u32>,
        Pin: Channel<ADC>,
        Adc: OneShot<ADC, Word, Pin>,
    {
        let extra_bits = self.extra_bits();
        let oversample_count = 1u64 << (2 * extra_bits);

        let mut reading_sum: u64 = 0;
        for _ in 0..self.samples_to_average {
            let mut sum: u64 = 0;
            for _ in 0..oversample_count {
                let sample = adc.read(&mut self.pin)?;
                sum += u64::from(sample.into());
            }
            reading_sum += decimate(sum, extra_bits);
        }

        Ok(reading_sum as f32 / self.samples_to_average as f32)
    }

    fn extra_bits(&self) -> u32 {
        self.resolution_bits - self.native_bits
    }
}
