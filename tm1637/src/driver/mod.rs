//! TM1637 driver module.
//!
//! See [Tm1637Driver] trait for the driver interface, and [GpioTm1637Driver] for the
//! implementation bit-banging two GPIO lines.

mod gpio;

use crate::bus::DEFAULT_BIT_DELAY;
use crate::command::{Brightness, DisplayControl};
use crate::segments::{DisplayBuffer, Padding, encode_number, encode_text, BLANK};
use crate::Tm1637Result;
pub use gpio::*;
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

/// What to do when the chip doesn't acknowledge a byte.
///
/// Plenty of TM1637 clones don't acknowledge reliably and still display everything correctly,
/// so a missing ACK never interrupts a frame. The policy only decides how it's reported.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AckPolicy {
    /// Report nothing besides the `false` returned by the write.
    Ignore,
    /// Log a warning for every frame with a missing ACK.
    #[default]
    Warn,
    /// Finish the frame, then fail with [crate::Tm1637Error::AckMissing].
    Fail,
}

/// Configuration of a TM1637 display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tm1637Config {
    /// Number of digits on the module, 1 to 6.
    pub digits: usize,
    /// Delay after every line transition.
    pub bit_delay: Duration,
    pub ack_policy: AckPolicy,
    /// Display state sent along with the first write.
    pub control: DisplayControl,
}

impl Default for Tm1637Config {
    fn default() -> Self {
        Tm1637Config {
            digits: 4,
            bit_delay: DEFAULT_BIT_DELAY,
            ack_policy: AckPolicy::default(),
            control: DisplayControl::default(),
        }
    }
}

impl Tm1637Config {
    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    pub fn with_bit_delay(mut self, bit_delay: Duration) -> Self {
        self.bit_delay = bit_delay;
        self
    }

    pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.control.brightness = brightness;
        self
    }

    pub fn with_on(mut self, on: bool) -> Self {
        self.control.on = on;
        self
    }
}

/// The `Tm1637Driver` trait defines the interface of a TM1637 display.
///
/// # Display state
///
/// The TM1637 is write only. The on/off flag and the brightness live in the driver as a
/// [DisplayControl], are sent with [Tm1637Driver::set_control], and are sent again after every
/// content write. Writing the digit registers alone doesn't turn the display on.
///
/// # Content writes
///
/// Every content write is three frames:
/// - the data command, selecting auto increment (or fixed) addressing,
/// - the address command of the first digit, followed by the segment bytes,
/// - the display control command.
///
/// # Results
///
/// Every operation that talks to the chip returns `Ok(true)` if the chip acknowledged every
/// byte, and `Ok(false)` if it missed some and the [AckPolicy] allows carrying on.
/// Content that doesn't fit the display is cut off rather than refused.
pub trait Tm1637Driver: Debug {
    /// Number of digits on the display.
    fn digits(&self) -> usize;

    /// The display state last sent to the chip, or about to be sent with the next write.
    fn control(&self) -> DisplayControl;

    /// Stores `control` and sends it in a display control frame.
    fn set_control(&mut self, control: DisplayControl) -> Tm1637Result<bool>;

    /// Writes `segments` to consecutive digits starting at `position`.
    /// Segments past the last digit are dropped.
    ///
    /// # Errors
    /// - `Tm1637Error::InvalidPosition` if `position` is not a digit of the display.
    fn write_segments(&mut self, position: usize, segments: &[u8]) -> Tm1637Result<bool>;

    /// Writes a single digit using fixed addressing, leaving the others untouched.
    ///
    /// # Errors
    /// - `Tm1637Error::InvalidPosition` if `position` is not a digit of the display.
    fn write_digit(&mut self, position: usize, segment: u8) -> Tm1637Result<bool>;

    /// Writes a whole display buffer, starting at the first digit.
    fn write_buffer(&mut self, buffer: &DisplayBuffer) -> Tm1637Result<bool> {
        self.write_segments(0, buffer.as_bytes())
    }

    /// Sets the brightness, from `0` to `7`, and sends it right away.
    ///
    /// # Errors
    /// - `Tm1637Error::InvalidBrightness` if `level` is above `7`. Nothing is sent and the
    ///   current brightness is kept.
    fn brightness(&mut self, level: u8) -> Tm1637Result<bool> {
        let brightness = Brightness::new(level)?;
        self.set_control(self.control().with_brightness(brightness))
    }

    /// Turns the display on, keeping the brightness.
    fn on(&mut self) -> Tm1637Result<bool> {
        self.set_control(self.control().with_on(true))
    }

    /// Turns the display off. The digit registers keep their content.
    fn off(&mut self) -> Tm1637Result<bool> {
        self.set_control(self.control().with_on(false))
    }

    /// Shows the leftmost characters of `text` that fit, blank padded on the right.
    /// Characters the display can't show come out blank.
    fn show(&mut self, text: &str) -> Tm1637Result<bool> {
        self.show_with_colon(text, false)
    }

    /// Like [Tm1637Driver::show], optionally lighting the colon after the second digit.
    /// The colon stays off for text shorter than two characters.
    fn show_with_colon(&mut self, text: &str, colon: bool) -> Tm1637Result<bool> {
        let mut buffer = DisplayBuffer::from_text(self.digits(), text)?;
        if colon && text.chars().nth(1).is_some() {
            buffer.set_colon(1);
        }
        self.write_buffer(&buffer)
    }

    /// Shows two 2-digit numbers separated by the colon, like a clock.
    fn numbers(&mut self, a: i32, b: i32) -> Tm1637Result<bool> {
        self.numbers_with_colon(a, b, true)
    }

    /// Shows two zero padded 2-digit numbers, each clamped to `-9..=99`.
    fn numbers_with_colon(&mut self, a: i32, b: i32, colon: bool) -> Tm1637Result<bool> {
        let buffer = DisplayBuffer::from_numbers(self.digits(), a, b, colon)?;
        self.write_buffer(&buffer)
    }

    /// Shows one number over the whole display, clamped to what fits.
    fn number(&mut self, value: i32, padding: Padding) -> Tm1637Result<bool> {
        let segments = encode_number(value, self.digits(), padding);
        let buffer = DisplayBuffer::from_segments(self.digits(), &segments)?;
        self.write_buffer(&buffer)
    }

    /// Shows a temperature in degrees Celsius, `lo` below -9 and `hi` above 99.
    fn temperature(&mut self, celsius: i32) -> Tm1637Result<bool> {
        let buffer = DisplayBuffer::from_temperature(self.digits(), celsius)?;
        self.write_buffer(&buffer)
    }

    /// Blanks every digit.
    fn clear(&mut self) -> Tm1637Result<bool> {
        let buffer = DisplayBuffer::blank(self.digits())?;
        self.write_buffer(&buffer)
    }

    /// Scrolls `text` in from the right and out to the left, one digit every `step`.
    /// Blocks until the text is gone.
    fn scroll(&mut self, text: &str, step: Duration) -> Tm1637Result<bool> {
        let digits = self.digits();
        let mut segments = vec![BLANK; digits];
        segments.extend(encode_text(text));
        segments.extend(std::iter::repeat_n(BLANK, digits));

        let mut acknowledged = true;
        for (i, window) in segments.windows(digits).enumerate() {
            if i > 0 && !step.is_zero() {
                sleep(step);
            }
            acknowledged &= self.write_segments(0, window)?;
        }
        Ok(acknowledged)
    }
}
