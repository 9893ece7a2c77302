//! Driver for the TM1637 LED display controller.
//!
//! The TM1637 talks a two-wire protocol that looks like I²C but has no device address and samples
//! data least significant bit first. It is bit-banged here over two GPIO lines:
//!
//! - [bus] generates the start/stop conditions, shifts bytes out and samples the chip's ACK,
//! - [command] encodes the data, address and display control commands,
//! - [segments] turns digits and text into 7-segment patterns,
//! - [driver] ties it all together behind the [Tm1637Driver] trait.
//!
//! ```no_run
//! use tm1637::{GpioTm1637Driver, Tm1637Config, Tm1637Driver};
//! use tm1637_gpio::GpioDriver;
//! use tm1637_gpio::gpiod::GpiodDriver;
//!
//! let gpio = GpiodDriver::find_for_line(23)?;
//! let mut clk = gpio.get_pin(23)?;
//! let mut dio = gpio.get_pin(24)?;
//! let mut display = GpioTm1637Driver::new(&mut *clk, &mut *dio, Tm1637Config::default())?;
//! display.brightness(7)?;
//! display.numbers(12, 34)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bus;
pub mod command;
pub mod driver;
pub mod segments;

#[cfg(test)]
mod sim;

pub use command::{AddressMode, Brightness, Command, DisplayControl};
pub use driver::{AckPolicy, GpioTm1637Driver, Tm1637Config, Tm1637Driver};
pub use segments::{DisplayBuffer, Glyph, Padding};

use thiserror::Error;
use tm1637_gpio::GpioError;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum Tm1637Error {
    /// A line could not be claimed or driven.
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    #[error("brightness {0} out of range 0-7")]
    InvalidBrightness(u8),
    #[error("digit position {0} out of range")]
    InvalidPosition(usize),
    #[error("unsupported digit count {0}, expected 1-6")]
    InvalidDigitCount(usize),
    /// The chip did not acknowledge at least one byte of the frame.
    /// Only returned with [AckPolicy::Fail].
    #[error("no ACK for frame {frame:02X?}")]
    AckMissing { frame: Vec<u8> },
}

pub type Tm1637Result<T> = Result<T, Tm1637Error>;
