//! TM1637 command encoding.
//!
//! Every command is a single byte sent in its own start/stop delimited frame, except the address
//! command, which is followed by the segment bytes in the same frame.
//!
//! | Command         | Bits       | Meaning                                         |
//! |-----------------|------------|-------------------------------------------------|
//! | Data            | `0100 0F00`| `F` is `1` for fixed address, `0` for auto increment |
//! | Address         | `1100 0AAA`| `AAA` is the digit register, 0-5                |
//! | Display control | `1000 DBBB`| `D` is display on, `BBB` is the brightness      |
use crate::{Tm1637Error, Tm1637Result};

/// Data command, write to display registers with auto increment.
pub const DATA_COMMAND: u8 = 0b0100_0000;
/// Fixed address bit of the data command.
pub const FIXED_ADDRESS: u8 = 0b0000_0100;
pub const ADDRESS_COMMAND: u8 = 0b1100_0000;
pub const DISPLAY_CONTROL_COMMAND: u8 = 0b1000_0000;
/// Display on bit of the display control command.
pub const DISPLAY_ON: u8 = 0b0000_1000;
/// Number of digit registers the controller has.
pub const MAX_DIGITS: usize = 6;

/// How the controller advances the digit register after each written byte.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AddressMode {
    /// Consecutive bytes of a frame go to consecutive digit registers.
    #[default]
    AutoIncrement,
    /// Every byte goes to the register selected by the address command.
    Fixed,
}

/// Display brightness, from `0` (dimmest) to `7` (brightest).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Brightness = Brightness(0);
    pub const MAX: Brightness = Brightness(7);

    /// # Errors
    /// - `Tm1637Error::InvalidBrightness` if `level` is above `7`.
    pub fn new(level: u8) -> Tm1637Result<Self> {
        if level > Self::MAX.0 {
            return Err(Tm1637Error::InvalidBrightness(level));
        }
        Ok(Brightness(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Brightness {
    type Error = Tm1637Error;

    fn try_from(level: u8) -> Tm1637Result<Self> {
        Brightness::new(level)
    }
}

/// The display control state. The chip is write only, so this is the only record of it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayControl {
    pub on: bool,
    pub brightness: Brightness,
}

impl DisplayControl {
    pub fn with_on(self, on: bool) -> Self {
        DisplayControl { on, ..self }
    }

    pub fn with_brightness(self, brightness: Brightness) -> Self {
        DisplayControl { brightness, ..self }
    }
}

impl Default for DisplayControl {
    fn default() -> Self {
        DisplayControl {
            on: true,
            brightness: Brightness::MIN,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Data(AddressMode),
    Address(u8),
    DisplayControl(DisplayControl),
}

impl Command {
    /// Address command for the digit register at `position`.
    ///
    /// # Errors
    /// - `Tm1637Error::InvalidPosition` if `position` is not a register of the controller.
    pub fn address(position: usize) -> Tm1637Result<Self> {
        if position >= MAX_DIGITS {
            return Err(Tm1637Error::InvalidPosition(position));
        }
        Ok(Command::Address(position as u8))
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Command::Data(AddressMode::AutoIncrement) => DATA_COMMAND,
            Command::Data(AddressMode::Fixed) => DATA_COMMAND | FIXED_ADDRESS,
            Command::Address(address) => ADDRESS_COMMAND | (address & 0b111),
            Command::DisplayControl(control) => {
                let mut command = DISPLAY_CONTROL_COMMAND | control.brightness.level();
                if control.on {
                    command |= DISPLAY_ON;
                }
                command
            }
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.to_byte()
    }
}
