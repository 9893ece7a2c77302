//! 7-segment encoding.
//!
//! Bits 0-6 of a segment byte drive segments A-G, bit 7 drives the decimal point, which is wired
//! to the colon on the second digit of clock-style modules.
//!
//! ```text
//!    -A-
//!   F   B
//!    -G-
//!   E   C
//!    -D-
//! ```
use crate::command::MAX_DIGITS;
use crate::{Tm1637Error, Tm1637Result};
use std::ops::Deref;

pub const BLANK: u8 = 0x00;
/// Decimal point or colon bit.
pub const COLON: u8 = 0b1000_0000;

/// Digits `0`-`9` followed by the hex digits `A`-`F`.
const DIGITS: [u8; 16] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, //
    0x7F, 0x6F, 0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71, //
];

/// Every character the display can show.
///
/// Letters are shown in whatever case reads best on 7 segments (`b`, `d`, `n`, `r`, ...).
/// `K`, `M`, `W` and `X` have no recognizable form and aren't part of the set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Glyph {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    L,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    Y,
    Z,
    Blank,
    Dash,
    Degree,
}

impl Glyph {
    /// Converts a character to its [Glyph], ignoring case.
    pub fn from_char(c: char) -> Option<Glyph> {
        use Glyph::*;

        let glyph = match c.to_ascii_uppercase() {
            '0' => Digit0,
            '1' => Digit1,
            '2' => Digit2,
            '3' => Digit3,
            '4' => Digit4,
            '5' => Digit5,
            '6' => Digit6,
            '7' => Digit7,
            '8' => Digit8,
            '9' => Digit9,
            'A' => A,
            'B' => B,
            'C' => C,
            'D' => D,
            'E' => E,
            'F' => F,
            'G' => G,
            'H' => H,
            'I' => I,
            'J' => J,
            'L' => L,
            'N' => N,
            'O' => O,
            'P' => P,
            'Q' => Q,
            'R' => R,
            'S' => S,
            'T' => T,
            'U' => U,
            'V' => V,
            'Y' => Y,
            'Z' => Z,
            ' ' => Blank,
            '-' => Dash,
            '*' | '°' => Degree,
            _ => return None,
        };
        Some(glyph)
    }

    /// Gets the segment byte of the glyph.
    pub fn segments(self) -> u8 {
        use Glyph::*;

        match self {
            Digit0 => DIGITS[0],
            Digit1 => DIGITS[1],
            Digit2 => DIGITS[2],
            Digit3 => DIGITS[3],
            Digit4 => DIGITS[4],
            Digit5 => DIGITS[5],
            Digit6 => DIGITS[6],
            Digit7 => DIGITS[7],
            Digit8 => DIGITS[8],
            Digit9 => DIGITS[9],
            A => DIGITS[0xA],
            B => DIGITS[0xB],
            C => DIGITS[0xC],
            D => DIGITS[0xD],
            E => DIGITS[0xE],
            F => DIGITS[0xF],
            G => 0x3D,
            H => 0x76,
            I => 0x06,
            J => 0x1E,
            L => 0x38,
            N => 0x54,
            O => 0x3F,
            P => 0x73,
            Q => 0x67,
            R => 0x50,
            S => 0x6D,
            T => 0x78,
            U => 0x3E,
            V => 0x1C,
            Y => 0x6E,
            Z => 0x5B,
            Blank => BLANK,
            Dash => 0x40,
            Degree => 0x63,
        }
    }
}

/// How numbers narrower than their field are padded on the left.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Padding {
    #[default]
    Zero,
    Blank,
}

/// Encodes a hex digit, only the low nibble of `digit` is used.
pub fn encode_digit(digit: u8) -> u8 {
    DIGITS[(digit & 0x0F) as usize]
}

/// Encodes a character, characters without a [Glyph] come out blank.
pub fn encode_char(c: char) -> u8 {
    Glyph::from_char(c).map_or(BLANK, Glyph::segments)
}

/// Encodes every character of `text`, without limiting its length.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// Encodes `value` into exactly `width` digits. `width` is capped at the 6 digits the
/// controller has, so wider requests come out 6 digits long.
///
/// Values that don't fit are clamped to the nearest one that does: `-99` to `999` for width 3,
/// a negative number needs one digit for the sign. A negative number padded with zeros keeps
/// the sign in front, `-5` becomes `-005` at width 4.
pub fn encode_number(value: i32, width: usize, padding: Padding) -> Vec<u8> {
    if width == 0 {
        return Vec::new();
    }

    let width = width.min(MAX_DIGITS);
    let max = 10i64.pow(width as u32) - 1;
    let min = -(10i64.pow(width as u32 - 1) - 1);
    let value = i64::from(value).clamp(min, max);

    let text = match padding {
        Padding::Zero if value < 0 => format!("-{:0w$}", -value, w = width - 1),
        Padding::Zero => format!("{:0w$}", value, w = width),
        Padding::Blank => format!("{:>w$}", value, w = width),
    };
    encode_text(&text)
}

/// The segment bytes of the whole display, one per digit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayBuffer(Vec<u8>);

impl DisplayBuffer {
    /// Creates an all blank buffer for `digits` digits.
    ///
    /// # Errors
    /// - `Tm1637Error::InvalidDigitCount` if `digits` is zero or more than the controller has.
    pub fn blank(digits: usize) -> Tm1637Result<Self> {
        if digits == 0 || digits > MAX_DIGITS {
            return Err(Tm1637Error::InvalidDigitCount(digits));
        }
        Ok(DisplayBuffer(vec![BLANK; digits]))
    }

    /// Fills the buffer from the left with `segments`. Segments that don't fit are dropped,
    /// digits left over stay blank.
    pub fn from_segments(digits: usize, segments: &[u8]) -> Tm1637Result<Self> {
        let mut buffer = Self::blank(digits)?;
        for (slot, &segment) in buffer.0.iter_mut().zip(segments) {
            *slot = segment;
        }
        Ok(buffer)
    }

    /// Encodes the leftmost characters of `text` that fit.
    pub fn from_text(digits: usize, text: &str) -> Tm1637Result<Self> {
        let segments = text.chars().take(digits).map(encode_char).collect::<Vec<_>>();
        Self::from_segments(digits, &segments)
    }

    /// Two 2-digit numbers side by side, like the hours and minutes of a clock.
    ///
    /// Each number is zero padded and clamped to `-9..=99`. The colon is the decimal point
    /// of the second digit.
    pub fn from_numbers(digits: usize, a: i32, b: i32, colon: bool) -> Tm1637Result<Self> {
        let mut segments = encode_number(a, 2, Padding::Zero);
        segments.extend(encode_number(b, 2, Padding::Zero));
        let mut buffer = Self::from_segments(digits, &segments)?;
        if colon {
            buffer.set_colon(1);
        }
        Ok(buffer)
    }

    /// A temperature in degrees Celsius: two digits, the degree sign and `C`.
    ///
    /// Below `-9` shows `lo`, above `99` shows `hi`.
    pub fn from_temperature(digits: usize, celsius: i32) -> Tm1637Result<Self> {
        let mut segments = match celsius {
            ..=-10 => encode_text("lo"),
            100.. => encode_text("hi"),
            _ => encode_number(celsius, 2, Padding::Blank),
        };
        segments.push(Glyph::Degree.segments());
        segments.push(Glyph::C.segments());
        Self::from_segments(digits, &segments)
    }

    /// Sets the decimal point (or colon) bit of the digit at `position`, if there's such a digit.
    pub fn set_colon(&mut self, position: usize) {
        if let Some(segment) = self.0.get_mut(position) {
            *segment |= COLON;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for DisplayBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}
