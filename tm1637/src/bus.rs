//! Bit-banged TM1637 two-wire bus.
//!
//! CLK is claimed as an output for the whole lifetime of the bus. DIO is only claimed while the
//! host drives it: as an output while framing and shifting bits, as an input during the ACK
//! window. Between frames DIO is released and idles high through the module's pull-up resistor.
//!
//! DIO only changes while CLK is low, except for the start (DIO falls while CLK is high) and
//! stop (DIO rises while CLK is high) conditions.
use log::trace;
use std::fmt::{Debug, Formatter};
use std::thread::sleep;
use std::time::Duration;
use tm1637_gpio::{GpioOutput, GpioPin, GpioResult};

/// Delay after every line transition. The TM1637 is specified for clocks up to 250 kHz,
/// this stays well below.
pub const DEFAULT_BIT_DELAY: Duration = Duration::from_micros(10);

/// Acknowledgement summary of one frame.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameAck {
    pub sent: usize,
    pub acknowledged: usize,
}

impl FrameAck {
    /// Whether the chip acknowledged every byte of the frame.
    pub fn all(&self) -> bool {
        self.sent == self.acknowledged
    }
}

pub struct Tm1637Bus<'a> {
    clk: Box<dyn GpioOutput + 'a>,
    dio: &'a mut dyn GpioPin,
    bit_delay: Duration,
}

impl<'a> Tm1637Bus<'a> {
    /// Claims CLK as a high output and checks that DIO can be claimed, leaving the bus idle.
    ///
    /// # Errors
    /// Any error claiming either line. No line stays claimed in that case.
    pub fn new(
        clk_pin: &'a mut dyn GpioPin,
        dio_pin: &'a mut dyn GpioPin,
        bit_delay: Duration,
    ) -> GpioResult<Self> {
        let clk = clk_pin.as_output_with(true)?;
        dio_pin.as_output_with(true)?;
        trace!("Bus idle, CLK: {:?}, DIO: {:?}", clk, dio_pin);
        Ok(Tm1637Bus {
            clk,
            dio: dio_pin,
            bit_delay,
        })
    }

    fn wait(delay: Duration) {
        if !delay.is_zero() {
            sleep(delay);
        }
    }

    /// Start condition: DIO falls while CLK is high. Leaves CLK low, ready for the first bit.
    pub fn start(&mut self) -> GpioResult<()> {
        trace!("Start");
        let dio = self.dio.as_output_with(true)?;
        self.clk.write(true)?;
        Self::wait(self.bit_delay);
        dio.write(false)?;
        Self::wait(self.bit_delay);
        self.clk.write(false)?;
        Self::wait(self.bit_delay);
        Ok(())
    }

    /// Stop condition: DIO rises while CLK is high. Leaves the bus idle.
    pub fn stop(&mut self) -> GpioResult<()> {
        trace!("Stop");
        let dio = self.dio.as_output_with(false)?;
        self.clk.write(false)?;
        Self::wait(self.bit_delay);
        self.clk.write(true)?;
        Self::wait(self.bit_delay);
        dio.write(true)?;
        Self::wait(self.bit_delay);
        Ok(())
    }

    /// Shifts `value` out least significant bit first, then releases DIO for the ninth clock
    /// and samples it. The chip acknowledges by pulling DIO low.
    ///
    /// Returns whether the byte was acknowledged. A missing ACK doesn't stop the byte from
    /// being clocked out completely.
    pub fn write_byte(&mut self, value: u8) -> GpioResult<bool> {
        trace!("Sending byte: {:08b}", value);
        {
            let dio = self.dio.as_output_with(value & 1 != 0)?;
            for bit in 0..8 {
                dio.write((value >> bit) & 1 != 0)?;
                Self::wait(self.bit_delay);
                self.clk.write(true)?;
                Self::wait(self.bit_delay);
                self.clk.write(false)?;
                Self::wait(self.bit_delay);
            }
        }

        let dio = self.dio.as_input()?;
        Self::wait(self.bit_delay);
        self.clk.write(true)?;
        Self::wait(self.bit_delay);
        let ack = !dio.read()?;
        self.clk.write(false)?;
        Self::wait(self.bit_delay);

        trace!("ACK: {}", ack);
        Ok(ack)
    }

    /// Sends one complete frame: start, every byte, stop.
    pub fn write_frame(&mut self, bytes: &[u8]) -> GpioResult<FrameAck> {
        self.start()?;
        let mut ack = FrameAck::default();
        for &byte in bytes {
            ack.sent += 1;
            if self.write_byte(byte)? {
                ack.acknowledged += 1;
            }
        }
        self.stop()?;
        Ok(ack)
    }

    /// Leaves CLK high and DIO released, then gives both lines back.
    pub fn release(self) -> GpioResult<()> {
        self.clk.write(true)?;
        trace!("Bus released");
        Ok(())
    }
}

impl Debug for Tm1637Bus<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tm1637Bus(CLK: {:?}, DIO: {:?})", self.clk, self.dio)
    }
}
