//! A simulated TM1637 on simulated lines, for tests.
//!
//! The chip watches every CLK and DIO transition the way the real one would: DIO falling while
//! CLK is high starts a frame, DIO rising while CLK is high ends it, and every CLK rising edge
//! inside a frame latches one bit, least significant first. After the eighth bit the chip pulls
//! DIO low until the ninth clock falls, unless it was built with [SimChip::without_ack].
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use tm1637_gpio::{GpioError, GpioInput, GpioOutput, GpioPin, GpioResult};

#[derive(Debug)]
struct ChipState {
    acknowledges: bool,
    clk: bool,
    /// Level the host drives DIO to, `None` while it's released.
    dio_driven: Option<bool>,
    pulling_low: bool,
    dio: bool,
    in_frame: bool,
    bits: u8,
    byte: u8,
    ack_clock: bool,
    current: Vec<u8>,
    frames: Vec<Vec<u8>>,
    starts: usize,
    stops: usize,
    acks_given: usize,
}

impl ChipState {
    fn new(acknowledges: bool) -> Self {
        ChipState {
            acknowledges,
            clk: true,
            dio_driven: None,
            pulling_low: false,
            dio: true,
            in_frame: false,
            bits: 0,
            byte: 0,
            ack_clock: false,
            current: Vec::new(),
            frames: Vec::new(),
            starts: 0,
            stops: 0,
            acks_given: 0,
        }
    }

    fn level(&self) -> bool {
        self.dio_driven.unwrap_or(!self.pulling_low)
    }

    fn drive_dio(&mut self, driven: Option<bool>) {
        self.dio_driven = driven;
        self.settle();
    }

    fn settle(&mut self) {
        let level = self.level();
        if level == self.dio {
            return;
        }
        self.dio = level;
        if self.clk {
            if level {
                self.stop_condition();
            } else {
                self.start_condition();
            }
        }
    }

    fn start_condition(&mut self) {
        self.starts += 1;
        self.in_frame = true;
        self.bits = 0;
        self.byte = 0;
        self.ack_clock = false;
        self.current.clear();
    }

    fn stop_condition(&mut self) {
        self.stops += 1;
        if self.in_frame {
            self.frames.push(std::mem::take(&mut self.current));
        }
        self.in_frame = false;
        self.pulling_low = false;
    }

    fn set_clk(&mut self, high: bool) {
        if high == self.clk {
            return;
        }
        self.clk = high;
        if !self.in_frame {
            return;
        }

        if high {
            if self.bits < 8 {
                if self.dio {
                    self.byte |= 1 << self.bits;
                }
                self.bits += 1;
            } else {
                self.ack_clock = true;
                if self.pulling_low && !self.dio {
                    self.acks_given += 1;
                }
            }
        } else if self.ack_clock {
            self.ack_clock = false;
            self.pulling_low = false;
            self.bits = 0;
            self.byte = 0;
            self.settle();
        } else if self.bits == 8 {
            self.current.push(self.byte);
            self.pulling_low = self.acknowledges;
            self.settle();
        }
    }
}

/// Handle to a simulated chip, used to inspect what it received.
pub struct SimChip {
    state: Rc<RefCell<ChipState>>,
}

impl SimChip {
    pub fn new() -> Self {
        SimChip {
            state: Rc::new(RefCell::new(ChipState::new(true))),
        }
    }

    /// A chip that never pulls DIO low to acknowledge, like some clones.
    pub fn without_ack() -> Self {
        SimChip {
            state: Rc::new(RefCell::new(ChipState::new(false))),
        }
    }

    /// The CLK and DIO pins wired to this chip.
    pub fn pins(&self) -> (SimPin, SimPin) {
        let pin = |line| SimPin {
            state: Rc::clone(&self.state),
            line,
            fail_claims: false,
        };
        (pin(SimLine::Clock), pin(SimLine::Data))
    }

    /// Every complete frame received so far.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state.borrow().frames.clone()
    }

    pub fn acks_given(&self) -> usize {
        self.state.borrow().acks_given
    }

    /// Count of start and stop conditions seen on the bus.
    pub fn conditions(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.starts, state.stops)
    }

    /// Both lines high, no frame in progress.
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.clk && state.dio && !state.in_frame
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimLine {
    Clock,
    Data,
}

#[derive(Debug)]
pub struct SimPin {
    state: Rc<RefCell<ChipState>>,
    line: SimLine,
    fail_claims: bool,
}

impl SimPin {
    /// Makes every following claim of this pin fail, as if another process held the line.
    pub fn fail_claims(&mut self) {
        self.fail_claims = true;
    }

    fn claim(&self) -> GpioResult<()> {
        if self.fail_claims {
            return Err(GpioError::AlreadyInUse);
        }
        Ok(())
    }

    fn drive(&self, value: bool) {
        let mut state = self.state.borrow_mut();
        match self.line {
            SimLine::Clock => state.set_clk(value),
            SimLine::Data => state.drive_dio(Some(value)),
        }
    }
}

impl GpioPin for SimPin {
    fn as_input(&mut self) -> GpioResult<Box<dyn GpioInput + '_>> {
        self.claim()?;
        if self.line == SimLine::Data {
            self.state.borrow_mut().drive_dio(None);
        }
        Ok(Box::new(SimInput { pin: self }))
    }

    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.as_output_with(false)
    }

    fn as_output_with(&mut self, value: bool) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.claim()?;
        self.drive(value);
        Ok(Box::new(SimOutput { pin: self }))
    }
}

#[derive(Debug)]
struct SimInput<'a> {
    pin: &'a SimPin,
}

impl GpioInput for SimInput<'_> {
    fn read(&self) -> GpioResult<bool> {
        let state = self.pin.state.borrow();
        Ok(match self.pin.line {
            SimLine::Clock => state.clk,
            SimLine::Data => state.level(),
        })
    }
}

#[derive(Debug)]
struct SimOutput<'a> {
    pin: &'a SimPin,
}

impl GpioOutput for SimOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.pin.drive(value);
        Ok(())
    }
}

impl Drop for SimOutput<'_> {
    fn drop(&mut self) {
        if self.pin.line == SimLine::Data {
            self.pin.state.borrow_mut().drive_dio(None);
        }
    }
}
