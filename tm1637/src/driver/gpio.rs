use crate::bus::Tm1637Bus;
use crate::command::{AddressMode, Command, DisplayControl, MAX_DIGITS};
use crate::driver::{AckPolicy, Tm1637Config, Tm1637Driver};
use crate::{Tm1637Error, Tm1637Result};
use log::{debug, warn};
use tm1637_gpio::GpioPin;

/// GpioTm1637Driver drives a TM1637 display by bit-banging its CLK and DIO lines.
///
/// The driver holds both pins for its whole lifetime, so only one driver can talk to a given
/// display at a time. It's not meant to be shared between threads; wrap it in a mutex if it has
/// to be.
#[derive(Debug)]
pub struct GpioTm1637Driver<'a> {
    bus: Tm1637Bus<'a>,
    digits: usize,
    ack_policy: AckPolicy,
    control: DisplayControl,
}

impl<'a> GpioTm1637Driver<'a> {
    /// Creates a new GpioTm1637Driver, claiming both lines and leaving the bus idle (both high).
    /// Nothing is sent to the chip until the first write.
    ///
    /// # Parameters
    ///
    /// - `clk_pin`: Pin wired to CLK. Claimed as an output for the lifetime of the driver.
    /// - `dio_pin`: Pin wired to DIO. Switched between output and input to read the ACK. Most
    ///   modules have a pull-up on DIO; if yours doesn't, enable the pin's pull-up bias.
    /// - `config`: Digit count, timing, ACK policy and initial display state.
    ///
    /// # Errors
    /// - `Tm1637Error::InvalidDigitCount` if the config asks for more digits than the chip has.
    /// - `Tm1637Error::Gpio` if a line can't be claimed. Nothing stays claimed in that case.
    pub fn new(
        clk_pin: &'a mut dyn GpioPin,
        dio_pin: &'a mut dyn GpioPin,
        config: Tm1637Config,
    ) -> Tm1637Result<Self> {
        if config.digits == 0 || config.digits > MAX_DIGITS {
            return Err(Tm1637Error::InvalidDigitCount(config.digits));
        }

        let bus = Tm1637Bus::new(clk_pin, dio_pin, config.bit_delay)?;
        debug!("{:?} initialized with {:?}", bus, config);

        Ok(GpioTm1637Driver {
            bus,
            digits: config.digits,
            ack_policy: config.ack_policy,
            control: config.control,
        })
    }

    pub fn ack_policy(&self) -> AckPolicy {
        self.ack_policy
    }

    pub fn set_ack_policy(&mut self, ack_policy: AckPolicy) {
        self.ack_policy = ack_policy;
    }

    /// Leaves the bus idle and gives both lines back. The display keeps showing its content.
    pub fn release(self) -> Tm1637Result<()> {
        self.bus.release()?;
        debug!("TM1637 released");
        Ok(())
    }

    /// Sends one frame and applies the ACK policy to it.
    fn send(&mut self, frame: &[u8]) -> Tm1637Result<bool> {
        let ack = self.bus.write_frame(frame)?;
        debug!("Sent frame {:02X?}, ACK {}/{}", frame, ack.acknowledged, ack.sent);

        if ack.all() {
            return Ok(true);
        }

        match self.ack_policy {
            AckPolicy::Ignore => {}
            AckPolicy::Warn => warn!(
                "TM1637 acknowledged {} of {} bytes of frame {:02X?}",
                ack.acknowledged, ack.sent, frame
            ),
            AckPolicy::Fail => {
                return Err(Tm1637Error::AckMissing {
                    frame: frame.to_vec(),
                });
            }
        }
        Ok(false)
    }

    fn send_command(&mut self, command: Command) -> Tm1637Result<bool> {
        self.send(&[command.to_byte()])
    }

    fn check_position(&self, position: usize) -> Tm1637Result<()> {
        if position >= self.digits {
            return Err(Tm1637Error::InvalidPosition(position));
        }
        Ok(())
    }
}

impl Tm1637Driver for GpioTm1637Driver<'_> {
    fn digits(&self) -> usize {
        self.digits
    }

    fn control(&self) -> DisplayControl {
        self.control
    }

    fn set_control(&mut self, control: DisplayControl) -> Tm1637Result<bool> {
        self.control = control;
        self.send_command(Command::DisplayControl(control))
    }

    /// Sends the data command with auto increment, then the address command followed by the
    /// segments in one frame, then the display control command.
    fn write_segments(&mut self, position: usize, segments: &[u8]) -> Tm1637Result<bool> {
        self.check_position(position)?;
        let count = segments.len().min(self.digits - position);

        let mut frame = Vec::with_capacity(count + 1);
        frame.push(Command::address(position)?.to_byte());
        frame.extend_from_slice(&segments[..count]);

        let mut acknowledged = self.send_command(Command::Data(AddressMode::AutoIncrement))?;
        acknowledged &= self.send(&frame)?;
        acknowledged &= self.send_command(Command::DisplayControl(self.control))?;
        Ok(acknowledged)
    }

    fn write_digit(&mut self, position: usize, segment: u8) -> Tm1637Result<bool> {
        self.check_position(position)?;
        let address = Command::address(position)?.to_byte();

        let mut acknowledged = self.send_command(Command::Data(AddressMode::Fixed))?;
        acknowledged &= self.send(&[address, segment])?;
        acknowledged &= self.send_command(Command::DisplayControl(self.control))?;
        Ok(acknowledged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Brightness;
    use crate::segments::{encode_char, encode_text, Padding, BLANK, COLON};
    use crate::sim::SimChip;
    use std::time::Duration;
    use tm1637_gpio::GpioError;

    fn config() -> Tm1637Config {
        Tm1637Config::default().with_bit_delay(Duration::ZERO)
    }

    fn content_frames(segments: &[u8], control: u8) -> Vec<Vec<u8>> {
        let mut frame = vec![0xC0];
        frame.extend_from_slice(segments);
        vec![vec![0x40], frame, vec![control]]
    }

    #[test]
    fn construction_sends_nothing() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        assert!(chip.frames().is_empty());
        assert!(chip.is_idle());
        assert_eq!(display.digits(), 4);
        assert_eq!(display.control(), DisplayControl::default());
    }

    #[test]
    fn construction_fails_without_lines() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        clk.fail_claims();

        let result = GpioTm1637Driver::new(&mut clk, &mut dio, config());
        assert_eq!(result.unwrap_err(), Tm1637Error::Gpio(GpioError::AlreadyInUse));
    }

    #[test]
    fn construction_checks_digit_count() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();

        let result = GpioTm1637Driver::new(&mut clk, &mut dio, config().with_digits(7));
        assert_eq!(result.unwrap_err(), Tm1637Error::InvalidDigitCount(7));
    }

    #[test]
    fn show_sends_data_address_and_control_frames() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        assert!(display.show("TEST").unwrap());

        assert_eq!(chip.frames(), content_frames(&encode_text("TEST"), 0x88));
        assert_eq!(chip.acks_given(), 7);
    }

    #[test]
    fn empty_text_matches_clear() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.show("").unwrap();
        display.clear().unwrap();

        let frames = chip.frames();
        assert_eq!(frames[..3], frames[3..]);
        assert_eq!(frames[1], vec![0xC0, BLANK, BLANK, BLANK, BLANK]);
    }

    #[test]
    fn long_text_is_cut_on_the_right() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.show("HELLO").unwrap();
        display.show("HELL").unwrap();

        let frames = chip.frames();
        assert_eq!(frames[..3], frames[3..]);
    }

    #[test]
    fn numbers_light_the_colon() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.numbers(12, 34).unwrap();
        display.numbers_with_colon(12, 34, false).unwrap();

        let frames = chip.frames();
        let with_colon = [encode_char('1'), encode_char('2') | COLON, encode_char('3'), encode_char('4')];
        assert_eq!(frames[1][1..], with_colon);
        assert_eq!(frames[4][1..], encode_text("1234"));
    }

    #[test]
    fn show_with_colon() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.show_with_colon("1200", true).unwrap();

        assert_eq!(chip.frames()[1][2], encode_char('2') | COLON);
    }

    #[test]
    fn colon_needs_two_characters() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.show_with_colon("1", true).unwrap();
        display.show_with_colon("12", true).unwrap();

        let frames = chip.frames();
        assert_eq!(frames[1][1..], [encode_char('1'), BLANK, BLANK, BLANK]);
        assert_eq!(frames[4][2], encode_char('2') | COLON);
    }

    #[test]
    fn brightness_sends_one_control_frame() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        for level in 0..=7u8 {
            display.brightness(level).unwrap();
        }

        let expected = (0..=7u8).map(|level| vec![0x88 | level]).collect::<Vec<_>>();
        assert_eq!(chip.frames(), expected);
        assert_eq!(display.control().brightness, Brightness::MAX);
    }

    #[test]
    fn brightness_out_of_range_is_rejected() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.brightness(3).unwrap();
        assert_eq!(display.brightness(8), Err(Tm1637Error::InvalidBrightness(8)));

        assert_eq!(chip.frames(), vec![vec![0x8B]]);
        assert_eq!(display.control().brightness.level(), 3);
    }

    #[test]
    fn on_off_on() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.brightness(2).unwrap();
        display.on().unwrap();
        display.off().unwrap();
        display.on().unwrap();

        assert!(display.control().on);
        assert_eq!(chip.frames()[1..], [vec![0x8A], vec![0x82], vec![0x8A]]);
    }

    #[test]
    fn control_state_is_resent_after_content() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.off().unwrap();
        display.show("0").unwrap();

        assert_eq!(chip.frames().last(), Some(&vec![0x80]));
    }

    #[test]
    fn write_segments_at_position() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.write_segments(2, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(
            display.write_segments(4, &[0x01]),
            Err(Tm1637Error::InvalidPosition(4))
        );

        assert_eq!(chip.frames(), vec![vec![0x40], vec![0xC2, 0x01, 0x02], vec![0x88]]);
    }

    #[test]
    fn write_digit_uses_fixed_address() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.write_digit(3, 0x6F).unwrap();

        assert_eq!(chip.frames(), vec![vec![0x44], vec![0xC3, 0x6F], vec![0x88]]);
    }

    #[test]
    fn number_and_temperature() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.number(42, Padding::Blank).unwrap();
        display.temperature(-3).unwrap();

        let frames = chip.frames();
        assert_eq!(frames[1][1..], encode_text("  42"));
        assert_eq!(frames[4][1..], encode_text("-3*C"));
    }

    #[test]
    fn scroll_slides_text_through() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.scroll("HI", Duration::ZERO).unwrap();

        let windows = chip
            .frames()
            .chunks(3)
            .map(|frames| frames[1][1..].to_vec())
            .collect::<Vec<_>>();
        assert_eq!(windows.len(), 2 + 4 + 1);
        assert_eq!(windows[0], encode_text("    "));
        assert_eq!(windows[1], encode_text("   H"));
        assert_eq!(windows[4], encode_text("HI  "));
        assert_eq!(windows[6], encode_text("    "));
    }

    #[test]
    fn missing_ack_is_not_fatal_by_default() {
        let chip = SimChip::without_ack();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        assert_eq!(display.show("0"), Ok(false));
        display.set_ack_policy(AckPolicy::Ignore);
        assert_eq!(display.on(), Ok(false));

        assert_eq!(chip.frames().len(), 4);
        assert!(chip.is_idle());
    }

    #[test]
    fn missing_ack_fails_after_the_frame() {
        let chip = SimChip::without_ack();
        let (mut clk, mut dio) = chip.pins();
        let config = config().with_ack_policy(AckPolicy::Fail);
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config).unwrap();

        assert_eq!(
            display.show("0"),
            Err(Tm1637Error::AckMissing { frame: vec![0x40] })
        );

        assert_eq!(chip.frames(), vec![vec![0x40]]);
        assert!(chip.is_idle());
    }

    #[test]
    fn release_leaves_bus_idle() {
        let chip = SimChip::new();
        let (mut clk, mut dio) = chip.pins();
        let mut display = GpioTm1637Driver::new(&mut clk, &mut dio, config()).unwrap();

        display.show("done").unwrap();
        display.release().unwrap();

        assert!(chip.is_idle());
        assert_eq!(chip.frames().len(), 3);
    }
}
