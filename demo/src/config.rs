use dotenv::var;
use std::path::PathBuf;
use std::time::Duration;
use tm1637::{AckPolicy, Brightness, Tm1637Config};

/// Wiring and display settings, read from the environment (or a `.env` file).
#[derive(Debug)]
pub struct Config {
    pub clk_pin: usize,
    pub dio_pin: usize,
    /// GPIO chip device. Looked up by the CLK line when not set.
    pub chip: Option<PathBuf>,
    pub display: Tm1637Config,
}

fn parse_ack_policy(s: &str) -> eyre::Result<AckPolicy> {
    match s.trim().to_ascii_lowercase().as_str() {
        "ignore" => Ok(AckPolicy::Ignore),
        "warn" => Ok(AckPolicy::Warn),
        "fail" => Ok(AckPolicy::Fail),
        other => Err(eyre::eyre!("Invalid ACK policy {:?}, expected ignore, warn or fail", other)),
    }
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let clk_pin = var("TM1637_PIN_CLK")?.parse()?;
        let dio_pin = var("TM1637_PIN_DIO")?.parse()?;
        let chip = var("TM1637_GPIO_CHIP").ok().map(PathBuf::from);

        let mut display = Tm1637Config::default().with_brightness(Brightness::MAX);
        if let Ok(brightness) = var("TM1637_BRIGHTNESS") {
            display = display.with_brightness(Brightness::new(brightness.parse()?)?);
        }
        if let Ok(digits) = var("TM1637_DIGITS") {
            display = display.with_digits(digits.parse()?);
        }
        if let Ok(delay) = var("TM1637_BIT_DELAY_US") {
            display = display.with_bit_delay(Duration::from_micros(delay.parse()?));
        }
        if let Ok(policy) = var("TM1637_ACK_POLICY") {
            display = display.with_ack_policy(parse_ack_policy(&policy)?);
        }

        Ok(Config {
            clk_pin,
            dio_pin,
            chip,
            display,
        })
    }
}
