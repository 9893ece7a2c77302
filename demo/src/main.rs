mod config;

use crate::config::Config;
use dotenv::dotenv;
use log::{debug, info};
use std::env::args;
use std::thread::sleep;
use std::time::Duration;
use time::OffsetDateTime;
use tm1637::{GpioTm1637Driver, Tm1637Driver};
use tm1637_gpio::gpiod::GpiodDriver;
use tm1637_gpio::{GpioBias, GpioDriver};

const USAGE: &str = "usage: tm1637_demo <show TEXT | numbers A B | temp C | scroll TEXT | clock | brightness N | on | off | clear>";

/// Shows the local time as HH:MM, blinking the colon every second.
fn run_clock(display: &mut dyn Tm1637Driver) -> eyre::Result<()> {
    info!("Showing the time, Ctrl+C to stop");
    let mut colon = true;
    loop {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        display.numbers_with_colon(now.hour().into(), now.minute().into(), colon)?;
        colon = !colon;
        sleep(Duration::from_millis(500));
    }
}

fn run(display: &mut dyn Tm1637Driver, command: &[String]) -> eyre::Result<bool> {
    let arg = |i: usize| {
        command
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| eyre::eyre!(USAGE))
    };

    let acknowledged = match arg(0)? {
        "show" => display.show(arg(1)?)?,
        "numbers" => display.numbers(arg(1)?.parse()?, arg(2)?.parse()?)?,
        "temp" => display.temperature(arg(1)?.parse()?)?,
        "scroll" => display.scroll(arg(1)?, Duration::from_millis(250))?,
        "clock" => {
            run_clock(display)?;
            true
        }
        "brightness" => display.brightness(arg(1)?.parse()?)?,
        "on" => display.on()?,
        "off" => display.off()?,
        "clear" => display.clear()?,
        _ => return Err(eyre::eyre!(USAGE)),
    };
    Ok(acknowledged)
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    let command = args().skip(1).collect::<Vec<_>>();
    let config = Config::from_env()?;
    info!("TM1637 @ CLK: {}, DIO: {}", config.clk_pin, config.dio_pin);

    debug!("Initializing GPIO driver...");
    let gpio = match &config.chip {
        Some(path) => GpiodDriver::open(path)?,
        None => GpiodDriver::find_for_line(config.clk_pin as u32)?,
    };
    debug!("{:?} initialized.", gpio);

    let mut clk_pin = gpio.get_pin(config.clk_pin)?;
    let mut dio_pin = gpio.get_pin(config.dio_pin)?;
    dio_pin.set_bias(GpioBias::PullUp)?;

    let mut display = GpioTm1637Driver::new(&mut *clk_pin, &mut *dio_pin, config.display)?;
    debug!("{:?} initialized.", display);

    let acknowledged = run(&mut display, &command)?;
    if !acknowledged {
        info!("The display didn't acknowledge every byte, check the wiring if nothing shows up");
    }

    display.release()?;
    Ok(())
}
