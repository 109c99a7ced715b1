// indicator.rs

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::*;

const ASSOC_FLASH_MS: u32 = 250;
const SERVED_LOW_MS: u32 = 1000;
const SERVED_HIGH_MS: u32 = 2000;
const FAULT_PAUSE_MS: u32 = 2000;

/// Liveness and fault signaling. Implementations own their timing, so a
/// pattern call blocks for the duration of the pattern.
pub trait StatusIndicator {
    /// Steady on: link is up and the loop is serving.
    fn link_up(&mut self);

    /// Steady off.
    fn off(&mut self);

    /// One association poll: double flash at 0.25 s on / 0.25 s off.
    fn associating(&mut self);

    /// Served-a-client pattern: two low/high cycles of 1 s / 2 s.
    fn served(&mut self);

    /// Fault signal: off, then a 2 s pause before the loop restarts.
    fn fault(&mut self);
}

/// Indicator LED on a GPIO pin.
pub struct LedIndicator<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> LedIndicator<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn set(&mut self, on: bool) {
        // an LED that cannot be driven is not worth failing the loop over
        if on {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }

    fn flash(&mut self, on_ms: u32, off_ms: u32) {
        self.set(true);
        self.delay.delay_ms(on_ms);
        self.set(false);
        self.delay.delay_ms(off_ms);
    }
}

impl<P, D> StatusIndicator for LedIndicator<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn link_up(&mut self) {
        self.set(true);
    }

    fn off(&mut self) {
        self.set(false);
    }

    fn associating(&mut self) {
        self.flash(ASSOC_FLASH_MS, ASSOC_FLASH_MS);
        self.flash(ASSOC_FLASH_MS, ASSOC_FLASH_MS);
    }

    fn served(&mut self) {
        for _ in 0..2 {
            self.set(false);
            self.delay.delay_ms(SERVED_LOW_MS);
            self.set(true);
            self.delay.delay_ms(SERVED_HIGH_MS);
        }
    }

    fn fault(&mut self) {
        self.set(false);
        self.delay.delay_ms(FAULT_PAUSE_MS);
    }
}

/// Indicator for hosts without a LED: logs the state changes and keeps
/// the same pattern timing.
pub struct ConsoleIndicator;

impl ConsoleIndicator {
    fn pause_ms(ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl StatusIndicator for ConsoleIndicator {
    fn link_up(&mut self) {
        debug!("indicator: on");
    }

    fn off(&mut self) {
        debug!("indicator: off");
    }

    fn associating(&mut self) {
        debug!("indicator: associating");
        Self::pause_ms(4 * ASSOC_FLASH_MS);
    }

    fn served(&mut self) {
        debug!("indicator: served");
        Self::pause_ms(2 * (SERVED_LOW_MS + SERVED_HIGH_MS));
    }

    fn fault(&mut self) {
        debug!("indicator: fault");
        Self::pause_ms(FAULT_PAUSE_MS);
    }
}


// EOF
