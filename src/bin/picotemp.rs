// bin/picotemp.rs

use std::net::{Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

use anyhow::bail;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use log::*;
use tracing_subscriber::EnvFilter;

use picotemp::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("picotemp {FW_VERSION} starting up.");

    let config = MyConfig::default();
    info!("My config:\n{config:#?}");

    let repeatability = match Repeatability::from_level(config.repeatability) {
        Ok(r) => r,
        Err(e) => bail!("Bad repeatability level in config: {e:?}"),
    };
    let clock_stretch = ClockStretch::from(config.clock_stretch);

    let mut sensor = Sht31::new(SimBus::new(), HostDelay, config.sensor_addr);

    let others = sensor.scan_others();
    if others.is_empty() {
        info!("No other devices found on the bus.");
    } else {
        info!("Other devices found on the bus:");
        for addr in others {
            info!("Address: 0x{addr:02x}");
        }
    }

    let mut indicator = ConsoleIndicator;
    let mut link = LoopbackLink::default();

    // returns immediately when the link is already up
    indicator.off();
    let ip = ensure_connected(&mut link, &config.wifi_ssid, &config.wifi_pass, &mut indicator);
    indicator.link_up();

    let queue = HttpQueue::bind(SocketAddr::from((ip, config.port)))?;
    ServeLoop::new(sensor, queue, indicator, repeatability, clock_stretch, config.unit).run()
}

/// Blocking delay for host builds. On a device this is the HAL's delay.
struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Debug)]
struct SimNack;

impl i2c::Error for SimNack {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// Stand-in bus for host builds: one SHT31 at the configured address
/// producing a slowly wandering indoor reading, NACK everywhere else.
struct SimBus {
    tick: u16,
}

impl SimBus {
    // ~21 degC and ~48 %RH as raw codes
    const TEMP_CODE: u16 = 24720;
    const HUMI_CODE: u16 = 31457;

    fn new() -> Self {
        Self { tick: 0 }
    }

    fn frame(&self) -> [u8; 6] {
        let wobble = self.tick % 97;
        let t = (Self::TEMP_CODE + wobble * 3).to_be_bytes();
        let h = (Self::HUMI_CODE + wobble * 5).to_be_bytes();
        [t[0], t[1], 0x00, h[0], h[1], 0x00]
    }
}

impl ErrorType for SimBus {
    type Error = SimNack;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != DEFAULT_SENSOR_ADDR {
            return Err(SimNack);
        }
        for op in operations {
            match op {
                Operation::Write(_) => {}
                Operation::Read(buf) => {
                    self.tick = self.tick.wrapping_add(1);
                    let frame = self.frame();
                    for (dst, src) in buf.iter_mut().zip(frame.iter()) {
                        *dst = *src;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Loopback link for host builds: "associates" on the first attempt and
/// hands out the localhost address.
#[derive(Default)]
struct LoopbackLink {
    connected: bool,
}

impl NetLink for LoopbackLink {
    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn start_connect(&mut self, ssid: &str, _pass: &str) {
        debug!("Loopback link, pretending to associate with {ssid}");
        self.connected = true;
    }

    fn address(&self) -> Ipv4Addr {
        Ipv4Addr::LOCALHOST
    }
}

// EOF
