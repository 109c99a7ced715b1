// sensor.rs

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{PhysicalReading, TempUnit};

pub const DEFAULT_SENSOR_ADDR: u8 = 0x45;

/// Numeric repeatability selectors, as carried in the configuration.
pub const LEVEL_HIGH: u8 = 1;
pub const LEVEL_MEDIUM: u8 = 2;
pub const LEVEL_LOW: u8 = 3;

// Worst-case high-repeatability conversion is 15 ms; 100 ms leaves margin.
const MEASUREMENT_DELAY_MS: u32 = 100;

const FRAME_LEN: usize = 6;

// 7-bit address space minus the reserved ranges.
const SCAN_FIRST_ADDR: u8 = 0x08;
const SCAN_LAST_ADDR: u8 = 0x77;

/// Measurement precision versus conversion time trade-off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeatability {
    High,
    Medium,
    Low,
}

impl Repeatability {
    /// Maps a numeric selector to a repeatability level. Anything outside
    /// the three defined levels is rejected before any bus traffic happens.
    pub fn from_level(level: u8) -> Result<Self, InvalidParameter> {
        match level {
            LEVEL_HIGH => Ok(Repeatability::High),
            LEVEL_MEDIUM => Ok(Repeatability::Medium),
            LEVEL_LOW => Ok(Repeatability::Low),
            other => Err(InvalidParameter(other)),
        }
    }
}

/// Whether the sensor holds the clock line low while busy, or we poll
/// after a fixed delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockStretch {
    Enabled,
    Disabled,
}

impl From<bool> for ClockStretch {
    fn from(enabled: bool) -> Self {
        if enabled {
            ClockStretch::Enabled
        } else {
            ClockStretch::Disabled
        }
    }
}

/// Repeatability selector outside the three defined levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidParameter(pub u8);

/// The fixed single-shot measurement command for the given mode pair.
pub fn measure_command(stretch: ClockStretch, repeat: Repeatability) -> [u8; 2] {
    use ClockStretch::*;
    use Repeatability::*;
    match (stretch, repeat) {
        (Enabled, High) => [0x2c, 0x06],
        (Enabled, Medium) => [0x2c, 0x0d],
        (Enabled, Low) => [0x2c, 0x10],
        (Disabled, High) => [0x24, 0x00],
        (Disabled, Medium) => [0x24, 0x0b],
        (Disabled, Low) => [0x24, 0x16],
    }
}

/// Unconverted 16-bit measurement codes from one sensor frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawReading {
    pub temperature: u16,
    pub humidity: u16,
}

impl RawReading {
    /// Bytes 2 and 5 are CRCs and intentionally not checked.
    pub fn from_frame(frame: &[u8; FRAME_LEN]) -> Self {
        Self {
            temperature: u16::from_be_bytes([frame[0], frame[1]]),
            humidity: u16::from_be_bytes([frame[3], frame[4]]),
        }
    }
}

pub fn decode_celsius(code: u16) -> f32 {
    -45.0 + 175.0 * (code as f32 / 65535.0)
}

pub fn decode_fahrenheit(code: u16) -> f32 {
    -49.0 + 315.0 * (code as f32 / 65535.0)
}

pub fn decode_humidity(code: u16) -> f32 {
    100.0 * (code as f32 / 65535.0)
}

// Bus errors propagate to the caller as-is. The driver never retries;
// recovery lives in the serve loop.
#[derive(Debug)]
pub enum SensorError<E> {
    Bus(E),
    InvalidParameter(InvalidParameter),
}

impl<E> From<InvalidParameter> for SensorError<E> {
    fn from(value: InvalidParameter) -> Self {
        SensorError::InvalidParameter(value)
    }
}

/// SHT31 temperature / relative-humidity sensor on a two-wire bus.
///
/// Owns the bus handle and the delay source; the address is fixed at
/// construction.
pub struct Sht31<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
}

impl<I2C, D> Sht31<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Self {
        Self { i2c, delay, addr }
    }

    /// One write + one settling delay + one read on the bus.
    pub fn read_raw(
        &mut self,
        repeat: Repeatability,
        stretch: ClockStretch,
    ) -> Result<RawReading, SensorError<I2C::Error>> {
        let cmd = measure_command(stretch, repeat);
        self.i2c.write(self.addr, &cmd).map_err(SensorError::Bus)?;
        self.delay.delay_ms(MEASUREMENT_DELAY_MS);

        let mut frame = [0u8; FRAME_LEN];
        self.i2c.read(self.addr, &mut frame).map_err(SensorError::Bus)?;
        Ok(RawReading::from_frame(&frame))
    }

    /// Reads both measurements in one bus transaction pair and applies the
    /// sensor's documented linear transfer function.
    pub fn read_physical(
        &mut self,
        repeat: Repeatability,
        stretch: ClockStretch,
        unit: TempUnit,
    ) -> Result<PhysicalReading, SensorError<I2C::Error>> {
        let raw = self.read_raw(repeat, stretch)?;
        let temperature = match unit {
            TempUnit::Celsius => decode_celsius(raw.temperature),
            TempUnit::Fahrenheit => decode_fahrenheit(raw.temperature),
        };
        Ok(PhysicalReading {
            temperature,
            humidity: decode_humidity(raw.humidity),
            unit,
        })
    }

    /// Probes the 7-bit address space and returns every device that
    /// acknowledges, excluding the configured sensor itself.
    pub fn scan_others(&mut self) -> Vec<u8> {
        let mut found = Vec::new();
        for addr in SCAN_FIRST_ADDR..=SCAN_LAST_ADDR {
            if addr == self.addr {
                continue;
            }
            if self.i2c.write(addr, &[]).is_ok() {
                found.push(addr);
            }
        }
        found
    }
}

#[cfg(test)]
pub(crate) mod testbus {
    //! Scripted bus and delay stubs shared by the driver and serve-loop tests.

    use embedded_hal::delay::DelayNs;
    use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation};

    /// Frame decoding to roughly 20 degC / 45 %RH, with junk CRC bytes.
    pub const FRAME_20C_45RH: [u8; 6] = [0x5f, 0x50, 0xab, 0x73, 0xa0, 0xcd];

    /// Frame decoding to -45 degC / ~50 %RH.
    pub const FRAME_TEMP_FLOOR: [u8; 6] = [0x00, 0x00, 0x17, 0x80, 0x00, 0x42];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScriptedBusError;

    impl i2c::Error for ScriptedBusError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[derive(Debug, Default)]
    pub struct ScriptedBus {
        pub frame: [u8; 6],
        pub fail_write: bool,
        pub fail_read: bool,
        pub written: Vec<Vec<u8>>,
        pub addresses: Vec<u8>,
    }

    impl ScriptedBus {
        pub fn returning(frame: [u8; 6]) -> Self {
            Self {
                frame,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_read: true,
                ..Self::default()
            }
        }
    }

    impl ErrorType for ScriptedBus {
        type Error = ScriptedBusError;
    }

    impl I2c for ScriptedBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.addresses.push(address);
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if self.fail_write {
                            return Err(ScriptedBusError);
                        }
                        self.written.push(bytes.to_vec());
                    }
                    Operation::Read(buf) => {
                        if self.fail_read {
                            return Err(ScriptedBusError);
                        }
                        for (dst, src) in buf.iter_mut().zip(self.frame.iter()) {
                            *dst = *src;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    pub struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }
}

#[cfg(test)]
mod tests {
    use super::testbus::*;
    use super::*;

    fn driver(bus: ScriptedBus) -> Sht31<ScriptedBus, NoDelay> {
        Sht31::new(bus, NoDelay, DEFAULT_SENSOR_ADDR)
    }

    #[test]
    fn command_table_is_fixed() {
        use ClockStretch::*;
        use Repeatability::*;
        assert_eq!(measure_command(Enabled, High), [0x2c, 0x06]);
        assert_eq!(measure_command(Enabled, Medium), [0x2c, 0x0d]);
        assert_eq!(measure_command(Enabled, Low), [0x2c, 0x10]);
        assert_eq!(measure_command(Disabled, High), [0x24, 0x00]);
        assert_eq!(measure_command(Disabled, Medium), [0x24, 0x0b]);
        assert_eq!(measure_command(Disabled, Low), [0x24, 0x16]);
    }

    #[test]
    fn level_selector_round_trips() {
        assert_eq!(Repeatability::from_level(LEVEL_HIGH), Ok(Repeatability::High));
        assert_eq!(
            Repeatability::from_level(LEVEL_MEDIUM),
            Ok(Repeatability::Medium)
        );
        assert_eq!(Repeatability::from_level(LEVEL_LOW), Ok(Repeatability::Low));
    }

    #[test]
    fn bad_level_selector_is_rejected() {
        for level in [0u8, 4, 42, 255] {
            assert_eq!(Repeatability::from_level(level), Err(InvalidParameter(level)));
        }
    }

    #[test]
    fn celsius_transfer_function_endpoints() {
        assert_eq!(decode_celsius(0), -45.0);
        assert_eq!(decode_celsius(65535), 130.0);
    }

    #[test]
    fn fahrenheit_transfer_function_endpoints() {
        assert_eq!(decode_fahrenheit(0), -49.0);
        assert_eq!(decode_fahrenheit(65535), 266.0);
    }

    #[test]
    fn humidity_transfer_function_endpoints() {
        assert_eq!(decode_humidity(0), 0.0);
        assert_eq!(decode_humidity(65535), 100.0);
        assert!((decode_humidity(0x8000) - 50.0).abs() < 0.01);
    }

    #[test]
    fn decoders_are_monotonic() {
        let mut prev_c = decode_celsius(0);
        let mut prev_f = decode_fahrenheit(0);
        let mut prev_h = decode_humidity(0);
        for code in (1..=65535u32).step_by(257).map(|c| c as u16) {
            let c = decode_celsius(code);
            let f = decode_fahrenheit(code);
            let h = decode_humidity(code);
            assert!(c > prev_c, "celsius not increasing at code {code}");
            assert!(f > prev_f, "fahrenheit not increasing at code {code}");
            assert!(h > prev_h, "humidity not increasing at code {code}");
            prev_c = c;
            prev_f = f;
            prev_h = h;
        }
    }

    #[test]
    fn frame_decoding_ignores_crc_bytes() {
        let a = RawReading::from_frame(&[0x61, 0x2f, 0x00, 0x73, 0x86, 0x00]);
        let b = RawReading::from_frame(&[0x61, 0x2f, 0xff, 0x73, 0x86, 0xff]);
        assert_eq!(a, b);
        assert_eq!(a.temperature, 0x612f);
        assert_eq!(a.humidity, 0x7386);
    }

    #[test]
    fn read_raw_sends_command_then_reads_six_bytes() {
        let mut drv = driver(ScriptedBus::returning(FRAME_20C_45RH));
        let raw = drv
            .read_raw(Repeatability::High, ClockStretch::Enabled)
            .unwrap();

        assert_eq!(raw.temperature, 0x5f50);
        assert_eq!(raw.humidity, 0x73a0);
        assert_eq!(drv.i2c.written, vec![vec![0x2c, 0x06]]);
        assert_eq!(drv.i2c.addresses, vec![DEFAULT_SENSOR_ADDR; 2]);
    }

    #[test]
    fn bus_error_propagates_unretried() {
        let mut drv = driver(ScriptedBus::failing());
        let res = drv.read_raw(Repeatability::High, ClockStretch::Enabled);
        assert!(matches!(res, Err(SensorError::Bus(_))));
        // one write, one failed read, nothing more
        assert_eq!(drv.i2c.addresses.len(), 2);
    }

    #[test]
    fn read_physical_converts_both_fields() {
        let mut drv = driver(ScriptedBus::returning(FRAME_20C_45RH));
        let reading = drv
            .read_physical(Repeatability::High, ClockStretch::Enabled, TempUnit::Celsius)
            .unwrap();

        assert!((reading.temperature - 20.16).abs() < 0.05);
        assert!((reading.humidity - 45.17).abs() < 0.05);
        assert_eq!(reading.unit, TempUnit::Celsius);
    }

    #[test]
    fn read_physical_at_code_floor() {
        let mut drv = driver(ScriptedBus::returning(FRAME_TEMP_FLOOR));
        let reading = drv
            .read_physical(Repeatability::High, ClockStretch::Enabled, TempUnit::Celsius)
            .unwrap();

        assert_eq!(reading.temperature, -45.0);
        assert!((reading.humidity - 50.0).abs() < 0.01);
    }
}

// EOF
