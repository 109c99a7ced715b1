// server.rs

use std::io;

use askama::Template;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::*;

use crate::{
    validate, ClientConn, ClientQueue, ClockStretch, PhysicalReading, Repeatability,
    SensorError, ServedReading, Sht31, StatusIndicator, TempUnit, REQUEST_BUF_SIZE,
};

/// The fixed document served to every client; refreshes itself every
/// minute on the client side.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub temperature: i32,
    pub humidity: i32,
}

#[derive(Debug)]
pub enum ServeError<E> {
    Sensor(SensorError<E>),
    Network(io::Error),
    Render(askama::Error),
}

impl<E> From<SensorError<E>> for ServeError<E> {
    fn from(value: SensorError<E>) -> Self {
        ServeError::Sensor(value)
    }
}

impl<E> From<io::Error> for ServeError<E> {
    fn from(value: io::Error) -> Self {
        ServeError::Network(value)
    }
}

impl<E> From<askama::Error> for ServeError<E> {
    fn from(value: askama::Error) -> Self {
        ServeError::Render(value)
    }
}

/// Position of the serve loop between two transitions.
///
/// A validation miss goes straight back to `Idle`; everything else that
/// fails passes through `ErrorRecovery` so the fault gets signaled before
/// the loop restarts.
#[derive(Debug)]
pub enum ServeState<C> {
    Idle,
    Reading,
    Validating(PhysicalReading),
    AwaitingClient(ServedReading),
    Responding(ServedReading, C),
    ErrorRecovery,
}

/// Read, validate, serve one client, recover, repeat. Owns the sensor
/// driver, the accept queue and the indicator for the life of the process.
pub struct ServeLoop<I2C, D, Q, B> {
    sensor: Sht31<I2C, D>,
    queue: Q,
    indicator: B,
    repeatability: Repeatability,
    clock_stretch: ClockStretch,
    unit: TempUnit,
}

impl<I2C, D, Q, B> ServeLoop<I2C, D, Q, B>
where
    I2C: I2c,
    D: DelayNs,
    Q: ClientQueue,
    B: StatusIndicator,
{
    pub fn new(
        sensor: Sht31<I2C, D>,
        queue: Q,
        indicator: B,
        repeatability: Repeatability,
        clock_stretch: ClockStretch,
        unit: TempUnit,
    ) -> Self {
        Self {
            sensor,
            queue,
            indicator,
            repeatability,
            clock_stretch,
            unit,
        }
    }

    /// Runs the loop forever. Faults are signaled and recovered here;
    /// nothing propagates past this point.
    pub fn run(mut self) -> ! {
        info!("Entering serve loop...");
        let mut state = ServeState::Idle;
        loop {
            state = self.step(state);
        }
    }

    /// Advances the state machine by one transition.
    pub fn step(&mut self, state: ServeState<Q::Conn>) -> ServeState<Q::Conn> {
        match state {
            ServeState::Idle => ServeState::Reading,

            ServeState::Reading => {
                match self
                    .sensor
                    .read_physical(self.repeatability, self.clock_stretch, self.unit)
                {
                    Ok(reading) => ServeState::Validating(reading),
                    Err(e) => {
                        error!("Sensor read failed: {e:?}");
                        ServeState::ErrorRecovery
                    }
                }
            }

            ServeState::Validating(reading) => {
                match validate(reading.temperature, reading.humidity) {
                    Ok(served) => {
                        info!(
                            "Sensor data: {}",
                            serde_json::to_string(&served).unwrap_or_else(|_| "{}".into())
                        );
                        ServeState::AwaitingClient(served)
                    }
                    // a skip, not a fault: drop the reading and poll again
                    Err(e) => {
                        warn!("Invalid data from sensor: {e:?}");
                        ServeState::Idle
                    }
                }
            }

            ServeState::AwaitingClient(served) => match self.queue.accept_one() {
                Ok(conn) => ServeState::Responding(served, conn),
                Err(e) => {
                    error!("Accept failed: {e:?}");
                    ServeState::ErrorRecovery
                }
            },

            ServeState::Responding(served, mut conn) => match self.respond(served, &mut conn) {
                Ok(()) => {
                    self.indicator.served();
                    ServeState::Idle
                }
                Err(e) => {
                    error!("Error sending data: {e:?}");
                    ServeState::ErrorRecovery
                }
            },

            ServeState::ErrorRecovery => {
                self.indicator.fault();
                ServeState::Idle
            }
        }
    }

    fn respond(
        &mut self,
        served: ServedReading,
        conn: &mut Q::Conn,
    ) -> Result<(), ServeError<I2C::Error>> {
        let mut buf = [0u8; REQUEST_BUF_SIZE];
        let _ = conn.read_request(&mut buf)?;

        let page = IndexTemplate {
            temperature: served.temperature,
            humidity: served.humidity,
        };
        let body = page.render()?;
        conn.send_response(body.as_bytes())?;
        Ok(())
    }
}


// EOF
