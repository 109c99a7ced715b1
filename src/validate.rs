// validate.rs

use crate::ServedReading;

// Plausibility bounds for a reading we are willing to serve. Anything
// outside is a bus glitch or a failing sensor, not weather.
const TEMP_FLOOR: i32 = -5; // exclusive
const TEMP_CEIL: i32 = 70; // exclusive
const HUMI_FLOOR: i32 = 0; // inclusive
const HUMI_CEIL: i32 = 99; // inclusive

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    OutOfRange { temperature: f32, humidity: f32 },
}

/// Truncates both values toward zero and checks them against the bounds.
/// A rejected reading must be discarded, never served or cached.
pub fn validate(temperature: f32, humidity: f32) -> Result<ServedReading, ValidationError> {
    if !temperature.is_finite() || !humidity.is_finite() {
        return Err(ValidationError::OutOfRange {
            temperature,
            humidity,
        });
    }

    let temp = temperature.trunc() as i32;
    let humi = humidity.trunc() as i32;
    if temp > TEMP_FLOOR && temp < TEMP_CEIL && humi >= HUMI_FLOOR && humi <= HUMI_CEIL {
        Ok(ServedReading {
            temperature: temp,
            humidity: humi,
        })
    } else {
        Err(ValidationError::OutOfRange {
            temperature,
            humidity,
        })
    }
}


// EOF
