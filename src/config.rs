// config.rs

use serde::{Deserialize, Serialize};

use crate::{sensor, TempUnit};

const DEFAULT_API_PORT: u16 = 80;
const DEFAULT_REPEATABILITY: u8 = sensor::LEVEL_HIGH;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MyConfig {
    pub port: u16,

    pub wifi_ssid: String,
    pub wifi_pass: String,

    pub sensor_addr: u8,
    pub repeatability: u8,
    pub clock_stretch: bool,
    pub unit: TempUnit,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            port: option_env!("API_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_API_PORT),

            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("password").into(),

            sensor_addr: sensor::DEFAULT_SENSOR_ADDR,
            repeatability: DEFAULT_REPEATABILITY,
            clock_stretch: true,
            unit: TempUnit::Celsius,
        }
    }
}

// EOF
