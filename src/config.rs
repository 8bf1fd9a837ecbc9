use core::str::FromStr;

use embassy_time::Duration;

use crate::credentials::{self, AppKey, Credentials, Eui};

pub const DEV_EUI_KEY: &str = "LORAWAN_DEV_EUI";
pub const APP_EUI_KEY: &str = "LORAWAN_APP_EUI";
pub const APP_KEY_KEY: &str = "LORAWAN_APP_KEY";
pub const REGION_KEY: &str = "LORAWAN_REGION";
pub const TX_INTERVAL_KEY: &str = "TX_INTERVAL_SECS";
pub const FPORT_KEY: &str = "UPLINK_FPORT";
pub const CONFIRMED_KEY: &str = "UPLINK_CONFIRMED";
pub const LINK_CHECK_KEY: &str = "LINK_CHECK";

// Schedule TX every this many seconds (might become longer due to duty
// cycle limitations).
pub const DEFAULT_TX_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_FPORT: u8 = 1;
/// Longest accepted TX interval, keeps tick arithmetic in range.
pub const MAX_TX_INTERVAL_SECS: u64 = u32::MAX as u64;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Credential(&'static str, credentials::Error),
    InvalidValue(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Eu868,
    Us915,
    Au915,
    As923_1,
    In865,
    Eu433,
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let region = match s.trim() {
            "EU868" | "eu868" => Region::Eu868,
            "US915" | "us915" => Region::Us915,
            "AU915" | "au915" => Region::Au915,
            "AS923_1" | "as923_1" | "AS923" | "as923" => Region::As923_1,
            "IN865" | "in865" => Region::In865,
            "EU433" | "eu433" => Region::Eu433,
            _ => return Err(Error::InvalidValue(REGION_KEY)),
        };
        Ok(region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credentials: Credentials,
    pub region: Region,
    pub tx_interval: Duration,
    pub fport: u8,
    pub confirmed: bool,
    /// Keep link liveness tracking enabled once joined. TTN does not answer
    /// link checks, so this is off unless asked for.
    pub link_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            credentials: Credentials::default(),
            region: Region::default(),
            tx_interval: Duration::from_secs(DEFAULT_TX_INTERVAL_SECS),
            fport: DEFAULT_FPORT,
            confirmed: false,
            link_check: false,
        }
    }
}

impl Config {
    /// Configuration baked in at build time.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| match key {
            DEV_EUI_KEY => option_env!("LORAWAN_DEV_EUI"),
            APP_EUI_KEY => option_env!("LORAWAN_APP_EUI"),
            APP_KEY_KEY => option_env!("LORAWAN_APP_KEY"),
            REGION_KEY => option_env!("LORAWAN_REGION"),
            TX_INTERVAL_KEY => option_env!("TX_INTERVAL_SECS"),
            FPORT_KEY => option_env!("UPLINK_FPORT"),
            CONFIRMED_KEY => option_env!("UPLINK_CONFIRMED"),
            LINK_CHECK_KEY => option_env!("LINK_CHECK"),
            _ => None,
        })
    }

    pub fn from_lookup<'a, F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut config = Config::default();

        if let Some(v) = lookup(DEV_EUI_KEY) {
            config.credentials.dev_eui =
                Eui::from_msb_hex(v).map_err(|e| Error::Credential(DEV_EUI_KEY, e))?;
        }
        if let Some(v) = lookup(APP_EUI_KEY) {
            config.credentials.app_eui =
                Eui::from_msb_hex(v).map_err(|e| Error::Credential(APP_EUI_KEY, e))?;
        }
        if let Some(v) = lookup(APP_KEY_KEY) {
            config.credentials.app_key =
                AppKey::from_hex(v).map_err(|e| Error::Credential(APP_KEY_KEY, e))?;
        }
        if let Some(v) = lookup(REGION_KEY) {
            config.region = v.parse()?;
        }
        if let Some(v) = lookup(TX_INTERVAL_KEY) {
            let secs: u64 = v
                .trim()
                .parse()
                .map_err(|_| Error::InvalidValue(TX_INTERVAL_KEY))?;
            if secs == 0 || secs > MAX_TX_INTERVAL_SECS {
                return Err(Error::InvalidValue(TX_INTERVAL_KEY));
            }
            config.tx_interval = Duration::from_secs(secs);
        }
        if let Some(v) = lookup(FPORT_KEY) {
            let port: u8 = v.trim().parse().map_err(|_| Error::InvalidValue(FPORT_KEY))?;
            if !(1..=223).contains(&port) {
                return Err(Error::InvalidValue(FPORT_KEY));
            }
            config.fport = port;
        }
        if let Some(v) = lookup(CONFIRMED_KEY) {
            config.confirmed = parse_flag(v).ok_or(Error::InvalidValue(CONFIRMED_KEY))?;
        }
        if let Some(v) = lookup(LINK_CHECK_KEY) {
            config.link_check = parse_flag(v).ok_or(Error::InvalidValue(LINK_CHECK_KEY))?;
        }

        Ok(config)
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
