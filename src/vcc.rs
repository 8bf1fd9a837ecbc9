// Supply voltage estimation from raw ADC readings.

/// 1.1 V reference * 1023 full scale * 1000 mV/V.
pub const BANDGAP_SCALE: u32 = 1_125_300;

pub const BATTERY_LOW_MV: u16 = 3400;
pub const BATTERY_CRITICAL_MV: u16 = 3200;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ZeroReading,
    Adc,
    /// A divider with a zero full-scale count.
    BadDivider,
}

/// A reading source for the battery level, in millivolts.
pub trait BatterySensor {
    fn millivolts(&mut self) -> Result<u16, Error>;
}

/// Vcc from a 10-bit conversion of the internal 1.1 V bandgap measured
/// against Vcc as reference.
pub fn bandgap_millivolts(raw: u16) -> Result<u16, Error> {
    if raw == 0 {
        return Err(Error::ZeroReading);
    }
    Ok(saturate(BANDGAP_SCALE / raw as u32))
}

/// An ADC pin behind a resistor divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divider {
    /// Battery voltage over pin voltage, in thousandths.
    pub ratio_milli: u32,
    pub vref_mv: u32,
    pub full_scale: u32,
}

impl Divider {
    pub const fn new(ratio_milli: u32, vref_mv: u32, full_scale: u32) -> Self {
        Divider {
            ratio_milli,
            vref_mv,
            full_scale,
        }
    }
}

pub fn divider_millivolts(raw: u16, divider: &Divider) -> Result<u16, Error> {
    if divider.full_scale == 0 {
        return Err(Error::BadDivider);
    }
    let pin_mv = raw as u64 * divider.vref_mv as u64 / divider.full_scale as u64;
    let mv = pin_mv * divider.ratio_milli as u64 / 1000;
    Ok(saturate(mv.min(u32::MAX as u64) as u32))
}

/// How a raw conversion maps to supply millivolts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Bandgap,
    Divider(Divider),
}

impl Conversion {
    pub fn millivolts(&self, raw: u16) -> Result<u16, Error> {
        match self {
            Conversion::Bandgap => bandgap_millivolts(raw),
            Conversion::Divider(divider) => divider_millivolts(raw, divider),
        }
    }
}

fn saturate(mv: u32) -> u16 {
    mv.min(u16::MAX as u32) as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Ok,
    Low,
    Critical,
}

impl Level {
    pub fn classify(mv: u16) -> Self {
        if mv < BATTERY_CRITICAL_MV {
            Level::Critical
        } else if mv < BATTERY_LOW_MV {
            Level::Low
        } else {
            Level::Ok
        }
    }
}
