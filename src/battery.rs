use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcChannel, AdcConfig, AdcPin, Attenuation};
use esp_hal::gpio::AnalogPin;
use esp_hal::peripherals::ADC1;

use crate::vcc::{BatterySensor, Conversion, Error};

/// Conversions averaged per reading.
const SAMPLES: u32 = 8;

pub struct AdcBattery<'d, PIN> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<PIN, ADC1<'d>>,
    conversion: Conversion,
}

impl<'d, PIN> AdcBattery<'d, PIN>
where
    PIN: AdcChannel + AnalogPin,
{
    pub fn new(adc1: ADC1<'d>, pin: PIN, conversion: Conversion) -> Self {
        let mut config = AdcConfig::new();
        let pin = config.enable_pin(pin, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);
        AdcBattery {
            adc,
            pin,
            conversion,
        }
    }
}

impl<PIN> BatterySensor for AdcBattery<'_, PIN>
where
    PIN: AdcChannel + AnalogPin,
{
    fn millivolts(&mut self) -> Result<u16, Error> {
        let mut sum: u32 = 0;
        for _ in 0..SAMPLES {
            let raw: u16 = nb::block!(self.adc.read_oneshot(&mut self.pin)).map_err(|_| Error::Adc)?;
            sum += raw as u32;
        }
        self.conversion.millivolts((sum / SAMPLES) as u16)
    }
}
