use embassy_time::Duration;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::rtc_cntl::sleep::TimerWakeupSource;
use esp_hal::timer::timg::{TimerGroupInstance, Wdt};

use crate::sleep::PowerDown;

/// RTC light sleep with a timer wakeup. RAM and the LoRaWAN session survive,
/// unlike deep sleep.
pub struct LightSleep<'d, TG> {
    rtc: Rtc<'d>,
    wdt: Wdt<TG>,
}

impl<'d, TG: TimerGroupInstance> LightSleep<'d, TG> {
    pub fn new(rtc: Rtc<'d>, wdt: Wdt<TG>) -> Self {
        LightSleep { rtc, wdt }
    }

    pub fn feed_watchdog(&mut self) {
        self.wdt.feed();
    }
}

impl<TG: TimerGroupInstance> PowerDown for LightSleep<'_, TG> {
    fn power_down(&mut self, period: Duration) {
        self.wdt.feed();
        let wakeup = TimerWakeupSource::new(core::time::Duration::from_micros(period.as_micros()));
        self.rtc.sleep_light(&[&wakeup]);
        self.wdt.feed();
    }
}
