#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Timer};
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::{MwdtStage, TimerGroup};

use log::info;

use esp_lorawan_vcc::battery::AdcBattery;
use esp_lorawan_vcc::config::Config;
use esp_lorawan_vcc::mac::MacRunner;
use esp_lorawan_vcc::node::{Action, Node};
use esp_lorawan_vcc::power::LightSleep;
use esp_lorawan_vcc::radio::{HwRng, LorawanNetwork, init_sx1276};
use esp_lorawan_vcc::vcc::{Conversion, Divider};

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

const WATCHDOG_TIMEOUT_MS: u64 = 30_000;

// Longest the loop waits without feeding the watchdog while idle.
const IDLE_WAIT: Duration = Duration::from_secs(1);

// Heltec WiFi LoRa 32 V2: 220k/100k divider in front of GPIO37.
const BATTERY_DIVIDER: Divider = Divider::new(3200, 3300, 4095);

fn due(action: Action) -> Instant {
    match action {
        Action::ScheduleSend(after) => Instant::now() + after,
    }
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Arm watchdog timer
    let mut wdt = timg0.wdt;
    wdt.set_timeout(
        MwdtStage::Stage0,
        esp_hal::time::Duration::from_millis(WATCHDOG_TIMEOUT_MS),
    );
    wdt.enable();
    wdt.feed();

    info!("Starting");
    let app_config = Config::from_env().expect("Invalid build-time configuration");
    info!(
        "DevEUI {} AppEUI {} region {:?}, every {}s",
        app_config.credentials.dev_eui,
        app_config.credentials.app_eui,
        app_config.region,
        app_config.tx_interval.as_secs()
    );

    // SX1276 pin mapping
    let spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default().with_frequency(Rate::from_mhz(1)),
    )
    .expect("Failed to configure SPI")
    .with_sck(peripherals.GPIO5)
    .with_mosi(peripherals.GPIO27)
    .with_miso(peripherals.GPIO19)
    .into_async();
    let nss = Output::new(peripherals.GPIO18, Level::High, OutputConfig::default());
    let reset = Output::new(peripherals.GPIO14, Level::High, OutputConfig::default());
    let dio0 = Input::new(
        peripherals.GPIO26,
        InputConfig::default().with_pull(Pull::None),
    );

    let radio = init_sx1276(spi, nss, reset, dio0)
        .await
        .expect("Failed to init radio");
    let network = LorawanNetwork::new(radio, app_config.region, HwRng::new(Rng::new()));
    let mut mac = MacRunner::new(network, app_config.credentials);
    wdt.feed();

    let battery = AdcBattery::new(
        peripherals.ADC1,
        peripherals.GPIO37,
        Conversion::Divider(BATTERY_DIVIDER),
    );
    let power = LightSleep::new(Rtc::new(peripherals.LPWR), wdt);
    let mut node = Node::new(app_config, battery, power);

    // Reset the MAC state. Session and pending data transfers will be discarded.
    mac.reset();

    // Start job (sending automatically starts OTAA too)
    let mut next_send = node.do_send(&mut mac).map(due);

    loop {
        node.power_mut().feed_watchdog();

        if next_send.is_some_and(|at| Instant::now() >= at) {
            next_send = node.do_send(&mut mac).map(due);
        }

        match mac.run_once().await {
            Some(event) => {
                if let Some(action) = node.on_event(&event, &mut mac) {
                    next_send = Some(due(action));
                }
            }
            None => {
                let deadline = Instant::now() + IDLE_WAIT;
                Timer::at(next_send.map_or(deadline, |at| at.min(deadline))).await;
            }
        }
    }
}
