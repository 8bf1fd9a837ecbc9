use embassy_time::{Delay, Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::Async;
use esp_hal::gpio::{Input, Output};
use esp_hal::rng::Rng;
use esp_hal::spi::master::Spi;
use heapless::Vec;
use log::{info, warn};
use lora_phy::LoRa;
use lora_phy::iv::GenericSx127xInterfaceVariant;
use lora_phy::lorawan_radio::LorawanRadio;
use lora_phy::sx127x::{self, Sx127x, Sx1276};
use lorawan_device::async_device::{Device, EmbassyTimer, JoinResponse, SendResponse};
use lorawan_device::default_crypto::DefaultFactory;
use lorawan_device::region::{self as lora_region, Subband};
use lorawan_device::{AppEui, AppKey, DevEui, JoinMode};
use rand_core::RngCore;

use crate::config::Region;
use crate::credentials::Credentials;
use crate::event::{Downlink, TxOutcome};
use crate::mac::{JoinOutcome, Network, SendOutcome, Uplink};

/// Max TX power in dBm the radio is allowed to use.
pub const MAX_TX_POWER: u8 = 14;

/// Pause after a join request went unanswered, before the next one.
const JOIN_RETRY_DELAY: Duration = Duration::from_secs(10);

pub type Sx1276Radio = LorawanRadio<
    Sx127x<
        ExclusiveDevice<Spi<'static, Async>, Output<'static>, Delay>,
        GenericSx127xInterfaceVariant<Output<'static>, Input<'static>>,
        Sx1276,
    >,
    Delay,
    MAX_TX_POWER,
>;

type LoraDevice = Device<Sx1276Radio, DefaultFactory, EmbassyTimer, HwRng>;

#[derive(Debug)]
pub enum Error {
    Interface,
    Radio,
    Mac,
}

/// Hardware RNG for the MAC's DevNonce and channel selection.
pub struct HwRng(Rng);

impl HwRng {
    pub fn new(rng: Rng) -> Self {
        HwRng(rng)
    }
}

impl RngCore for HwRng {
    fn next_u32(&mut self) -> u32 {
        self.0.random()
    }

    fn next_u64(&mut self) -> u64 {
        (self.0.random() as u64) << 32 | self.0.random() as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.0.random().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Brings up an SX1276 on the given SPI bus and wraps it for LoRaWAN use.
pub async fn init_sx1276(
    spi: Spi<'static, Async>,
    nss: Output<'static>,
    reset: Output<'static>,
    dio0: Input<'static>,
) -> Result<Sx1276Radio, Error> {
    let spi = ExclusiveDevice::new(spi, nss, Delay).map_err(|_| Error::Interface)?;
    let config = sx127x::Config {
        chip: Sx1276,
        tcxo_used: false,
        tx_boost: false,
        rx_boost: false,
    };
    let iv = GenericSx127xInterfaceVariant::new(reset, dio0, None, None)
        .map_err(|_| Error::Interface)?;
    // LoRaWAN uses the public network sync word.
    let lora = LoRa::new(Sx127x::new(spi, iv, config), true, Delay)
        .await
        .map_err(|e| {
            warn!("Radio init failed: {:?}", e);
            Error::Radio
        })?;
    info!("SX1276 ready");
    Ok(LorawanRadio::from(lora))
}

fn region_configuration(region: Region) -> lora_region::Configuration {
    let mut configuration = lora_region::Configuration::new(match region {
        Region::Eu868 => lora_region::Region::EU868,
        Region::Us915 => lora_region::Region::US915,
        Region::Au915 => lora_region::Region::AU915,
        Region::As923_1 => lora_region::Region::AS923_1,
        Region::In865 => lora_region::Region::IN865,
        Region::Eu433 => lora_region::Region::EU433,
    });
    // TTN uses the second sub-band in the fixed channel plans.
    if matches!(region, Region::Us915 | Region::Au915) {
        configuration.set_join_bias(Subband::_2);
    }
    configuration
}

/// The LoRaWAN stack, backed by `lorawan-device`.
pub struct LorawanNetwork {
    device: LoraDevice,
}

impl LorawanNetwork {
    pub fn new(radio: Sx1276Radio, region: Region, rng: HwRng) -> Self {
        let device = Device::new(region_configuration(region), radio, EmbassyTimer::new(), rng);
        LorawanNetwork { device }
    }

    fn take_downlink(&mut self) -> Option<Downlink> {
        let downlink = self.device.take_downlink()?;
        let data = match Vec::from_slice(&downlink.data) {
            Ok(data) => data,
            Err(_) => {
                warn!("Downlink of {} bytes truncated away", downlink.data.len());
                Vec::new()
            }
        };
        Some(Downlink {
            port: downlink.fport,
            data,
        })
    }
}

impl Network for LorawanNetwork {
    type Error = Error;

    async fn join(&mut self, credentials: &Credentials) -> Result<JoinOutcome, Error> {
        let mode = JoinMode::OTAA {
            deveui: DevEui::from(credentials.dev_eui.as_lsb()),
            appeui: AppEui::from(credentials.app_eui.as_lsb()),
            appkey: AppKey::from(*credentials.app_key.as_bytes()),
        };
        let response = self.device.join(&mode).await.map_err(|e| {
            warn!("Join error: {:?}", e);
            Error::Mac
        })?;
        match response {
            JoinResponse::JoinSuccess => Ok(JoinOutcome::Accepted),
            JoinResponse::NoJoinAccept => {
                Timer::after(JOIN_RETRY_DELAY).await;
                Ok(JoinOutcome::NoAccept)
            }
        }
    }

    async fn send(&mut self, uplink: &Uplink) -> Result<SendOutcome, Error> {
        let response = self
            .device
            .send(&uplink.data, uplink.port, uplink.confirmed)
            .await
            .map_err(|e| {
                warn!("Send error: {:?}", e);
                Error::Mac
            })?;
        let downlink = self.take_downlink();
        let outcome = match response {
            SendResponse::SessionExpired => return Ok(SendOutcome::SessionExpired),
            // A confirmed uplink is acked by whatever the network sends back.
            SendResponse::DownlinkReceived(_) => TxOutcome {
                ack: uplink.confirmed,
                downlink,
            },
            SendResponse::NoAck | SendResponse::RxComplete => TxOutcome {
                ack: false,
                downlink,
            },
        };
        Ok(SendOutcome::Done(outcome))
    }
}
