#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

pub mod config;
pub mod credentials;
pub mod event;
pub mod mac;
pub mod node;
pub mod payload;
pub mod sleep;
pub mod vcc;

#[cfg(feature = "firmware")]
pub mod battery;
#[cfg(feature = "firmware")]
pub mod power;
#[cfg(feature = "firmware")]
pub mod radio;

/// Largest application payload the node ever queues.
pub const PAYLOAD_CAPACITY: usize = 20;

/// Largest downlink FRMPayload kept for the application.
pub const DOWNLINK_CAPACITY: usize = 242;

#[cfg(feature = "firmware")]
#[unsafe(no_mangle)]
pub fn custom_halt() -> ! {
    esp_hal::system::software_reset();
}

#[cfg(feature = "firmware")]
#[unsafe(no_mangle)]
pub extern "Rust" fn _esp_println_timestamp() -> u64 {
    esp_hal::time::Instant::now()
        .duration_since_epoch()
        .as_millis()
}
