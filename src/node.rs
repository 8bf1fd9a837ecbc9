use embassy_time::Duration;
use log::{debug, info, warn};

use crate::config::Config;
use crate::event::Event;
use crate::mac::Mac;
use crate::payload::encode_battery;
use crate::sleep::{PowerDown, SleepPlan};
use crate::vcc::{BatterySensor, Level};

/// What the caller has to do after a node callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run [`Node::do_send`] once this much time has passed.
    ScheduleSend(Duration),
}

/// The application: a send job and the MAC event handler.
pub struct Node<B, P> {
    config: Config,
    battery: B,
    power: P,
}

impl<B: BatterySensor, P: PowerDown> Node<B, P> {
    pub fn new(config: Config, battery: B, power: P) -> Self {
        Node {
            config,
            battery,
            power,
        }
    }

    pub fn power_mut(&mut self) -> &mut P {
        &mut self.power
    }

    /// Reads the battery and queues it as the next uplink. The next run is
    /// scheduled from the TX complete event, unless the frame never made it
    /// into the queue.
    pub fn do_send<M: Mac>(&mut self, mac: &mut M) -> Option<Action> {
        // Check if there is not a current TX/RX job running
        if mac.tx_rx_pending() {
            info!("OP_TXRXPEND, not sending");
            return None;
        }

        let millivolts = match self.battery.millivolts() {
            Ok(mv) => mv,
            Err(e) => {
                warn!("Failed to read battery level: {:?}", e);
                return Some(Action::ScheduleSend(self.config.tx_interval));
            }
        };
        match Level::classify(millivolts) {
            Level::Ok => debug!("Battery: {}mV", millivolts),
            Level::Low => warn!("Battery low: {}mV", millivolts),
            Level::Critical => warn!("Battery critical: {}mV", millivolts),
        }

        let payload = encode_battery(millivolts);
        match mac.set_tx_data(self.config.fport, &payload, self.config.confirmed) {
            Ok(()) => {
                info!("Packet queued");
                None
            }
            Err(e) => {
                warn!("Failed to queue packet: {:?}", e);
                Some(Action::ScheduleSend(self.config.tx_interval))
            }
        }
    }

    pub fn on_event<M: Mac>(&mut self, event: &Event, mac: &mut M) -> Option<Action> {
        info!("{}", event.name());
        match event {
            Event::Joined => {
                // Link check validation is enabled during join; TTN does not
                // support it.
                mac.set_link_check_mode(self.config.link_check);
                None
            }
            Event::TxComplete(outcome) => {
                if outcome.ack {
                    info!("Received ack");
                }
                if let Some(downlink) = &outcome.downlink
                    && !downlink.data.is_empty()
                {
                    info!("Received {} bytes of payload", downlink.data.len());
                    debug!(
                        "Downlink on port {}: {:02x?}",
                        downlink.port,
                        downlink.data.as_slice()
                    );
                }

                let plan = SleepPlan::for_interval(self.config.tx_interval);
                info!(
                    "Sleeping {} of 8 seconds. Rest: {}",
                    plan.chunks,
                    plan.rest.as_secs()
                );
                plan.execute(&mut self.power);

                Some(Action::ScheduleSend(plan.rest))
            }
            // The frame is gone, keep the send chain alive.
            Event::TxCanceled => Some(Action::ScheduleSend(self.config.tx_interval)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::Error;
    use crate::vcc;

    struct FixedBattery(Result<u16, ()>);

    impl BatterySensor for FixedBattery {
        fn millivolts(&mut self) -> Result<u16, vcc::Error> {
            self.0.map_err(|_| vcc::Error::Adc)
        }
    }

    #[derive(Default)]
    struct Naps(u32);

    impl PowerDown for Naps {
        fn power_down(&mut self, _period: Duration) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct Recorder {
        pending: bool,
        full: bool,
        queued: Option<(u8, std::vec::Vec<u8>, bool)>,
        link_check: Option<bool>,
    }

    impl Mac for Recorder {
        fn tx_rx_pending(&self) -> bool {
            self.pending
        }

        fn set_tx_data(&mut self, port: u8, data: &[u8], confirmed: bool) -> Result<(), Error> {
            if self.pending {
                return Err(Error::TxRxPending);
            }
            if self.full {
                return Err(Error::PayloadTooLarge(data.len()));
            }
            self.pending = true;
            self.queued = Some((port, data.to_vec(), confirmed));
            Ok(())
        }

        fn set_link_check_mode(&mut self, enabled: bool) {
            self.link_check = Some(enabled);
        }
    }

    fn node(mv: Result<u16, ()>) -> Node<FixedBattery, Naps> {
        Node::new(Config::default(), FixedBattery(mv), Naps::default())
    }

    #[test]
    fn send_queues_battery_on_port_one() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder::default();
        assert_eq!(node.do_send(&mut mac), None);
        assert_eq!(mac.queued, Some((1, vec![0x0C, 0xE4], false)));
    }

    #[test]
    fn send_skips_while_pending() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder {
            pending: true,
            ..Default::default()
        };
        assert_eq!(node.do_send(&mut mac), None);
        assert_eq!(mac.queued, None);
    }

    #[test]
    fn battery_failure_reschedules() {
        let mut node = node(Err(()));
        let mut mac = Recorder::default();
        assert_eq!(
            node.do_send(&mut mac),
            Some(Action::ScheduleSend(Duration::from_secs(20)))
        );
        assert!(!mac.pending);
    }

    #[test]
    fn refused_frame_reschedules() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder {
            full: true,
            ..Default::default()
        };
        assert_eq!(
            node.do_send(&mut mac),
            Some(Action::ScheduleSend(Duration::from_secs(20)))
        );
        assert_eq!(mac.queued, None);
    }

    #[test]
    fn tx_canceled_schedules_full_interval() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder::default();
        assert_eq!(
            node.on_event(&Event::TxCanceled, &mut mac),
            Some(Action::ScheduleSend(Duration::from_secs(20)))
        );
        assert_eq!(node.power.0, 0);
    }

    #[test]
    fn joined_applies_link_check_setting() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder::default();
        assert_eq!(node.on_event(&Event::Joined, &mut mac), None);
        assert_eq!(mac.link_check, Some(false));
    }

    #[test]
    fn tx_complete_sleeps_and_schedules_rest() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder::default();
        let action = node.on_event(&Event::TxComplete(Default::default()), &mut mac);
        assert_eq!(action, Some(Action::ScheduleSend(Duration::from_secs(4))));
        assert_eq!(node.power.0, 2);
    }

    #[test]
    fn informational_events_do_nothing() {
        let mut node = node(Ok(3300));
        let mut mac = Recorder::default();
        for ev in [
            Event::Joining,
            Event::JoinFailed,
            Event::LinkDead,
            Event::BeaconMissed,
            Event::RxComplete,
        ] {
            assert_eq!(node.on_event(&ev, &mut mac), None);
        }
        assert_eq!(node.power.0, 0);
        assert_eq!(mac.link_check, None);
    }
}
