use heapless::Vec;

use crate::DOWNLINK_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    pub port: u8,
    pub data: Vec<u8, DOWNLINK_CAPACITY>,
}

/// What the network answered to an uplink, known once both RX windows
/// have passed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxOutcome {
    pub ack: bool,
    pub downlink: Option<Downlink>,
}

/// Lifecycle events reported by the MAC layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ScanTimeout,
    BeaconFound,
    BeaconMissed,
    BeaconTracked,
    Joining,
    Joined,
    Rfu1,
    JoinFailed,
    RejoinFailed,
    TxComplete(TxOutcome),
    LostTsync,
    Reset,
    RxComplete,
    LinkDead,
    LinkAlive,
    ScanFound,
    TxStart,
    TxCanceled,
    RxStart,
    JoinTxComplete,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ScanTimeout => "EV_SCAN_TIMEOUT",
            Event::BeaconFound => "EV_BEACON_FOUND",
            Event::BeaconMissed => "EV_BEACON_MISSED",
            Event::BeaconTracked => "EV_BEACON_TRACKED",
            Event::Joining => "EV_JOINING",
            Event::Joined => "EV_JOINED",
            Event::Rfu1 => "EV_RFU1",
            Event::JoinFailed => "EV_JOIN_FAILED",
            Event::RejoinFailed => "EV_REJOIN_FAILED",
            Event::TxComplete(_) => "EV_TXCOMPLETE (includes waiting for RX windows)",
            Event::LostTsync => "EV_LOST_TSYNC",
            Event::Reset => "EV_RESET",
            Event::RxComplete => "EV_RXCOMPLETE",
            Event::LinkDead => "EV_LINK_DEAD",
            Event::LinkAlive => "EV_LINK_ALIVE",
            Event::ScanFound => "EV_SCAN_FOUND",
            Event::TxStart => "EV_TXSTART",
            Event::TxCanceled => "EV_TXCANCELED",
            Event::RxStart => "EV_RXSTART",
            Event::JoinTxComplete => "EV_JOIN_TXCOMPLETE: no JoinAccept",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_ev_convention() {
        let events = [
            Event::ScanTimeout,
            Event::Joining,
            Event::Joined,
            Event::TxComplete(TxOutcome::default()),
            Event::LinkDead,
            Event::JoinTxComplete,
        ];
        for ev in events {
            assert!(ev.name().starts_with("EV_"), "{}", ev.name());
        }
        assert_eq!(Event::Joined.name(), "EV_JOINED");
    }
}
