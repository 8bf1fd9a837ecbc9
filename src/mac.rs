use core::fmt::Debug;

use heapless::Vec;
use log::{debug, warn};

use crate::PAYLOAD_CAPACITY;
use crate::credentials::Credentials;
use crate::event::{Event, TxOutcome};

/// Consecutive missed join accepts before the join is reported as failed.
pub const MAX_JOIN_ATTEMPTS: u8 = 8;

/// ADR_ACK_LIMIT + ADR_ACK_DELAY uplinks without any downlink.
pub const LINK_DEAD_LIMIT: u32 = 64 + 32;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    TxRxPending,
    PayloadTooLarge(usize),
    InvalidPort(u8),
}

/// The calls the application makes into the MAC.
pub trait Mac {
    /// A frame is queued or in flight.
    fn tx_rx_pending(&self) -> bool;

    /// Queue an uplink for the next possible transmission time.
    fn set_tx_data(&mut self, port: u8, data: &[u8], confirmed: bool) -> Result<(), Error>;

    fn set_link_check_mode(&mut self, enabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    pub port: u8,
    pub data: Vec<u8, PAYLOAD_CAPACITY>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Accepted,
    NoAccept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Done(TxOutcome),
    SessionExpired,
}

/// The LoRaWAN stack doing the actual work: join procedure, framing,
/// encryption, RX windows and duty cycle.
pub trait Network {
    type Error: Debug;

    async fn join(&mut self, credentials: &Credentials) -> Result<JoinOutcome, Self::Error>;

    async fn send(&mut self, uplink: &Uplink) -> Result<SendOutcome, Self::Error>;
}

/// Single slot for the next uplink.
#[derive(Debug, Default)]
pub struct TxQueue {
    pending: Option<Uplink>,
}

impl TxQueue {
    pub const fn new() -> Self {
        TxQueue { pending: None }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn push(&mut self, uplink: Uplink) -> Result<(), Error> {
        if self.pending.is_some() {
            return Err(Error::TxRxPending);
        }
        self.pending = Some(uplink);
        Ok(())
    }

    pub fn peek(&self) -> Option<&Uplink> {
        self.pending.as_ref()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Tracks whether the network still answers.
#[derive(Debug)]
pub struct LinkMonitor {
    enabled: bool,
    silent_uplinks: u32,
    dead: bool,
}

impl LinkMonitor {
    pub const fn new(enabled: bool) -> Self {
        LinkMonitor {
            enabled,
            silent_uplinks: 0,
            dead: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        *self = LinkMonitor::new(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn on_uplink(&mut self, heard_back: bool) -> Option<Event> {
        if !self.enabled {
            return None;
        }
        if heard_back {
            self.silent_uplinks = 0;
            if self.dead {
                self.dead = false;
                return Some(Event::LinkAlive);
            }
            return None;
        }
        self.silent_uplinks = self.silent_uplinks.saturating_add(1);
        if !self.dead && self.silent_uplinks >= LINK_DEAD_LIMIT {
            self.dead = true;
            return Some(Event::LinkDead);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinState {
    Idle,
    Joining { attempts: u8 },
    Joined,
}

/// Drives a [`Network`] one step at a time and reports what happened as
/// [`Event`]s. Queueing an uplink while not joined starts OTAA.
pub struct MacRunner<N> {
    network: N,
    credentials: Credentials,
    state: JoinState,
    queue: TxQueue,
    link: LinkMonitor,
    tx_started: bool,
    deferred: Option<Event>,
}

impl<N: Network> MacRunner<N> {
    pub fn new(network: N, credentials: Credentials) -> Self {
        MacRunner {
            network,
            credentials,
            state: JoinState::Idle,
            queue: TxQueue::new(),
            // Link checks are on during join; the application decides once joined.
            link: LinkMonitor::new(true),
            tx_started: false,
            deferred: None,
        }
    }

    /// Reset the MAC state. Session and pending data transfers are discarded.
    pub fn reset(&mut self) {
        self.state = JoinState::Idle;
        self.queue.clear();
        self.link = LinkMonitor::new(true);
        self.tx_started = false;
        self.deferred = None;
    }

    pub fn is_joined(&self) -> bool {
        self.state == JoinState::Joined
    }

    pub fn link_check_enabled(&self) -> bool {
        self.link.is_enabled()
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Runs one step. Returns `None` when there is nothing to do.
    pub async fn run_once(&mut self) -> Option<Event> {
        if let Some(event) = self.deferred.take() {
            return Some(event);
        }
        if !self.queue.is_pending() {
            return None;
        }

        match self.state {
            JoinState::Idle => {
                self.state = JoinState::Joining { attempts: 0 };
                Some(Event::Joining)
            }
            _ if !self.tx_started => {
                self.tx_started = true;
                Some(Event::TxStart)
            }
            JoinState::Joining { attempts } => {
                self.tx_started = false;
                Some(self.join(attempts).await)
            }
            JoinState::Joined => {
                self.tx_started = false;
                self.transmit().await
            }
        }
    }

    async fn join(&mut self, attempts: u8) -> Event {
        match self.network.join(&self.credentials).await {
            Ok(JoinOutcome::Accepted) => {
                self.state = JoinState::Joined;
                Event::Joined
            }
            Ok(JoinOutcome::NoAccept) => self.missed_join(attempts),
            Err(e) => {
                warn!("Join attempt failed: {:?}", e);
                self.missed_join(attempts)
            }
        }
    }

    fn missed_join(&mut self, attempts: u8) -> Event {
        let attempts = attempts.saturating_add(1);
        if attempts >= MAX_JOIN_ATTEMPTS {
            self.state = JoinState::Joining { attempts: 0 };
            Event::JoinFailed
        } else {
            self.state = JoinState::Joining { attempts };
            Event::JoinTxComplete
        }
    }

    async fn transmit(&mut self) -> Option<Event> {
        let uplink = self.queue.peek()?;
        let result = self.network.send(uplink).await;
        match result {
            Ok(SendOutcome::Done(outcome)) => {
                self.queue.clear();
                self.deferred = self
                    .link
                    .on_uplink(outcome.ack || outcome.downlink.is_some());
                Some(Event::TxComplete(outcome))
            }
            Ok(SendOutcome::SessionExpired) => {
                debug!("Session expired, frame kept for rejoin");
                self.state = JoinState::Idle;
                Some(Event::Reset)
            }
            Err(e) => {
                warn!("Uplink dropped: {:?}", e);
                self.queue.clear();
                Some(Event::TxCanceled)
            }
        }
    }
}

impl<N: Network> Mac for MacRunner<N> {
    fn tx_rx_pending(&self) -> bool {
        self.queue.is_pending()
    }

    fn set_tx_data(&mut self, port: u8, data: &[u8], confirmed: bool) -> Result<(), Error> {
        if !(1..=223).contains(&port) {
            return Err(Error::InvalidPort(port));
        }
        let data = Vec::from_slice(data).map_err(|_| Error::PayloadTooLarge(data.len()))?;
        self.queue.push(Uplink {
            port,
            data,
            confirmed,
        })
    }

    fn set_link_check_mode(&mut self, enabled: bool) {
        self.link.set_enabled(enabled);
    }
}
