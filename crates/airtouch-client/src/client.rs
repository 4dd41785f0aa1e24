//! Public client handle and configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use airtouch_core::constants::{
    DEFAULT_PORT, GROUP_STATUS_STAGGER, POLL_THROTTLE, RECONNECT_BACKOFF, STATUS_DEBOUNCE,
};
use airtouch_core::{AcFanSpeed, GroupControlType};
use airtouch_protocol::{AcControl, AcStatusRecord, GroupControl, GroupStatusRecord};

use crate::session::Session;

/// Configuration for a controller connection.
///
/// Timing fields default to the protocol-correct values from
/// [`airtouch_core::constants`]; tests compress them to keep wall-clock time
/// short.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller address.
    pub controller_addr: SocketAddr,

    /// Timeout for the TCP connect itself.
    pub connect_timeout: Duration,

    /// Debounce window coalescing per-kind status requests.
    pub status_debounce: Duration,

    /// Delay between the AC and group status queries after connecting.
    pub group_status_stagger: Duration,

    /// Minimum interval between combined polls via `request_status`.
    pub poll_throttle: Duration,

    /// Backoff before reconnecting after a transport error.
    pub reconnect_backoff: Duration,
}

impl ClientConfig {
    /// Configuration for a controller at `host` on the standard port 9004.
    #[must_use]
    pub fn for_host(host: IpAddr) -> Self {
        Self::for_addr(SocketAddr::new(host, DEFAULT_PORT))
    }

    /// Configuration for an explicit socket address.
    #[must_use]
    pub fn for_addr(controller_addr: SocketAddr) -> Self {
        ClientConfig {
            controller_addr,
            connect_timeout: Duration::from_millis(3000),
            status_debounce: STATUS_DEBOUNCE,
            group_status_stagger: GROUP_STATUS_STAGGER,
            poll_throttle: POLL_THROTTLE,
            reconnect_backoff: RECONNECT_BACKOFF,
        }
    }
}

/// Notifications broadcast by the session.
#[derive(Debug, Clone)]
pub enum Event {
    /// Decoded AC status broadcast (one record per unit).
    AcStatus(Vec<AcStatusRecord>),

    /// Decoded group status broadcast (one record per zone).
    GroupStatus(Vec<GroupStatusRecord>),

    /// The session lost its connection and is about to retry; supervision
    /// layers may re-invoke [`AirtouchClient::connect`].
    ReconnectRequested,
}

/// Errors surfaced to callers of the client handle.
///
/// Write commands are fire-and-forget and never report delivery failures;
/// only the read path can fail from the caller's point of view.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session task is gone; no response will ever arrive.
    #[error("Session closed")]
    SessionClosed,
}

/// Operations sent from the handle to the session task.
pub(crate) enum Op {
    Connect,
    AcControl(AcControl),
    GroupControl(GroupControl),
    RequestAcStatus(oneshot::Sender<Vec<AcStatusRecord>>),
    RequestGroupStatus(oneshot::Sender<Vec<GroupStatusRecord>>),
    RequestStatus,
}

/// Handle to one controller session.
///
/// Creating a client spawns the session task in the `Disconnected` state;
/// nothing touches the network until [`connect`](Self::connect) is called.
/// Handles are cheap to clone; every clone talks to the same session.
#[derive(Clone)]
pub struct AirtouchClient {
    ops: mpsc::UnboundedSender<Op>,
    events: broadcast::Sender<Event>,
}

impl AirtouchClient {
    /// Create a client and spawn its session task.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        debug!(addr = %config.controller_addr, "creating AirTouch client");

        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(32);
        tokio::spawn(Session::new(config, ops_rx, events_tx.clone()).run());

        AirtouchClient {
            ops: ops_tx,
            events: events_tx,
        }
    }

    /// Subscribe to status and reconnect notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Begin connecting to the controller. Ignored if a connection is
    /// already open or being opened.
    pub fn connect(&self) {
        self.send_op(Op::Connect);
    }

    /// Set the abstract heating/cooling state of an AC unit: 0 off, 1 heat,
    /// 2 cool, anything else auto.
    pub fn ac_set_current_heating_cooling_state(&self, unit_number: u8, state: u8) {
        self.send_op(Op::AcControl(AcControl::heating_cooling_state(
            unit_number,
            state,
        )));
    }

    /// Set an AC unit's target temperature in whole degrees Celsius.
    pub fn ac_set_target_temperature(&self, unit_number: u8, celsius: u8) {
        self.send_op(Op::AcControl(AcControl::target_temperature(
            unit_number,
            celsius,
        )));
    }

    /// Set an AC unit's fan speed.
    pub fn ac_set_fan_speed(&self, unit_number: u8, speed: AcFanSpeed) {
        self.send_op(Op::AcControl(AcControl::fan_speed(unit_number, speed)));
    }

    /// Power a zone on or off.
    pub fn zone_set_active(&self, group_number: u8, active: bool) {
        self.send_op(Op::GroupControl(GroupControl::set_active(
            group_number,
            active,
        )));
    }

    /// Drive a zone's damper to an open percentage.
    pub fn zone_set_damper_position(&self, group_number: u8, percent: u8) {
        self.send_op(Op::GroupControl(GroupControl::damper_position(
            group_number,
            percent,
        )));
    }

    /// Switch a zone between damper and temperature regulation.
    pub fn zone_set_control_type(&self, group_number: u8, kind: GroupControlType) {
        self.send_op(Op::GroupControl(GroupControl::control_type(
            group_number,
            kind,
        )));
    }

    /// Set a zone's target temperature in whole degrees Celsius.
    pub fn zone_set_target_temperature(&self, group_number: u8, celsius: u8) {
        self.send_op(Op::GroupControl(GroupControl::target_temperature(
            group_number,
            celsius,
        )));
    }

    /// Request an AC status round trip.
    ///
    /// Requests within the debounce window coalesce into a single wire query;
    /// every caller still resolves when the response decodes.
    ///
    /// # Errors
    /// Returns `ClientError::SessionClosed` if the session task is gone.
    pub async fn request_ac_status(&self) -> Result<Vec<AcStatusRecord>, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send_op(Op::RequestAcStatus(tx));
        rx.await.map_err(|_| ClientError::SessionClosed)
    }

    /// Request a group status round trip. Coalesces like
    /// [`request_ac_status`](Self::request_ac_status).
    ///
    /// # Errors
    /// Returns `ClientError::SessionClosed` if the session task is gone.
    pub async fn request_group_status(&self) -> Result<Vec<GroupStatusRecord>, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send_op(Op::RequestGroupStatus(tx));
        rx.await.map_err(|_| ClientError::SessionClosed)
    }

    /// Issue a combined AC+Group poll, throttled to once per configured
    /// window. Calls inside the window are no-ops.
    pub fn request_status(&self) {
        self.send_op(Op::RequestStatus);
    }

    fn send_op(&self, op: Op) {
        if self.ops.send(op).is_err() {
            warn!("session task stopped; operation dropped");
        }
    }
}
