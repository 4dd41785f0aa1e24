//! Connection state machine.
//!
//! The session task exclusively owns the TCP connection and every piece of
//! mutable session state (coordinator queues, timers, lifecycle state), so
//! the whole protocol runs lock-free on one task. Encoders and decoders never
//! touch the socket; they only produce and consume finished frames.
//!
//! Lifecycle: `Disconnected` until an explicit connect op arrives, then
//! `Connecting`. A successful connect enters `Connected` and issues the two
//! staggered initial status queries. Any transport error logs, force-closes
//! the socket and enters `ReconnectPending`; after the backoff the session
//! broadcasts [`Event::ReconnectRequested`] and retries, unless an explicit
//! connect already restarted the cycle.

use std::io;
use std::ops::ControlFlow;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use airtouch_core::Error;
use airtouch_core::constants::{MSGTYPE_AC_STAT, MSGTYPE_GRP_STAT};
use airtouch_protocol::{AirtouchCodec, Frame, decode_ac_status, decode_group_status};

use crate::client::{ClientConfig, Event, Op};
use crate::coordinator::RequestCoordinator;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none requested.
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// The socket is open and frames are flowing.
    Connected,
    /// The connection was lost; a retry is scheduled after the backoff.
    ReconnectPending,
}

/// Await an optional deadline; never resolves when unarmed.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub(crate) struct Session {
    config: ClientConfig,
    state: ConnectionState,
    framed: Option<Framed<TcpStream, AirtouchCodec>>,
    coordinator: RequestCoordinator,
    ops: mpsc::UnboundedReceiver<Op>,
    events: broadcast::Sender<Event>,
    /// Deadline for the staggered group status query after connecting.
    group_stagger_at: Option<Instant>,
}

impl Session {
    pub(crate) fn new(
        config: ClientConfig,
        ops: mpsc::UnboundedReceiver<Op>,
        events: broadcast::Sender<Event>,
    ) -> Self {
        let coordinator = RequestCoordinator::new(config.status_debounce, config.poll_throttle);
        Session {
            config,
            state: ConnectionState::Disconnected,
            framed: None,
            coordinator,
            ops,
            events,
            group_stagger_at: None,
        }
    }

    /// Drive the state machine until every client handle is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            let flow = match self.state {
                ConnectionState::Disconnected => self.run_disconnected().await,
                ConnectionState::Connecting => {
                    self.establish().await;
                    ControlFlow::Continue(())
                }
                ConnectionState::Connected => match self.framed.take() {
                    Some(framed) => self.run_connected(framed).await,
                    None => {
                        self.state = ConnectionState::ReconnectPending;
                        ControlFlow::Continue(())
                    }
                },
                ConnectionState::ReconnectPending => self.run_reconnect_pending().await,
            };
            if flow.is_break() {
                break;
            }
        }
        debug!("session task stopped");
    }

    async fn run_disconnected(&mut self) -> ControlFlow<()> {
        match self.ops.recv().await {
            None => ControlFlow::Break(()),
            Some(op) => {
                self.handle_op_offline(op);
                ControlFlow::Continue(())
            }
        }
    }

    /// One TCP connect attempt.
    async fn establish(&mut self) {
        let addr = self.config.controller_addr;
        info!(%addr, "connecting to controller");

        match time::timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                // Commands are tiny; don't let Nagle sit on them.
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(error = %e, "failed to set TCP_NODELAY");
                }
                info!(%addr, "connected to controller");
                self.framed = Some(Framed::new(stream, AirtouchCodec::new()));
                self.state = ConnectionState::Connected;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "connection failed");
                self.state = ConnectionState::ReconnectPending;
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.connect_timeout.as_millis() as u64,
                    "connection timed out"
                );
                self.state = ConnectionState::ReconnectPending;
            }
        }
    }

    /// Connected steady state: pump ops, inbound frames and timers until the
    /// transport fails or the client goes away.
    async fn run_connected(
        &mut self,
        mut framed: Framed<TcpStream, AirtouchCodec>,
    ) -> ControlFlow<()> {
        // Initial status: AC immediately, group staggered. The controller
        // handles the two kinds more reliably when not queried concurrently.
        if let Err(e) = framed.send(Frame::ac_status_query()).await {
            self.on_transport_error(&e);
            return ControlFlow::Continue(());
        }
        self.group_stagger_at = Some(Instant::now() + self.config.group_status_stagger);

        loop {
            tokio::select! {
                op = self.ops.recv() => {
                    let Some(op) = op else { return ControlFlow::Break(()) };
                    if let Err(e) = self.handle_op_online(&mut framed, op).await {
                        self.on_transport_error(&e);
                        return ControlFlow::Continue(());
                    }
                }

                inbound = framed.next() => {
                    match inbound {
                        Some(Ok(frame)) => self.dispatch(&frame),
                        Some(Err(e)) => {
                            self.on_transport_error(&e);
                            return ControlFlow::Continue(());
                        }
                        None => {
                            let eof = Error::Io(io::Error::new(
                                io::ErrorKind::UnexpectedEof,
                                "controller closed the connection",
                            ));
                            self.on_transport_error(&eof);
                            return ControlFlow::Continue(());
                        }
                    }
                }

                () = sleep_until_opt(self.coordinator.ac_deadline()),
                        if self.coordinator.ac_deadline().is_some() => {
                    self.coordinator.clear_ac_deadline();
                    trace!("AC debounce expired; querying status");
                    if let Err(e) = framed.send(Frame::ac_status_query()).await {
                        self.on_transport_error(&e);
                        return ControlFlow::Continue(());
                    }
                }

                () = sleep_until_opt(self.coordinator.group_deadline()),
                        if self.coordinator.group_deadline().is_some() => {
                    self.coordinator.clear_group_deadline();
                    trace!("group debounce expired; querying status");
                    if let Err(e) = framed.send(Frame::group_status_query()).await {
                        self.on_transport_error(&e);
                        return ControlFlow::Continue(());
                    }
                }

                () = sleep_until_opt(self.group_stagger_at),
                        if self.group_stagger_at.is_some() => {
                    self.group_stagger_at = None;
                    if let Err(e) = framed.send(Frame::group_status_query()).await {
                        self.on_transport_error(&e);
                        return ControlFlow::Continue(());
                    }
                }
            }
        }
    }

    /// Wait out the reconnect backoff, still accepting ops. An explicit
    /// connect op short-circuits the backoff; otherwise the session retries
    /// by itself and lets supervisors know.
    async fn run_reconnect_pending(&mut self) -> ControlFlow<()> {
        let deadline = Instant::now() + self.config.reconnect_backoff;
        loop {
            tokio::select! {
                () = time::sleep_until(deadline) => {
                    if self.state == ConnectionState::ReconnectPending {
                        info!("reconnect backoff elapsed; retrying");
                        let _ = self.events.send(Event::ReconnectRequested);
                        self.state = ConnectionState::Connecting;
                    }
                    return ControlFlow::Continue(());
                }
                op = self.ops.recv() => {
                    let Some(op) = op else { return ControlFlow::Break(()) };
                    self.handle_op_offline(op);
                    if self.state != ConnectionState::ReconnectPending {
                        return ControlFlow::Continue(());
                    }
                }
            }
        }
    }

    fn on_transport_error(&mut self, err: &Error) {
        warn!(error = %err, "transport error; closing connection");
        self.state = ConnectionState::ReconnectPending;
    }

    /// Dispatch one validated inbound frame by message type.
    fn dispatch(&mut self, frame: &Frame) {
        match frame.message_type {
            MSGTYPE_AC_STAT => {
                let records = decode_ac_status(&frame.payload);
                debug!(units = records.len(), "AC status received");
                let _ = self.events.send(Event::AcStatus(records.clone()));
                self.coordinator.drain_ac(&records);
            }
            MSGTYPE_GRP_STAT => {
                let records = decode_group_status(&frame.payload);
                debug!(groups = records.len(), "group status received");
                let _ = self.events.send(Event::GroupStatus(records.clone()));
                self.coordinator.drain_group(&records);
            }
            other => {
                trace!(message_type = format_args!("{other:#04x}"), "ignoring message");
            }
        }
    }

    async fn handle_op_online(
        &mut self,
        framed: &mut Framed<TcpStream, AirtouchCodec>,
        op: Op,
    ) -> Result<(), Error> {
        match op {
            Op::Connect => debug!("already connected; ignoring connect"),
            Op::AcControl(cmd) => {
                let frame = Frame::ac_control(cmd.pack());
                debug!(message_id = frame.message_id, "sending AC control");
                framed.send(frame).await?;
            }
            Op::GroupControl(cmd) => {
                let frame = Frame::group_control(cmd.pack());
                debug!(message_id = frame.message_id, "sending group control");
                framed.send(frame).await?;
            }
            Op::RequestAcStatus(waiter) => self.coordinator.enqueue_ac(waiter),
            Op::RequestGroupStatus(waiter) => self.coordinator.enqueue_group(waiter),
            Op::RequestStatus => {
                if self.coordinator.should_poll(Instant::now()) {
                    framed.send(Frame::ac_status_query()).await?;
                    framed.send(Frame::group_status_query()).await?;
                } else {
                    trace!("status poll throttled");
                }
            }
        }
        Ok(())
    }

    /// Op handling while no connection is open. Status waiters still queue
    /// (they resolve after the next reconnect round trip); control commands
    /// are fire-and-forget and get dropped.
    fn handle_op_offline(&mut self, op: Op) {
        match op {
            Op::Connect => {
                info!("connect requested");
                self.state = ConnectionState::Connecting;
            }
            Op::AcControl(_) | Op::GroupControl(_) => {
                warn!("not connected; dropping control command");
            }
            Op::RequestAcStatus(waiter) => self.coordinator.enqueue_ac(waiter),
            Op::RequestGroupStatus(waiter) => self.coordinator.enqueue_group(waiter),
            Op::RequestStatus => debug!("not connected; ignoring status poll"),
        }
    }
}
