//! Connection layer for the AirTouch touchpad controller.
//!
//! This crate owns the TCP session: it drives frame reads and writes through
//! the [`airtouch_protocol`] codec, coalesces bursts of status requests,
//! staggers the initial status queries, and supervises reconnection after
//! transport errors.
//!
//! All session state lives on one spawned task; the [`AirtouchClient`] handle
//! talks to it over channels, so no locking is involved anywhere. Write
//! commands are fire-and-forget, matching the controller protocol: only
//! status reads and reconnect events are observable.
//!
//! # Example
//!
//! ```no_run
//! use airtouch_client::{AirtouchClient, ClientConfig, Event};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AirtouchClient::new(ClientConfig::for_host("192.168.1.10".parse()?));
//! let mut events = client.subscribe();
//! client.connect();
//!
//! client.ac_set_target_temperature(0, 23);
//!
//! while let Ok(event) = events.recv().await {
//!     if let Event::AcStatus(units) = event {
//!         println!("AC status: {units:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod coordinator;
mod session;

pub use client::{AirtouchClient, ClientConfig, ClientError, Event};
pub use session::ConnectionState;
