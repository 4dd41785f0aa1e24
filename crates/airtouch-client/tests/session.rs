//! Integration tests for the connection state machine.
//!
//! Each test stands up a fake controller on a local `TcpListener` speaking
//! the real codec, then drives the client against it. Timings are compressed
//! through the config; the protocol defaults stay untouched.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::Framed;

use airtouch_client::{AirtouchClient, ClientConfig, Event};
use airtouch_core::constants::{
    MSGTYPE_AC_CTRL, MSGTYPE_AC_STAT, MSGTYPE_GRP_CTRL, MSGTYPE_GRP_STAT,
};
use airtouch_protocol::{AcControl, AirtouchCodec, Frame, GroupControl};

/// Compressed-timing config pointed at the fake controller.
fn test_config(addr: SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::for_addr(addr);
    config.connect_timeout = Duration::from_millis(1000);
    config.status_debounce = Duration::from_millis(50);
    config.group_status_stagger = Duration::from_millis(100);
    config.poll_throttle = Duration::from_millis(300);
    config.reconnect_backoff = Duration::from_millis(150);
    config
}

/// One AC unit record: unit 1, power on, target 24, 25.0 degrees.
fn ac_status_payload() -> Vec<u8> {
    let raw_temp: u16 = 750;
    vec![
        0b0100_0001,
        0x00,
        24,
        0x00,
        (raw_temp >> 3) as u8,
        ((raw_temp & 0b111) as u8) << 5,
        0x00,
        0x00,
    ]
}

/// One group record: group 2, damper 60%, 25.0 degrees.
fn group_status_payload() -> Vec<u8> {
    let raw_temp: u16 = 750;
    vec![
        0b0100_0010,
        60,
        22,
        0b1000_0000,
        (raw_temp >> 3) as u8,
        ((raw_temp & 0b111) as u8) << 5,
    ]
}

/// Serve one accepted connection: forward every inbound frame to the test
/// body and write back whatever the test body supplies.
fn spawn_controller(
    listener: TcpListener,
) -> (mpsc::UnboundedReceiver<Frame>, mpsc::UnboundedSender<Frame>) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, AirtouchCodec::new());
        loop {
            tokio::select! {
                inbound = framed.next() => {
                    match inbound {
                        Some(Ok(frame)) => {
                            if inbound_tx.send(frame).is_err() {
                                return;
                            }
                        }
                        _ => return,
                    }
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(frame) => framed.send(frame).await.unwrap(),
                        None => return,
                    }
                }
            }
        }
    });

    (inbound_rx, outbound_tx)
}

async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Frame {
    timeout(Duration::from_millis(2000), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("controller task ended")
}

#[tokio::test]
async fn connect_issues_staggered_initial_queries() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (mut inbound, outbound) = spawn_controller(listener);

    let client = AirtouchClient::new(test_config(addr));
    let mut events = client.subscribe();
    client.connect();

    // AC query comes first, group follows after the stagger delay.
    let first = recv_frame(&mut inbound).await;
    assert_eq!(first.message_type, MSGTYPE_AC_STAT);
    assert!(!first.payload.is_empty(), "status query payload must be non-empty");

    let second = recv_frame(&mut inbound).await;
    assert_eq!(second.message_type, MSGTYPE_GRP_STAT);
    assert!(!second.payload.is_empty());

    // Respond to both; the decoded records are broadcast.
    outbound
        .send(Frame::with_id(10, MSGTYPE_AC_STAT, ac_status_payload()))
        .unwrap();
    let event = timeout(Duration::from_millis(2000), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        Event::AcStatus(units) => {
            assert_eq!(units.len(), 1);
            assert_eq!(units[0].unit_number, 1);
            assert_eq!(units[0].power_state, 1);
            assert!((units[0].target - 24.0).abs() < f32::EPSILON);
            assert!((units[0].temperature - 25.0).abs() < 0.001);
        }
        other => panic!("expected AC status event, got {other:?}"),
    }

    outbound
        .send(Frame::with_id(11, MSGTYPE_GRP_STAT, group_status_payload()))
        .unwrap();
    let event = timeout(Duration::from_millis(2000), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        Event::GroupStatus(groups) => {
            assert_eq!(groups.len(), 1);
            assert_eq!(groups[0].group_number, 2);
            assert_eq!(groups[0].damper_position, 60);
            assert!(groups[0].has_sensor);
        }
        other => panic!("expected group status event, got {other:?}"),
    }
}

#[tokio::test]
async fn control_commands_reach_the_wire_packed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (mut inbound, _outbound) = spawn_controller(listener);

    let mut config = test_config(addr);
    config.group_status_stagger = Duration::from_secs(60); // keep the wire quiet
    let client = AirtouchClient::new(config);
    client.connect();

    // Swallow the initial AC query.
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);

    client.ac_set_current_heating_cooling_state(1, 2);
    let frame = recv_frame(&mut inbound).await;
    assert_eq!(frame.message_type, MSGTYPE_AC_CTRL);
    assert_eq!(
        frame.payload.as_ref(),
        AcControl::heating_cooling_state(1, 2).pack()
    );
    assert!(frame.message_id >= 1);

    client.zone_set_damper_position(3, 75);
    let frame = recv_frame(&mut inbound).await;
    assert_eq!(frame.message_type, MSGTYPE_GRP_CTRL);
    assert_eq!(
        frame.payload.as_ref(),
        GroupControl::damper_position(3, 75).pack()
    );
}

#[tokio::test]
async fn burst_of_status_requests_coalesces_into_one_query() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (mut inbound, outbound) = spawn_controller(listener);

    let mut config = test_config(addr);
    config.group_status_stagger = Duration::from_secs(60);
    let client = AirtouchClient::new(config);
    client.connect();

    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);

    // Three callers inside one debounce window.
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.request_ac_status().await })
        })
        .collect();

    // Exactly one query hits the wire.
    let query = recv_frame(&mut inbound).await;
    assert_eq!(query.message_type, MSGTYPE_AC_STAT);
    assert!(
        timeout(Duration::from_millis(200), inbound.recv())
            .await
            .is_err(),
        "burst must coalesce into a single query"
    );

    // One response resolves every waiter.
    outbound
        .send(Frame::with_id(42, MSGTYPE_AC_STAT, ac_status_payload()))
        .unwrap();
    for waiter in waiters {
        let records = waiter.await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit_number, 1);
    }

    // A request after the drain waits for a fresh round trip.
    let late = {
        let client = client.clone();
        tokio::spawn(async move { client.request_ac_status().await })
    };
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);
    outbound
        .send(Frame::with_id(43, MSGTYPE_AC_STAT, ac_status_payload()))
        .unwrap();
    assert!(late.await.unwrap().is_ok());
}

#[tokio::test]
async fn combined_poll_is_throttled() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (mut inbound, _outbound) = spawn_controller(listener);

    let mut config = test_config(addr);
    config.group_status_stagger = Duration::from_secs(60);
    let client = AirtouchClient::new(config);
    client.connect();

    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);

    // Two polls inside the window produce a single AC+Group pair.
    client.request_status();
    client.request_status();
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_GRP_STAT);
    assert!(
        timeout(Duration::from_millis(200), inbound.recv())
            .await
            .is_err(),
        "second poll inside the window must be a no-op"
    );

    // After the window elapses a new poll goes through.
    tokio::time::sleep(Duration::from_millis(350)).await;
    client.request_status();
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_GRP_STAT);
}

#[tokio::test]
async fn lost_connection_reconnects_after_backoff() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // First accept: drop the connection straight away.
    let first_conn = tokio::spawn({
        let listener = listener;
        async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
            listener
        }
    });

    let client = AirtouchClient::new(test_config(addr));
    let mut events = client.subscribe();
    client.connect();

    // The session announces the retry after the backoff.
    let event = timeout(Duration::from_millis(2000), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, Event::ReconnectRequested));

    // Second accept: the reconnected session starts its status cycle over.
    let listener = first_conn.await.unwrap();
    let (mut inbound, _outbound) = spawn_controller(listener);
    let frame = recv_frame(&mut inbound).await;
    assert_eq!(frame.message_type, MSGTYPE_AC_STAT);
}

#[tokio::test]
async fn status_request_queued_while_disconnected_resolves_after_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (mut inbound, outbound) = spawn_controller(listener);

    let mut config = test_config(addr);
    config.group_status_stagger = Duration::from_secs(60);
    let client = AirtouchClient::new(config);

    // Queue before any connection exists.
    let waiter = {
        let client = client.clone();
        tokio::spawn(async move { client.request_group_status().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.connect();

    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_AC_STAT);
    // The queued group request fires once connected.
    assert_eq!(recv_frame(&mut inbound).await.message_type, MSGTYPE_GRP_STAT);

    outbound
        .send(Frame::with_id(7, MSGTYPE_GRP_STAT, group_status_payload()))
        .unwrap();
    let records = waiter.await.unwrap().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].group_number, 2);
}
