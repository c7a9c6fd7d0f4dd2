//! Device client over a real TCP socket
//!
//! A thread plays the instrument: it accepts one connection, reads command
//! lines and answers from a script.

use gdgkit_communication::{
    ClientConfig, CommandExecutor, ConnectionManager, DeviceClient, DeviceTiming, TcpConnector,
    TERMINATOR,
};
use gdgkit_core::{log_bridge, LogLevel};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Start a scripted device. `None` entries leave a command unanswered.
fn spawn_device(script: Vec<Option<&'static [u8]>>) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut script: VecDeque<_> = script.into();
        let mut received = Vec::new();

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    received.push(line);
                    if let Some(Some(reply)) = script.pop_front() {
                        writer.write_all(reply).unwrap();
                    }
                }
            }
        }
        received
    });

    (port, handle)
}

/// Start a device that answers one command with `reply` and then hangs up.
fn spawn_hangup_device(reply: &'static [u8]) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        writer.write_all(reply).unwrap();
        line
    });

    (port, handle)
}

fn test_config() -> ClientConfig {
    ClientConfig {
        timing: DeviceTiming {
            connect_timeout: Duration::from_secs(1),
            connect_settle: Duration::from_millis(10),
            command_settle: Duration::from_millis(10),
            response_timeout: Duration::from_millis(300),
        },
        log_level: LogLevel::Info,
        autorun_interval: Duration::from_millis(10),
    }
}

#[test]
fn test_connect_and_read_settings() {
    let (port, device) = spawn_device(vec![Some(
        &b"10000000.0, 0000500.0, 00000010.0, 00009999.9\r\n"[..],
    )]);
    let mut client = DeviceClient::new(test_config());

    assert!(client.connect("127.0.0.1", port));
    let snapshot = client.read_settings();
    assert_eq!(
        snapshot.raw(),
        "10000000.0, 0000500.0, 00000010.0, 00009999.9"
    );
    assert!(client.disconnect());

    let received = device.join().unwrap();
    assert_eq!(received, vec!["ral\n".to_string()]);
    assert!(client.drain_log_events().iter().all(|e| !e.is_error()));
}

#[test]
fn test_silent_device_yields_empty_response() {
    let (port, device) = spawn_device(vec![None]);
    let mut manager = ConnectionManager::new(Box::new(TcpConnector::new()));
    let timing = test_config().timing;
    manager.open("127.0.0.1", port, &timing).unwrap();

    let (sink, _receiver) = log_bridge(LogLevel::Debug);
    let reply = CommandExecutor::new(timing.command_settle)
        .execute(&mut manager, "ral\n", TERMINATOR, timing.response_timeout, &sink)
        .unwrap();
    assert_eq!(reply, "");
    assert!(manager.is_connected());

    manager.close();
    device.join().unwrap();
}

#[test]
fn test_silent_device_read_settings_logs_error() {
    let (port, device) = spawn_device(vec![None]);
    let mut client = DeviceClient::new(test_config());

    assert!(client.connect("127.0.0.1", port));
    assert!(client.read_settings().is_empty());
    client.disconnect();
    device.join().unwrap();

    let events = client.drain_log_events();
    let errors: Vec<_> = events.iter().filter(|e| e.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("empty"));
}

#[test]
fn test_noisy_reply_is_decoded_permissively() {
    let (port, device) = spawn_device(vec![Some(&b"\xff\xfbok\xfe\n"[..])]);
    let mut client = DeviceClient::new(test_config());

    assert!(client.connect("127.0.0.1", port));
    assert!(client.set_output_control("a", "enable"));
    client.disconnect();

    assert_eq!(device.join().unwrap(), vec!["aen\n".to_string()]);
    let events = client.drain_log_events();
    assert!(events.iter().any(|e| e.message.ends_with("return: ok")));
}

#[test]
fn test_unreachable_host_fails_to_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut client = DeviceClient::new(test_config());
    assert!(!client.connect("127.0.0.1", port));
    assert!(!client.is_connected());

    let events = client.drain_log_events();
    assert_eq!(events.iter().filter(|e| e.is_error()).count(), 1);
}

#[test]
fn test_hangup_mid_reply_disconnects() {
    let (port, device) = spawn_hangup_device(b"10000000.0, 00");
    let mut client = DeviceClient::new(test_config());

    assert!(client.connect("127.0.0.1", port));
    let snapshot = client.read_settings();
    assert_eq!(device.join().unwrap(), "ral\n");

    assert_eq!(snapshot.raw(), "10000000.0, 00");
    assert!(!client.is_connected());
    assert_eq!(client.host(), None);

    let (port, device) = spawn_device(vec![Some(&b"ok\n"[..])]);
    assert!(client.connect("127.0.0.1", port));
    assert!(client.set_output_control("b", "disable"));
    client.disconnect();
    assert_eq!(device.join().unwrap(), vec!["bdi\n".to_string()]);

    let events = client.drain_log_events();
    assert!(events.iter().all(|e| !e.is_error()));
}
