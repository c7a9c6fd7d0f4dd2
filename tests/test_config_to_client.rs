//! Settings file through to a running device client

use gdgkit::{
    client_config, AdjustmentKind, Channel, Config, DeviceClient, DeviceTiming, LogLevel,
    MockDevice,
};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_saved_config_drives_client() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gdgkit.toml");

    let mut config = Config::default();
    config.autorun.interval_ms = 1;
    config.logging.level = LogLevel::Error;
    config
        .hosts
        .insert("bench".to_string(), "127.0.0.1".to_string());
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.resolve_host("BENCH"), "127.0.0.1");

    let mut client_cfg = client_config(&loaded, false);
    assert_eq!(client_cfg.autorun_interval, Duration::from_millis(1));
    client_cfg.timing = DeviceTiming::immediate();

    let device = MockDevice::new();
    let mut client = DeviceClient::with_connector(client_cfg, device.connector());
    assert!(client.connect(loaded.resolve_host("bench"), loaded.connection.port));
    assert!(client.set_adjustment("b", AdjustmentKind::Width, "42.5"));
    assert_eq!(device.width(Channel::B), 42.5);

    // Error level config: successful commands leave nothing in the operator log.
    assert!(client.drain_log_events().is_empty());

    assert!(!client.set_adjustment("b", AdjustmentKind::Width, "abc"));
    let events = client.drain_log_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_error());
}

#[test]
fn test_debug_flag_shows_command_traffic() {
    let mut client_cfg = client_config(&Config::default(), true);
    client_cfg.timing = DeviceTiming::immediate();

    let device = MockDevice::new();
    let mut client = DeviceClient::with_connector(client_cfg, device.connector());
    assert!(client.connect("gdg1", 10001));
    assert!(client.set_trigger_mode("a", "last"));

    let events = client.drain_log_events();
    assert!(events
        .iter()
        .any(|e| e.level == LogLevel::Debug && e.message == "run cmd:apl, return:ok"));
}
