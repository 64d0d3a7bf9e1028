// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use bookscan::Config;

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(
        config.decode_interval_ms, 250,
        "Decode cadence should default to 4 Hz"
    );
    assert!(config.tone_enabled, "Tone should be enabled by default");
    assert!(
        config.camera.device_path.is_none(),
        "No device should be pinned by default"
    );
}

#[test]
fn test_config_serde_round_trip() {
    let config = Config::default();
    let raw = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, config);
}
