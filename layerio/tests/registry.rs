use layerio::io::{input_bytes, output_buffer};
use layerio::{registry, tab_output, Input, Ownership, StreamConfig};
use layerio_mocked::ScriptedSource;
use parking_lot::Mutex;

// the registry is process-wide; tests in this file take turns
static SERIAL: Mutex<()> = parking_lot::const_mutex(());

#[test]
fn sweep_closes_wrappers_before_their_bases() {
    let _serial = SERIAL.lock();
    registry::close_all();

    let base = output_buffer();
    let tabbed = tab_output(&base, 3, Ownership::Borrowed);
    registry::track(&base);
    registry::track(&tabbed);
    tabbed.write_str("pending").unwrap();
    assert_eq!(registry::tracked_count(), 2);

    assert_eq!(registry::close_all(), 2);
    assert!(tabbed.is_closed());
    assert!(base.is_closed());
    assert_eq!(base.close().unwrap(), b"   pending");
    assert_eq!(registry::tracked_count(), 0);
    assert_eq!(registry::close_all(), 0);
}

#[test]
fn sweep_ignores_failures() {
    let _serial = SERIAL.lock();
    registry::close_all();

    let failing = Input::new(ScriptedSource::new(b"x".to_vec()).failing_close());
    let healthy = input_bytes(b"y".to_vec());
    registry::track(&failing);
    registry::track(&healthy);

    assert_eq!(registry::close_all(), 2);
    assert!(failing.is_closed());
    assert!(healthy.is_closed());
}

#[test]
fn explicit_close_removes_entry() {
    let _serial = SERIAL.lock();
    registry::close_all();

    let out = output_buffer();
    registry::track(&out);
    assert!(registry::is_tracked(out.id()));
    out.close().unwrap();
    assert!(!registry::is_tracked(out.id()));
    assert_eq!(registry::close_all(), 0);
}

#[test]
fn config_controls_tracking() {
    let _serial = SERIAL.lock();
    registry::close_all();

    let base = output_buffer();
    let untracked = StreamConfig::from_json(r#"{"locking": "per_stream"}"#).unwrap();
    let quiet = untracked.synchronize_output(&base);
    assert!(!registry::is_tracked(quiet.id()));

    let tracking = StreamConfig::from_json(r#"{"track": true}"#).unwrap();
    let loud = tracking.synchronize_output(&base);
    assert!(registry::is_tracked(loud.id()));
    assert!(registry::describe_all().contains("Synchronized"));

    assert_eq!(registry::close_all(), 1);
    assert!(loud.is_closed());
    assert!(!quiet.is_closed());
    assert!(!base.is_closed());
}
