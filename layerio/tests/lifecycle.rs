use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use layerio::io::{input_bytes, output_buffer, pipe};
use layerio::{
    counting_output, tab_output, tee, FnSink, FnSource, Input, Output, Ownership, StreamError,
};
use layerio_mocked::{recording_output, Call, ScriptedSink, ScriptedSource};
use parking_lot::Mutex;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn accumulator_is_concatenation_of_writes() {
    let out = output_buffer();
    let mut expected = Vec::new();
    for chunk in [&b"alpha"[..], b"", b"\x00\xff", b"omega"] {
        out.write_all(chunk).unwrap();
        expected.extend_from_slice(chunk);
    }
    assert_eq!(out.close().unwrap(), expected);
}

#[test]
fn closing_derived_stream_leaves_base_writable() {
    let base = output_buffer();
    let (counted, _) = counting_output(&base, Ownership::Borrowed);
    counted.write_all(b"through wrapper;").unwrap();
    counted.close().unwrap();

    assert!(counted.is_closed());
    assert!(!base.is_closed());
    base.write_all(b"direct").unwrap();
    assert_eq!(base.close().unwrap(), b"through wrapper;direct");
}

#[test]
fn second_close_is_a_no_op() {
    let (out, log) = recording_output();
    out.write_all(b"once").unwrap();
    let first = out.close().unwrap();
    let second = out.close().unwrap();
    assert_eq!(first, second);
    assert_eq!(log.count(&Call::Close), 1);
    assert!(out.flush().is_ok());
    assert_eq!(log.count(&Call::Flush), 1);
}

#[test]
fn owned_wrap_closes_base_after_itself() {
    init_logging();
    let (base, log) = recording_output();
    let tabbed = tab_output(&base, 1, Ownership::Owned);
    tabbed.write_str("x").unwrap();
    tabbed.close().unwrap();

    assert!(base.is_closed());
    assert_eq!(log.bytes(), b" x");
    assert_eq!(log.calls().last(), Some(&Call::Close));
}

#[test]
fn borrowed_wrap_flushes_base_on_close() {
    let (base, log) = recording_output();
    let tabbed = tab_output(&base, 2, Ownership::Borrowed);
    tabbed.write_str("line").unwrap();
    tabbed.close().unwrap();

    assert!(!base.is_closed());
    assert_eq!(log.bytes(), b"  line");
    assert_eq!(log.count(&Call::Flush), 1);
    assert_eq!(log.count(&Call::Close), 0);
}

#[test]
fn closing_base_pulls_buffered_bytes_from_dependents() {
    init_logging();
    let base = output_buffer();
    let tabbed = tab_output(&base, 2, Ownership::Borrowed);
    tabbed.write_str("unterminated").unwrap();
    assert_eq!(base.dependents(), vec![tabbed.id()]);

    assert_eq!(base.close().unwrap(), b"  unterminated");
    assert!(!tabbed.is_closed());
    assert!(tabbed.write_str("\nmore").unwrap_err().is_closed());
}

#[test]
fn flushing_base_pulls_buffered_bytes_through_two_levels() {
    let (base, log) = recording_output();
    let outer = tab_output(&base, 1, Ownership::Borrowed);
    let inner = tab_output(&outer, 1, Ownership::Borrowed);
    inner.write_str("deep").unwrap();
    assert!(log.bytes().is_empty());

    base.flush().unwrap();
    assert_eq!(log.bytes(), b"  deep");
}

#[test]
fn wrap_over_closed_base_fails_on_use() {
    let base = output_buffer();
    base.close().unwrap();
    let (counted, _) = counting_output(&base, Ownership::Borrowed);
    assert!(matches!(counted.write_byte(1), Err(StreamError::OutputClosed)));
    counted.close().unwrap();
}

#[test]
fn tab_over_closed_base_fails_before_newline() {
    let base = output_buffer();
    base.close().unwrap();
    let tabbed = tab_output(&base, 2, Ownership::Borrowed);
    assert!(matches!(tabbed.write_all(b"partial"), Err(StreamError::OutputClosed)));
    assert!(matches!(tabbed.write_str("line\n"), Err(StreamError::OutputClosed)));
}

#[test]
fn wrap_needs_a_dependency() {
    let err = Output::wrap(output_buffer_sink(), Vec::new(), Ownership::Borrowed).unwrap_err();
    assert!(matches!(err, StreamError::InvalidArgument(_)));
}

fn output_buffer_sink() -> FnSink<()> {
    FnSink::new(|buf: &[u8]| Ok(buf.len()), || Ok(()))
}

#[test]
fn failed_close_still_marks_closed() {
    init_logging();
    let input = Input::new(ScriptedSource::new(b"abc".to_vec()).failing_close());
    assert!(matches!(input.close(), Err(StreamError::Io(_))));
    assert!(input.is_closed());
    assert!(matches!(input.read_byte(), Err(StreamError::InputClosed)));
    // no accumulator was produced, and the callback is not run again
    assert!(matches!(input.close(), Err(StreamError::InputClosed)));

    let out = Output::new(FnSink::new(
        |buf: &[u8]| Ok(buf.len()),
        || Err::<(), _>(StreamError::Provider("disk gone".into())),
    ));
    assert!(matches!(out.close(), Err(StreamError::Provider(_))));
    assert!(matches!(out.close(), Err(StreamError::OutputClosed)));
    assert!(out.flush().is_ok());
}

#[test]
fn failed_flush_is_reported_and_close_still_happens() {
    let out = Output::new(ScriptedSink::new().failing_flush());
    out.write_all(b"data").unwrap();
    assert!(out.flush().is_err());
    assert!(out.close().is_err());
    assert!(out.is_closed());
}

#[test]
fn dropping_last_handle_closes() {
    init_logging();
    let (out, log) = recording_output();
    let wrapper = tee(&[out.clone()]).unwrap();
    wrapper.write_all(b"bye").unwrap();
    drop(wrapper);
    drop(out);
    assert_eq!(log.bytes(), b"bye");
    assert_eq!(log.count(&Call::Close), 1);
}

#[test]
fn describe_shows_shared_base_under_each_branch() {
    let base = output_buffer();
    let left = tab_output(&base, 1, Ownership::Borrowed);
    let right = tab_output(&base, 2, Ownership::Borrowed);
    let both = tee(&[left, right]).unwrap();
    let tree = both.describe();
    assert_eq!(tree.matches("BufferSink").count(), 2);
    assert!(tree.contains("TeeSink"));
    assert!(tree.contains("[open]"));
}

#[test]
fn input_closed_after_close() {
    let input = input_bytes(b"xyz".to_vec());
    input.close().unwrap();
    let mut buf = [0u8; 3];
    assert!(matches!(input.read_exact(&mut buf, 0, 3), Err(StreamError::InputClosed)));
    assert!(input.close().is_ok());
}

#[test]
fn short_read_exact_fails_once_and_leaves_stream_usable() {
    let input = input_bytes(b"abcde".to_vec());
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf, 0, 2).unwrap();
    assert_eq!(&buf[..2], b"ab");

    let err = input.read_exact(&mut buf, 0, 4).unwrap_err();
    assert!(err.is_end_of_stream());
    assert_eq!(&buf[..3], b"cde");
    assert!(!input.is_closed());

    // the next attempt sees the exhausted stream, not a repeat of the old failure
    assert!(input.read_exact(&mut buf, 0, 0).is_ok());
    assert!(input.read_byte().unwrap_err().is_end_of_stream());
    input.close().unwrap();
}

#[test]
fn state_queries_do_not_wait_for_a_blocked_read() {
    let (reader, writer) = pipe();
    thread::scope(|s| {
        let pending = s.spawn(|| reader.read_byte());
        thread::sleep(Duration::from_millis(50));

        let (tx, rx) = mpsc::channel();
        let observer = reader.clone();
        s.spawn(move || {
            let closed = observer.is_closed();
            let shown = format!("{observer:?}");
            let tree = observer.describe();
            tx.send((closed, shown, tree)).unwrap();
        });
        let (closed, shown, tree) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(!closed);
        assert!(shown.contains("closed=false"));
        assert!(tree.contains("[open]"));

        writer.write_byte(b'x').unwrap();
        assert_eq!(pending.join().unwrap().unwrap(), b'x');
    });
    writer.close().unwrap();
    reader.close().unwrap();
}

#[test]
fn close_marks_closed_before_a_pending_read_returns() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<u8>();
    let input = Input::new(FnSource::new(
        move |buf: &mut [u8]| {
            let _ = entered_tx.send(());
            match release_rx.recv() {
                Ok(byte) => {
                    buf[0] = byte;
                    Ok(1)
                }
                Err(_) => Ok(0),
            }
        },
        || Ok(()),
    ));

    thread::scope(|s| {
        let pending = s.spawn(|| input.read_byte());
        entered_rx.recv().unwrap();
        let closer = s.spawn(|| input.close());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !input.is_closed() {
            assert!(Instant::now() < deadline, "close never marked the stream");
            thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(input.read_byte(), Err(StreamError::InputClosed)));

        release_tx.send(b'z').unwrap();
        assert_eq!(pending.join().unwrap().unwrap(), b'z');
        closer.join().unwrap().unwrap();
    });
}

#[test]
fn hook_registered_during_close_runs_after_the_callback() {
    let events: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let slot: Arc<Mutex<Option<Output>>> = Arc::default();
    let out = Output::new(FnSink::new(|buf: &[u8]| Ok(buf.len()), {
        let slot = Arc::clone(&slot);
        let events = Arc::clone(&events);
        move || {
            let me = slot.lock().take();
            if let Some(me) = me {
                let hook_events = Arc::clone(&events);
                me.on_close(move || hook_events.lock().push("hook"));
            }
            events.lock().push("callback");
            Ok(())
        }
    }));
    *slot.lock() = Some(out.clone());

    out.close().unwrap();
    assert_eq!(*events.lock(), vec!["callback", "hook"]);
}

#[test]
fn hook_racing_with_close_runs_exactly_once() {
    for _ in 0..200 {
        let out = output_buffer();
        let calls = Arc::new(AtomicUsize::new(0));
        thread::scope(|s| {
            let counter = Arc::clone(&calls);
            let registrar = out.clone();
            s.spawn(move || {
                registrar.on_close(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            });
            s.spawn(|| out.close());
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
