use layerio::io::{input_bytes, output_buffer};
use layerio::{copy, copy_with_buffer_size, input_from_std, output_from_std, Input, StreamError};
use layerio_mocked::{scripted_input, scripted_output, ScriptedSource, SharedWriter, WANT_ERROR};

fn sample() -> Vec<u8> {
    (0..1000u32).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
fn copy_preserves_bytes_for_various_buffer_sizes() {
    let data = sample();
    for size in [1, 17, data.len() + 1, 64 * 1024] {
        let input = input_bytes(data.clone());
        let output = output_buffer();
        let copied = copy_with_buffer_size(&input, &output, size).unwrap();
        assert_eq!(copied, data.len() as u64, "buffer size {size}");
        assert_eq!(output.close().unwrap(), data, "buffer size {size}");
    }
}

#[test]
fn copy_of_empty_input() {
    let input = input_bytes(Vec::new());
    let output = output_buffer();
    assert_eq!(copy(&input, &output).unwrap(), 0);
    assert!(output.close().unwrap().is_empty());
}

#[test]
fn copy_handles_short_reads_and_short_writes() {
    let data = b"one\ntwo\nthree\n".to_vec();
    let input = scripted_input(data.clone());
    let output = scripted_output();
    copy_with_buffer_size(&input, &output, 5).unwrap();
    assert_eq!(output.close().unwrap(), data);
}

#[test]
fn copy_propagates_read_failure_after_partial_copy() {
    let input = Input::new(ScriptedSource::new(vec![b'a', b'b', WANT_ERROR, b'c']));
    let output = output_buffer();
    let err = copy_with_buffer_size(&input, &output, 17).unwrap_err();
    assert!(matches!(err, StreamError::Io(_)));
    assert_eq!(output.close().unwrap(), b"ab");
}

#[test]
fn copy_from_closed_input_fails() {
    let input = input_bytes(b"data".to_vec());
    input.close().unwrap();
    let output = output_buffer();
    assert!(matches!(copy(&input, &output), Err(StreamError::InputClosed)));
}

#[test]
fn copy_between_std_reader_and_writer() {
    let data = sample();
    let input = input_from_std(std::io::Cursor::new(data.clone()));
    let writer = SharedWriter::new();
    let output = output_from_std(writer.clone());

    assert_eq!(copy_with_buffer_size(&input, &output, 100).unwrap(), 1000);
    output.close().unwrap();
    assert_eq!(writer.bytes(), data);
}
