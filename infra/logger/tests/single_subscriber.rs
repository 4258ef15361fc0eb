use cardly_logger::{Logger, LoggerError, parse_level};
use serial_test::serial;

#[test]
#[serial]
fn second_logger_in_one_process_is_refused() {
    let first = Logger::builder().name("cardly-server").level(parse_level("debug").unwrap()).init();
    let first = first.unwrap();
    assert!(!first.has_file_output());

    let second = Logger::builder().name("cardly-worker").level(parse_level("warn").unwrap()).init();
    assert!(matches!(second, Err(LoggerError::Subscriber { .. })));
}
