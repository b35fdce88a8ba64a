//! Wire-level tests: bytes in on the command link, lines out on the
//! telemetry link.

use blinkpuff::config::SystemConfig;
use blinkpuff::protocol::LINE_MAX;

use crate::mock_hw::Bench;

#[test]
fn command_split_across_reads_is_reassembled() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("STA");
    assert!(bench.sink.lines_starting("SEQ").is_empty());
    bench.now_ms = 7;
    bench.command("RT\n");

    let starts = bench.sink.lines_starting("SEQ START");
    assert_eq!(starts.len(), 1);
    assert!(starts[0].starts_with("SEQ START time_ms=7 |"), "{}", starts[0]);
}

#[test]
fn overlong_line_is_dropped_and_next_line_parses() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("STARTSTARTSTARTSTART");
    bench.command("START\n");
    // The overlong line swallowed everything up to the first newline.
    assert!(bench.sink.lines_starting("SEQ").is_empty());

    bench.command("START\r\n");
    assert_eq!(bench.sink.lines_starting("SEQ START").len(), 1);
}

#[test]
fn reject_and_cancel_lines() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("START\n");
    bench.now_ms = 50;
    bench.command("START\n");
    bench.now_ms = 90;
    bench.command("STOP\n");

    assert_eq!(
        bench.sink.lines_starting("SEQ REJECT"),
        ["SEQ REJECT time_ms=50 | reason=busy"]
    );
    assert_eq!(bench.sink.lines_starting("SEQ CANCEL"), ["SEQ CANCEL time_ms=90"]);
}

#[test]
fn every_wire_line_is_newline_terminated_and_bounded() {
    let mut config = SystemConfig::default();
    config.telemetry.raw_samples = true;
    let mut bench = Bench::new(config);
    bench.hold(200, 1_500);
    bench.command("START\n");
    bench.hold(200, 600);
    bench.command("STOP\n");

    let wire = bench.sink.wire();
    assert_eq!(wire.last(), Some(&b'\n'));
    for line in wire.split(|b| *b == b'\n').filter(|l| !l.is_empty()) {
        assert!(line.len() <= LINE_MAX);
        assert!(!line.contains(&b'\r'));
        assert!(line.is_ascii());
    }
    assert!(!bench.sink.lines_starting("STATUS").is_empty());
    assert!(!bench.sink.lines_starting("t=").is_empty());
}

#[test]
fn status_lines_follow_the_configured_period() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.hold(3, 3_001);

    let status = bench.sink.lines_starting("STATUS");
    let times: Vec<&str> = status
        .iter()
        .filter_map(|l| l.strip_prefix("STATUS time_ms="))
        .filter_map(|rest| rest.split(' ').next())
        .collect();
    assert_eq!(times, ["0", "1000", "2000", "3000"]);
    assert!(status[0].contains("| state=IDLE | prox=3 | confidence=0.00 | blinks=0"));
}
