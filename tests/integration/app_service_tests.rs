//! Integration tests for the AppService → pipeline / sequencer → actuators
//! chain, driven through mock adapters on a simulated 1 ms loop.

use blinkpuff::app::events::AppEvent;
use blinkpuff::config::SystemConfig;
use blinkpuff::detection::presence::PresenceState;
use blinkpuff::fsm::StateId;

use crate::mock_hw::Bench;

const LEAD_MS: u32 = 200;
const SLOT_MS: u32 = 400;
const FRAME_MS: u32 = 1600;

fn started_slots(bench: &Bench) -> [u8; 16] {
    bench
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::SequenceStarted { slots, .. } => Some(*slots),
            _ => None,
        })
        .expect("sequence started")
}

fn anchored_puff(start_ms: u32, frame: usize, slot: u8) -> u32 {
    start_ms + LEAD_MS + frame as u32 * FRAME_MS + u32::from(slot) * SLOT_MS
}

// ── Command handling ─────────────────────────────────────────

#[test]
fn second_start_is_rejected_with_one_seq_start_line() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("START\nSTART\n");

    assert_eq!(bench.sink.lines_starting("SEQ START").len(), 1);
    assert_eq!(
        bench.sink.lines_starting("SEQ REJECT"),
        vec!["SEQ REJECT time_ms=0 | reason=busy".to_string()]
    );
    assert!(bench.app.sequence_running());

    // Still busy well into the run.
    bench.run_for(5_000, 1);
    bench.command("START\n");
    assert_eq!(bench.sink.lines_starting("SEQ START").len(), 1);
    assert_eq!(bench.sink.lines_starting("SEQ REJECT").len(), 2);
}

#[test]
fn seq_start_line_lists_sixteen_slots_and_lead() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.run_for(30, 1);
    bench.command("START\r\n");

    let line = &bench.sink.lines_starting("SEQ START")[0];
    assert!(line.starts_with("SEQ START time_ms=30 | slots="), "{line}");
    assert!(line.ends_with(" | lead_ms=200"), "{line}");
    let csv = line
        .split("slots=")
        .nth(1)
        .and_then(|rest| rest.split(" | ").next())
        .unwrap();
    let slots: Vec<u8> = csv.split(',').map(|s| s.parse().unwrap()).collect();
    assert_eq!(slots.len(), 16);
    assert!(slots.iter().all(|s| *s < 4));
    assert_eq!(slots.as_slice(), started_slots(&bench).as_slice());
}

#[test]
fn garbage_and_lowercase_lines_are_ignored() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("start\nSTARTX\nthis line is far too long to fit\nSTOP\n");
    assert!(bench.sink.lines_starting("SEQ").is_empty());
    assert!(!bench.app.sequence_running());

    // The reader recovered: a clean command still works.
    bench.command("START\n");
    assert_eq!(bench.sink.lines_starting("SEQ START").len(), 1);
}

// ── Full sequence ────────────────────────────────────────────

#[test]
fn sequence_puffs_sixteen_times_on_anchored_schedule_then_ends_once() {
    let mut bench = Bench::with_seed(SystemConfig::default(), 42);
    bench.command("START\n");
    let slots = started_slots(&bench);
    bench.run_for(28_000, 1);

    let openings = bench.rig.valve_openings();
    assert_eq!(openings.len(), 16, "one puff per frame");
    for (frame, (&opened, &slot)) in openings.iter().zip(slots.iter()).enumerate() {
        let anchored = anchored_puff(0, frame, slot);
        // A slot-3 frame followed by a slot-0 frame leaves no Rest time;
        // the puff then opens a couple of loop iterations late.
        assert!(
            opened >= anchored && opened <= anchored + 3,
            "frame {frame}: opened {opened}, anchored {anchored}"
        );
    }

    let last_guard_done = anchored_puff(0, 15, slots[15]) + 50 + 350;
    assert_eq!(
        bench.sink.lines_starting("SEQ END"),
        vec![format!("SEQ END time_ms={last_guard_done}")]
    );
    assert!(!bench.app.sequence_running());
    assert_eq!(bench.app.state(), StateId::Rest);
    assert_eq!(bench.rig.duty, 0);
    assert!(!bench.rig.valve);
}

#[test]
fn pump_ramps_to_run_duty_before_a_puff() {
    let mut bench = Bench::with_seed(SystemConfig::default(), 7);
    bench.command("START\n");
    let slots = started_slots(&bench);
    // A frame with slot >= 1 always gets its full 220 ms precharge.
    let frame = slots.iter().position(|s| *s >= 1).expect("some slot above 0");
    let puff_at = anchored_puff(0, frame, slots[frame]);
    let precharge_at = puff_at - 220;
    bench.run_for(puff_at + 1, 1);

    let history = bench.rig.pump_history();
    let ramp: Vec<_> = history.iter().filter(|(t, _)| *t >= precharge_at).collect();
    // Climbs monotonically from idle and reaches the run duty 120 ms in.
    assert!(ramp.windows(2).all(|w| w[0].1 <= w[1].1));
    assert_eq!(ramp.last().map(|(_, d)| *d), Some(1000));
    assert!(ramp.iter().any(|(t, d)| *d == 1000 && *t == precharge_at + 120));
    assert!(bench.rig.valve);
}

#[test]
fn stop_cancels_and_forces_rest() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("START\n");
    bench.run_for(1_000, 1);
    let puffs_before = bench.rig.valve_openings().len();
    bench.command("STOP\n");

    assert_eq!(
        bench.sink.lines_starting("SEQ CANCEL"),
        vec!["SEQ CANCEL time_ms=1000".to_string()]
    );
    assert!(!bench.app.sequence_running());
    assert_eq!(bench.app.state(), StateId::Rest);
    assert!(!bench.rig.valve);

    bench.run_for(5_000, 1);
    assert_eq!(bench.rig.duty, 0);
    assert_eq!(bench.rig.valve_openings().len(), puffs_before);
    assert!(bench.sink.lines_starting("SEQ END").is_empty());

    // A new sequence can start after a cancel.
    bench.command("START\n");
    assert_eq!(bench.sink.lines_starting("SEQ START").len(), 2);
}

#[test]
fn stop_while_idle_emits_nothing() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.command("STOP\n");
    assert!(bench.sink.lines_starting("SEQ").is_empty());
}

// ── Detection through the loop ───────────────────────────────

#[test]
fn worn_device_reports_presence_then_one_blink() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.hold(3, 100);
    assert_eq!(bench.app.presence(), PresenceState::Idle);

    // Qualifying run starts at 100; presence is entered 40 ms later.
    bench.hold(200, 2_000);
    assert_eq!(bench.app.presence(), PresenceState::Present);
    assert!(bench.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::PresenceChanged(t) if t.to == PresenceState::Present && t.at_ms == 140
    )));

    let status = bench.sink.lines_starting("STATUS time_ms=2000");
    assert_eq!(status.len(), 1);
    assert!(status[0].contains("state=PRESENCE | prox=200 | confidence=1.00 | blinks=0"));
    assert!(status[0].ends_with("| mean=200 | sigma=1 | zRise=0.00 | zDrop=0.00"));

    bench.hold(260, 40);
    bench.hold(200, 500);

    let blinks = bench.sink.lines_starting("BLINK");
    assert_eq!(blinks.len(), 1, "{blinks:?}");
    assert!(blinks[0].starts_with("BLINK time_ms=2120 | prox=260 |"));
    assert!(blinks[0].contains("| polarity=rise | confidence="));
    assert!(blinks[0].ends_with("| blinks=1"));
    assert_eq!(bench.app.blink_count(), 1);
}

#[test]
fn idle_status_has_no_baseline_fields() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.hold(2, 1_001);
    assert_eq!(
        bench.sink.lines_starting("STATUS"),
        vec![
            "STATUS time_ms=0 | state=IDLE | prox=2 | confidence=0.00 | blinks=0".to_string(),
            "STATUS time_ms=1000 | state=IDLE | prox=2 | confidence=0.00 | blinks=0".to_string(),
        ]
    );
}

#[test]
fn raw_telemetry_is_throttled() {
    let mut config = SystemConfig::default();
    config.telemetry.raw_samples = true;
    let mut bench = Bench::new(config);
    bench.hold(42, 100);

    let raw = bench.sink.lines_starting("t=");
    assert_eq!(raw.len(), 10);
    assert_eq!(raw[0], "t=0 ms | prox=42");
    assert_eq!(raw[1], "t=10 ms | prox=42");
}

#[test]
fn sensor_glitch_skips_samples_without_dropping_presence() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.hold(200, 1_000);
    assert_eq!(bench.app.presence(), PresenceState::Present);

    bench.rig.fail_reads = true;
    bench.run_for(500, 1);
    assert_eq!(bench.app.sensor_errors(), 100);
    assert_eq!(bench.app.presence(), PresenceState::Present);

    bench.rig.fail_reads = false;
    bench.hold(200, 100);
    assert_eq!(bench.app.presence(), PresenceState::Present);
    assert_eq!(bench.app.blink_count(), 0);
}

#[test]
fn removing_device_returns_to_idle() {
    let mut bench = Bench::new(SystemConfig::default());
    bench.hold(200, 1_000);
    bench.hold(0, 400);
    assert_eq!(bench.app.presence(), PresenceState::Idle);
    assert!(bench.app.snapshot().baseline.is_none());
}
