//! Device → host line rendering.
//!
//! ```text
//! t=<ms> ms | prox=<count>
//! STATUS time_ms=<ms> | state=<IDLE|PRESENCE> | prox=<n> | confidence=<f> | blinks=<n>[ | mean=<i> | sigma=<i> | zRise=<f> | zDrop=<f>]
//! BLINK time_ms=<ms> | prox=<n> | mean=<i> | sigma=<i> | zRise=<f> | zDrop=<f> | polarity=<rise|dip> | confidence=<f> | blinks=<n>
//! SEQ START time_ms=<ms> | slots=<s0,…,s15> | lead_ms=<ms>
//! SEQ END time_ms=<ms>
//! SEQ CANCEL time_ms=<ms>
//! SEQ REJECT time_ms=<ms> | reason=<busy|idle>
//! ```
//!
//! Floats carry two decimals; mean and sigma are rounded to integers.
//! Lines are returned without the trailing newline.

use core::fmt::Write;

use heapless::String;

use crate::app::events::AppEvent;
use crate::detection::DetectionSnapshot;
use crate::detection::blink::BlinkEvent;

/// Capacity of one rendered line.
pub const LINE_MAX: usize = 192;

pub type Line = String<LINE_MAX>;

/// Render `event` as a protocol line, or `None` when it has no wire form.
pub fn format_event(event: &AppEvent) -> Option<Line> {
    let mut line = Line::new();
    let written = match event {
        AppEvent::RawSample { time_ms, prox } => write!(line, "t={time_ms} ms | prox={prox}"),
        AppEvent::Status { time_ms, snapshot } => write_status(&mut line, *time_ms, snapshot),
        AppEvent::Blink(blink) => write_blink(&mut line, blink),
        AppEvent::SequenceStarted {
            time_ms,
            slots,
            lead_ms,
        } => write_seq_start(&mut line, *time_ms, slots, *lead_ms),
        AppEvent::SequenceEnded { time_ms } => write!(line, "SEQ END time_ms={time_ms}"),
        AppEvent::SequenceCancelled { time_ms } => write!(line, "SEQ CANCEL time_ms={time_ms}"),
        AppEvent::SequenceRejected { time_ms, reason } => write!(
            line,
            "SEQ REJECT time_ms={time_ms} | reason={}",
            reason.reason()
        ),
        AppEvent::PresenceChanged(_) | AppEvent::ActuatorChanged { .. } => return None,
    };
    // Every line fits LINE_MAX; a formatting error means a truncated line,
    // which is dropped rather than sent half-written.
    written.ok().map(|_| line)
}

fn write_status(line: &mut Line, time_ms: u32, s: &DetectionSnapshot) -> core::fmt::Result {
    write!(
        line,
        "STATUS time_ms={time_ms} | state={} | prox={} | confidence={:.2} | blinks={}",
        s.presence.label(),
        s.raw,
        s.confidence,
        s.blinks
    )?;
    if let Some(b) = s.baseline {
        write!(
            line,
            " | mean={} | sigma={} | zRise={:.2} | zDrop={:.2}",
            round(b.mean),
            round(b.sigma),
            centi(b.z.rise),
            centi(b.z.dip)
        )?;
    }
    Ok(())
}

fn write_blink(line: &mut Line, b: &BlinkEvent) -> core::fmt::Result {
    write!(
        line,
        "BLINK time_ms={} | prox={} | mean={} | sigma={} | zRise={:.2} | zDrop={:.2} | polarity={} | confidence={:.2} | blinks={}",
        b.time_ms,
        b.raw,
        round(b.mean),
        round(b.sigma),
        centi(b.z.rise),
        centi(b.z.dip),
        b.polarity.label(),
        b.confidence,
        b.count
    )
}

fn write_seq_start(line: &mut Line, time_ms: u32, slots: &[u8], lead_ms: u32) -> core::fmt::Result {
    write!(line, "SEQ START time_ms={time_ms} | slots=")?;
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            line.push(',').map_err(|_| core::fmt::Error)?;
        }
        write!(line, "{slot}")?;
    }
    write!(line, " | lead_ms={lead_ms}")
}

fn round(x: f32) -> i32 {
    x.round() as i32
}

/// Values that print as zero at two decimals print as `0.00`, never `-0.00`.
fn centi(x: f32) -> f32 {
    if x.abs() < 0.005 { 0.0 } else { x }
}
