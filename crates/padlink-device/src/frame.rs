// ── Inbound frame decoder ──
//
// The panel's protocol is unversioned and loosely structured: most
// firmware revisions emit JSON records, older ones emit `led=VALUE`
// text, and at least one emits the bare 9-digit LED value. The decoder
// tries each shape in order; an undecodable chunk is dropped, never an
// error.

use serde::Deserialize;

use crate::led::LedValue;

/// A single button edge decoded from the wire. `index` is 0-based;
/// wire labels are 1-based ("Key 1" .. "Key 10").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    pub index: usize,
    pub pressed: bool,
}

/// One decoded frame: at most one LED update plus any number of
/// button edges, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceFrame {
    pub led: Option<LedValue>,
    pub edges: Vec<ButtonEdge>,
}

impl DeviceFrame {
    pub fn is_empty(&self) -> bool {
        self.led.is_none() && self.edges.is_empty()
    }
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(default)]
    led: Option<String>,
    #[serde(default)]
    events: Option<Vec<WireEvent>>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    label: String,
    state: String,
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Decode one received chunk. Returns `None` when nothing usable was
/// found; the caller treats that as noise, not as a protocol error.
pub fn decode_frame(chunk: &[u8]) -> Option<DeviceFrame> {
    let text = String::from_utf8_lossy(chunk);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // 1. Structured record with optional `led` / `events` fields.
    if let Ok(record) = serde_json::from_str::<WireRecord>(text) {
        let frame = decode_record(record);
        if !frame.is_empty() {
            return Some(frame);
        }
        // A JSON-valid record that carries nothing useful falls
        // through to the text forms; some firmwares wrap `led=` text
        // in stray braces.
    }

    // 2. Loose text containing `led=VALUE`.
    if let Some(at) = text.find("led=") {
        let rest = &text[at + "led=".len()..];
        let value = rest
            .split(|c: char| c.is_whitespace() || c == ',' || c == '}' || c == '"')
            .next()
            .unwrap_or("");
        if let Some(led) = LedValue::parse(value) {
            return Some(DeviceFrame {
                led: Some(led),
                edges: Vec::new(),
            });
        }
    }

    // 3. Bare 9-digit LED value.
    if text.len() == 9 && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(led) = LedValue::parse(text) {
            return Some(DeviceFrame {
                led: Some(led),
                edges: Vec::new(),
            });
        }
    }

    tracing::trace!(chunk = %text, "undecodable device frame, dropping");
    None
}

fn decode_record(record: WireRecord) -> DeviceFrame {
    let led = record.led.as_deref().and_then(LedValue::parse);

    let mut edges = Vec::new();
    for event in record.events.unwrap_or_default() {
        match parse_label(&event.label) {
            Some(index) => edges.push(ButtonEdge {
                index,
                pressed: event.state == "1",
            }),
            // A malformed label skips that one event, not the batch.
            None => {
                tracing::trace!(label = %event.label, "unparseable button label, skipping event");
            }
        }
    }

    DeviceFrame { led, edges }
}

/// Map a wire label ("Key 3", "button 10", ...) to a 0-based button
/// index via its trailing numeric token.
fn parse_label(label: &str) -> Option<usize> {
    let number: usize = label.split_whitespace().next_back()?.parse().ok()?;
    number.checked_sub(1)
}

// ── Tests ────────────────────────────────────────────────────────────
