//! ASCII line frame codec.
//!
//! Wire format:
//! ```text
//! ┌──────────┬───┬──────────────────────────┬────────────┐
//! │ TAG      │ : │ field,field,field        │ \r and/or \n│
//! └──────────┴───┴──────────────────────────┴────────────┘
//! ```
//!
//! The streaming [`FrameDecoder`] accumulates incoming bytes and yields a
//! decoded item per complete line.  A single transport read may return part
//! of a line, several lines, or a line split across its terminator pair.
//! This is the only place protocol strings are built or parsed.

use heapless::Vec as HVec;
use log::{debug, warn};

use super::frame::{
    AdcData, Command, Frame, RawFrame, TAG_ACK, TAG_ADC_DATA, TAG_HEARTBEAT, TAG_PONG,
    TAG_SYSTEM_STATUS, TAG_TRANSMISSION, TransmissionStatus, enabled_flag, parse_enabled_flag,
};
use crate::error::{ParseError, ParseErrorKind};

/// Longest line the decoder will buffer (protects against a missing terminator).
pub const MAX_LINE_LEN: usize = 256;

/// Terminator appended to every outbound line.
pub const LINE_TERMINATOR: &str = "\r\n";

const TAG_SEPARATOR: char = ':';
const FIELD_SEPARATOR: char = ',';

// ═══════════════════════════════════════════════════════════════
//  Encoding
// ═══════════════════════════════════════════════════════════════

/// Join a tag and its fields into one line (no terminator).
pub fn encode<S: AsRef<str>>(tag: &str, fields: &[S]) -> String {
    let mut line = String::from(tag);
    for (i, field) in fields.iter().enumerate() {
        line.push(if i == 0 { TAG_SEPARATOR } else { FIELD_SEPARATOR });
        line.push_str(field.as_ref());
    }
    line
}

/// Render a typed frame as a line (no terminator).
pub fn encode_frame(frame: &Frame) -> String {
    match frame {
        Frame::AdcData(d) => {
            let raw = d.raw.to_string();
            let voltage = format!("{:.3}", d.voltage);
            match d.timestamp_ms {
                Some(ts) => encode(TAG_ADC_DATA, &[raw, voltage, ts.to_string()]),
                None => encode(TAG_ADC_DATA, &[raw, voltage]),
            }
        }
        Frame::SystemStatus { status, enabled } => match enabled {
            Some(flag) => encode(TAG_SYSTEM_STATUS, &[status.as_str(), enabled_flag(*flag)]),
            None => encode(TAG_SYSTEM_STATUS, &[status.as_str()]),
        },
        Frame::Transmission(status) => encode(TAG_TRANSMISSION, &[status.as_str()]),
        Frame::Heartbeat(text) => encode(TAG_HEARTBEAT, &[text.as_str()]),
        Frame::Pong => TAG_PONG.to_string(),
        Frame::Ack(token) => encode(TAG_ACK, &[token.as_str()]),
        Frame::Command(cmd) => encode_command(cmd),
        Frame::ModuleAck(line) | Frame::Other(line) => line.clone(),
    }
}

/// Render an outbound command.  Free text is passed through untouched.
pub fn encode_command(cmd: &Command) -> String {
    cmd.as_token().to_string()
}

/// Append the line terminator, producing the bytes to hand to a transport.
pub fn to_wire(line: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
    bytes.extend_from_slice(line.as_bytes());
    bytes.extend_from_slice(LINE_TERMINATOR.as_bytes());
    bytes
}

// ═══════════════════════════════════════════════════════════════
//  Decoding
// ═══════════════════════════════════════════════════════════════

/// Split a line into its tag and comma-separated fields.
///
/// A line without `:` is a bare tag with no fields.
pub fn split_line(line: &str) -> RawFrame {
    match line.split_once(TAG_SEPARATOR) {
        Some((tag, payload)) if !payload.is_empty() => RawFrame {
            tag: tag.to_string(),
            fields: payload.split(FIELD_SEPARATOR).map(str::to_string).collect(),
        },
        Some((tag, _)) => RawFrame {
            tag: tag.to_string(),
            fields: Vec::new(),
        },
        None => RawFrame {
            tag: line.to_string(),
            fields: Vec::new(),
        },
    }
}

/// Radio-module housekeeping: `OK`, `OK+...`, `+...`, `AT...`.
pub fn is_module_ack(line: &str) -> bool {
    line == "OK" || line.starts_with("OK+") || line.starts_with('+') || line.starts_with("AT")
}

/// Decode one line.
///
/// Returns `Ok(None)` for blank lines.  Module housekeeping decodes to
/// [`Frame::ModuleAck`] and unknown tags to [`Frame::Other`]; only a
/// malformed payload on a known tag is an error.
pub fn decode(line: &str) -> Result<Option<Frame>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if is_module_ack(line) {
        return Ok(Some(Frame::ModuleAck(line.to_string())));
    }

    let (tag, payload) = match line.split_once(TAG_SEPARATOR) {
        Some((tag, payload)) => (tag, Some(payload)),
        None => (line, None),
    };
    let raw = split_line(line);

    let frame = match tag {
        TAG_ADC_DATA => Frame::AdcData(decode_adc_data(line, &raw.fields)?),
        TAG_SYSTEM_STATUS => {
            let status = raw.fields.first().ok_or_else(|| {
                ParseError::new(
                    line,
                    ParseErrorKind::FieldCount {
                        min: 1,
                        max: 2,
                        got: 0,
                    },
                )
            })?;
            Frame::SystemStatus {
                status: status.trim().to_string(),
                enabled: raw.fields.get(1).and_then(|f| parse_enabled_flag(f.trim())),
            }
        }
        TAG_TRANSMISSION => {
            let [status] = raw.fields.as_slice() else {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::FieldCount {
                        min: 1,
                        max: 1,
                        got: raw.fields.len(),
                    },
                ));
            };
            let status = TransmissionStatus::parse(status.trim())
                .ok_or_else(|| ParseError::new(line, ParseErrorKind::UnknownStatus))?;
            Frame::Transmission(status)
        }
        TAG_HEARTBEAT => Frame::Heartbeat(payload.unwrap_or_default().to_string()),
        TAG_ACK => Frame::Ack(payload.unwrap_or_default().to_string()),
        TAG_PONG if payload.is_none() => Frame::Pong,
        _ => match (payload, Command::from_token(tag)) {
            (None, Some(cmd)) => Frame::Command(cmd),
            _ => Frame::Other(line.to_string()),
        },
    };
    Ok(Some(frame))
}

fn decode_adc_data(line: &str, fields: &[String]) -> Result<AdcData, ParseError> {
    if !(2..=3).contains(&fields.len()) {
        return Err(ParseError::new(
            line,
            ParseErrorKind::FieldCount {
                min: 2,
                max: 3,
                got: fields.len(),
            },
        ));
    }
    let invalid = |field| ParseError::new(line, ParseErrorKind::InvalidNumber { field });

    let raw = fields[0].trim().parse::<u16>().map_err(|_| invalid(0))?;
    let voltage = fields[1]
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(1))?;
    let timestamp_ms = match fields.get(2) {
        Some(ts) => Some(ts.trim().parse::<u64>().map_err(|_| invalid(2))?),
        None => None,
    };

    Ok(AdcData {
        raw,
        voltage,
        timestamp_ms,
    })
}

// ═══════════════════════════════════════════════════════════════
//  Streaming decoder
// ═══════════════════════════════════════════════════════════════

/// Decoder state machine.
enum DecoderState {
    /// Accumulating bytes of the current line.
    Collecting,
    /// The current line overflowed; skipping to the next terminator.
    Discarding,
}

/// Counters kept by the streaming decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Complete non-blank lines seen.
    pub lines: u32,
    /// Lines dropped for exceeding [`MAX_LINE_LEN`].
    pub overflows: u32,
}

/// Streaming line decoder.
pub struct FrameDecoder {
    state: DecoderState,
    line_buf: HVec<u8, MAX_LINE_LEN>,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            line_buf: HVec::new(),
            stats: DecoderStats::default(),
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// `on_item` is called once per complete non-blank line, in order, with
    /// either the decoded frame or the parse error.  Bytes after the last
    /// terminator stay buffered for the next call.
    pub fn feed(&mut self, data: &[u8], mut on_item: impl FnMut(Result<Frame, ParseError>)) {
        for &byte in data {
            let terminator = byte == b'\n' || byte == b'\r';
            match self.state {
                DecoderState::Collecting => {
                    if terminator {
                        if let Some(item) = self.finish_line() {
                            on_item(item);
                        }
                    } else if self.line_buf.push(byte).is_err() {
                        warn!("Decoder: line exceeds {} bytes, discarding", MAX_LINE_LEN);
                        self.stats.overflows += 1;
                        self.line_buf.clear();
                        self.state = DecoderState::Discarding;
                    }
                }
                DecoderState::Discarding => {
                    if terminator {
                        self.state = DecoderState::Collecting;
                    }
                }
            }
        }
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.line_buf.clear();
        self.state = DecoderState::Collecting;
    }

    /// Drop the partial line and skip to the next terminator.  Used when
    /// bytes between the last feed and the next one were lost, so the next
    /// bytes may start mid-line.
    pub fn resync(&mut self) {
        self.line_buf.clear();
        self.state = DecoderState::Discarding;
    }

    /// Bytes of an unterminated line currently buffered.
    pub fn pending_len(&self) -> usize {
        self.line_buf.len()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn finish_line(&mut self) -> Option<Result<Frame, ParseError>> {
        if self.line_buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.line_buf).into_owned();
        self.line_buf.clear();

        match decode(&line) {
            Ok(Some(frame)) => {
                self.stats.lines += 1;
                Some(Ok(frame))
            }
            Ok(None) => None,
            Err(e) => {
                self.stats.lines += 1;
                debug!("Decoder: {}", e);
                Some(Err(e))
            }
        }
    }
}
