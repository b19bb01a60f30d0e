//! Trace-driven request sources.
//!
//! A trace is a text file with one request per line:
//!
//! ```text
//! # tick  port  op  addr    size | data
//! 0       0     R   0x1000  8
//! 2000    0     W   0x1004  deadbeef
//! ```
//!
//! `R` lines read `size` bytes; `W` lines write the hex-encoded bytes. Numbers
//! are decimal or `0x`-prefixed hex. Blank lines and `#` comments are skipped.
//!
//! Each port is driven by one [`TrafficGen`], which keeps at most one request
//! outstanding and issues the next one once the previous has completed and
//! its trace tick has been reached.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::cache::port::PortId;
use crate::common::{Addr, MemCmd, Packet, Tick};

/// Trace loading errors.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("cannot read trace {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A line does not have five fields.
    #[error("line {line}: expected `<tick> <port> R|W <addr> <size|hexdata>`")]
    Malformed {
        /// One-based line number.
        line: usize,
    },
    /// A numeric field does not parse.
    #[error("line {line}: invalid number {text:?}")]
    BadNumber {
        /// One-based line number.
        line: usize,
        /// Offending field.
        text: String,
    },
    /// The operation is neither `R` nor `W`.
    #[error("line {line}: unknown operation {op:?}")]
    UnknownOp {
        /// One-based line number.
        line: usize,
        /// Offending field.
        op: String,
    },
    /// Write data is not an even-length hex string.
    #[error("line {line}: invalid hex data {text:?}")]
    BadHex {
        /// One-based line number.
        line: usize,
        /// Offending field.
        text: String,
    },
    /// A read or write of zero bytes.
    #[error("line {line}: zero-sized access")]
    Empty {
        /// One-based line number.
        line: usize,
    },
}

/// Kind of a trace request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceOpKind {
    /// Read of `size` bytes.
    Read {
        /// Bytes to read.
        size: usize,
    },
    /// Write of the given bytes.
    Write {
        /// Bytes to write.
        data: Vec<u8>,
    },
}

/// One trace line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceOp {
    /// Earliest tick at which the request may issue.
    pub tick: Tick,
    /// CPU-side port that issues it.
    pub port: PortId,
    /// First byte accessed.
    pub addr: Addr,
    /// Read or write.
    pub kind: TraceOpKind,
    /// One-based line number in the trace.
    pub line: usize,
}

impl TraceOp {
    /// Returns the access size in bytes.
    pub fn size(&self) -> usize {
        match &self.kind {
            TraceOpKind::Read { size } => *size,
            TraceOpKind::Write { data } => data.len(),
        }
    }

    /// Builds the request packet for this line.
    pub fn to_packet(&self, req_id: u64) -> Packet {
        match &self.kind {
            TraceOpKind::Read { size } => Packet::read(req_id, self.addr, *size),
            TraceOpKind::Write { data } => Packet::write(req_id, self.addr, data.clone()),
        }
    }
}

/// Parses trace text.
///
/// # Errors
///
/// Returns the first malformed line.
pub fn parse_trace(text: &str) -> Result<Vec<TraceOp>, TraceError> {
    let mut ops = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let fields: Vec<&str> = content.split_whitespace().collect();
        let &[tick, port, op, addr, last] = fields.as_slice() else {
            return Err(TraceError::Malformed { line });
        };
        let tick = parse_number(tick, line)?;
        let port = parse_number(port, line)? as PortId;
        let addr = parse_number(addr, line)?;
        let kind = match op {
            "R" | "r" => TraceOpKind::Read {
                size: parse_number(last, line)? as usize,
            },
            "W" | "w" => TraceOpKind::Write {
                data: parse_hex(last, line)?,
            },
            other => {
                return Err(TraceError::UnknownOp {
                    line,
                    op: other.to_string(),
                });
            }
        };
        let op = TraceOp {
            tick,
            port,
            addr,
            kind,
            line,
        };
        if op.size() == 0 {
            return Err(TraceError::Empty { line });
        }
        ops.push(op);
    }
    Ok(ops)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_trace`].
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<TraceOp>, TraceError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(&text)
}

fn parse_number(text: &str, line: usize) -> Result<u64, TraceError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|_| TraceError::BadNumber {
        line,
        text: text.to_string(),
    })
}

fn parse_hex(text: &str, line: usize) -> Result<Vec<u8>, TraceError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let bad = || TraceError::BadHex {
        line,
        text: text.to_string(),
    };
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return Err(bad());
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad()))
        .collect()
}

/// A finished request as seen by its source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Port that issued the request.
    pub port: PortId,
    /// Request id.
    pub req_id: u64,
    /// Response command.
    pub cmd: MemCmd,
    /// First byte accessed.
    pub addr: Addr,
    /// Response payload.
    pub data: Vec<u8>,
    /// Tick the request was first offered.
    pub issued: Tick,
    /// Tick the response arrived.
    pub completed: Tick,
}

/// Request source for one CPU-side port.
#[derive(Debug)]
pub struct TrafficGen {
    port: PortId,
    pending: VecDeque<TraceOp>,
    outstanding: Option<(u64, Tick)>,
    refused: Option<(Packet, Tick)>,
    next_seq: u64,
    refusals: u64,
    completions: Vec<Completion>,
}

impl TrafficGen {
    /// Creates the source for `port`, issuing `ops` in order.
    pub fn new(port: PortId, ops: impl IntoIterator<Item = TraceOp>) -> Self {
        Self {
            port,
            pending: ops.into_iter().collect(),
            outstanding: None,
            refused: None,
            next_seq: 1,
            refusals: 0,
            completions: Vec::new(),
        }
    }

    /// Returns the port this source drives.
    pub const fn port(&self) -> PortId {
        self.port
    }

    /// Returns the tick the next request may issue at, if the source is
    /// free to issue one.
    pub fn next_issue_tick(&self) -> Option<Tick> {
        if self.is_waiting() {
            return None;
        }
        self.pending.front().map(|op| op.tick)
    }

    /// Returns `true` while a request is outstanding or refused.
    pub const fn is_waiting(&self) -> bool {
        self.outstanding.is_some() || self.refused.is_some()
    }

    /// Returns `true` once every request has completed.
    pub fn is_done(&self) -> bool {
        !self.is_waiting() && self.pending.is_empty()
    }

    /// Returns how often the cache refused this source.
    pub const fn refusals(&self) -> u64 {
        self.refusals
    }

    /// Returns the finished requests, in completion order.
    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Takes the next request to send at `now`: the refused one if any,
    /// otherwise the next trace line.
    pub fn take_request(&mut self, now: Tick) -> Option<Packet> {
        if let Some((pkt, issued)) = self.refused.take() {
            self.outstanding = Some((pkt.req_id(), issued));
            return Some(pkt);
        }
        if self.outstanding.is_some() {
            return None;
        }
        let op = self.pending.pop_front()?;
        let req_id = ((self.port as u64 + 1) << 32) | self.next_seq;
        self.next_seq += 1;
        self.outstanding = Some((req_id, now));
        Some(op.to_packet(req_id))
    }

    /// Hands back a request the cache refused; it is resent on retry.
    pub fn refused(&mut self, pkt: Packet) {
        let issued = self.outstanding.take().map_or(0, |(_, tick)| tick);
        self.refusals += 1;
        self.refused = Some((pkt, issued));
    }

    /// Returns `true` if a refused request is waiting for a retry.
    pub const fn has_refused(&self) -> bool {
        self.refused.is_some()
    }

    /// Records the response to the outstanding request.
    ///
    /// Returns `false` if the response does not match it.
    pub fn complete(&mut self, pkt: Packet, now: Tick) -> bool {
        match self.outstanding {
            Some((req_id, issued)) if req_id == pkt.req_id() => {
                self.outstanding = None;
                self.completions.push(Completion {
                    port: self.port,
                    req_id,
                    cmd: pkt.cmd(),
                    addr: pkt.addr(),
                    issued,
                    completed: now,
                    data: pkt.into_data(),
                });
                true
            }
            _ => false,
        }
    }
}
