//! W3C Trace Context propagation.
//!
//! # Wire Format
//! ```text
//! traceparent: 00-{32 hex trace_id}-{16 hex span_id}-{2 hex flags}
//! tracestate:  k1=v1,k2=v2          (baggage, optional)
//! ```
//!
//! # Design Decisions
//! - Parsing never fails loudly: any malformed header yields `None` so the
//!   caller can start a fresh root trace instead
//! - A parsed context describes the *remote* span; starting a trace from it
//!   mints the local child span id
//! - Baggage is kept in a sorted map so `tracestate` output is stable

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

const SAMPLED_FLAG: u8 = 0x01;

/// Propagation token carried across process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// 32 lowercase hex chars.
    pub trace_id: String,
    /// 16 lowercase hex chars.
    pub span_id: String,
    pub parent_span_id: Option<String>,
    /// Head sampling decision; governs downstream propagation.
    pub sampled: bool,
    pub baggage: BTreeMap<String, String>,
}

impl TraceContext {
    /// Start a brand-new trace.
    pub fn new_root(sampled: bool) -> Self {
        Self {
            trace_id: generate_trace_id(),
            span_id: generate_span_id(),
            parent_span_id: None,
            sampled,
            baggage: BTreeMap::new(),
        }
    }

    /// Context for a child of this span: same trace, fresh span id.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: generate_span_id(),
            parent_span_id: Some(self.span_id.clone()),
            sampled: self.sampled,
            baggage: self.baggage.clone(),
        }
    }

    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }

    /// `traceparent` header value.
    pub fn traceparent(&self) -> String {
        let flags = if self.sampled { SAMPLED_FLAG } else { 0 };
        format!("00-{}-{}-{:02x}", self.trace_id, self.span_id, flags)
    }

    /// `tracestate` header value, or `None` without baggage.
    ///
    /// Entries whose key or value would break the `k=v,k=v` framing are skipped.
    pub fn tracestate(&self) -> Option<String> {
        let members: Vec<String> = self
            .baggage
            .iter()
            .filter(|(k, v)| is_encodable(k) && is_encodable(v) && !k.is_empty())
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        if members.is_empty() {
            None
        } else {
            Some(members.join(","))
        }
    }

    /// Encode as outgoing request headers.
    pub fn to_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(TRACEPARENT_HEADER.to_string(), self.traceparent());
        if let Some(state) = self.tracestate() {
            headers.insert(TRACESTATE_HEADER.to_string(), state);
        }
        headers
    }

    /// Decode from incoming request headers. Header names match case-insensitively.
    pub fn from_headers(headers: &HashMap<String, String>) -> Option<Self> {
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };
        Self::parse(lookup(TRACEPARENT_HEADER)?, lookup(TRACESTATE_HEADER))
    }

    /// Decode from raw header values.
    pub fn parse(traceparent: &str, tracestate: Option<&str>) -> Option<Self> {
        let (trace_id, span_id, sampled) = parse_traceparent(traceparent)?;
        Some(Self {
            trace_id,
            span_id,
            parent_span_id: None,
            sampled,
            baggage: tracestate.map(parse_tracestate).unwrap_or_default(),
        })
    }
}

fn parse_traceparent(value: &str) -> Option<(String, String, bool)> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() != 4 {
        return None;
    }
    let (version, trace_id, span_id, flags) = (parts[0], parts[1], parts[2], parts[3]);

    // "ff" is reserved as an invalid version
    if !is_hex(version, 2) || version.eq_ignore_ascii_case("ff") {
        return None;
    }
    if !is_hex(trace_id, 32) || is_all_zero(trace_id) {
        return None;
    }
    if !is_hex(span_id, 16) || is_all_zero(span_id) {
        return None;
    }
    if !is_hex(flags, 2) {
        return None;
    }
    let flags = u8::from_str_radix(flags, 16).ok()?;

    Some((
        trace_id.to_ascii_lowercase(),
        span_id.to_ascii_lowercase(),
        flags & SAMPLED_FLAG != 0,
    ))
}

/// Malformed members are skipped one by one.
fn parse_tracestate(value: &str) -> BTreeMap<String, String> {
    value
        .split(',')
        .filter_map(|member| {
            let (k, v) = member.trim().split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

fn is_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

fn is_encodable(s: &str) -> bool {
    !s.contains([',', '='])
}

/// Random non-zero 128-bit id as 32 hex chars.
pub fn generate_trace_id() -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: u128 = rng.gen();
        if id != 0 {
            return format!("{id:032x}");
        }
    }
}

/// Random non-zero 64-bit id as 16 hex chars.
pub fn generate_span_id() -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: u64 = rng.gen();
        if id != 0 {
            return format!("{id:016x}");
        }
    }
}
