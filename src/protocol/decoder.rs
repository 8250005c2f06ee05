//! Frame validation and fragment reassembly.
//!
//! The transport delivers notifications no larger than its MTU, so the
//! device splits a data message into several independently checksummed
//! frames whose declared payload lengths add up to [`FULL_PAYLOAD_LEN`].
//! [`FrameDecoder`] validates each chunk in isolation and concatenates the
//! fragment payloads in arrival order until a full payload is available.
//!
//! Validation order per chunk:
//!
//! 1. at least [`MIN_FRAME_LEN`] bytes
//! 2. trailing checksum (always before anything else)
//! 3. sync bytes and class/id
//! 4. declared length fits inside the chunk
//! 5. full payload, or fragment appended to the reassembly buffer

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use super::frame::{
    FULL_PAYLOAD_LEN, MIN_FRAME_LEN, declared_length, has_valid_start, payload_slice,
    verify_checksum,
};
use super::payload::Payload;

/// Why a chunk produced no output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    #[error("chunk of {len} bytes is shorter than a frame")]
    Truncated { len: usize },

    #[error("checksum-invalid")]
    ChecksumInvalid,

    #[error("frame-start-invalid")]
    FrameStartInvalid,

    #[error("declared payload of {declared} bytes exceeds the {available} bytes received")]
    LengthMismatch { declared: usize, available: usize },

    #[error("fragment of {declared} bytes overflows {pending} pending bytes")]
    LengthOverflow { pending: usize, declared: usize },
}

/// Outcome of submitting one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    Rejected(RejectReason),
    /// Fragment accepted, payload not complete yet.
    Incomplete,
    Complete(Payload),
}

impl FrameResult {
    pub fn is_complete(&self) -> bool {
        matches!(self, FrameResult::Complete(_))
    }

    pub fn into_payload(self) -> Option<Payload> {
        match self {
            FrameResult::Complete(payload) => Some(payload),
            _ => None,
        }
    }
}

/// What to do with pending fragments when a full-length frame arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingPolicy {
    /// Leave them in place; a later fragment may still complete the sequence.
    #[default]
    Keep,
    /// Drop them.
    Discard,
}

/// Reassembly policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    pub pending_on_full_frame: PendingPolicy,
    /// Pending fragments older than this are dropped before a new one is
    /// appended. `None` keeps them until the sequence completes.
    pub fragment_timeout: Option<Duration>,
}

/// Running totals kept by a decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeCounters {
    /// Payloads emitted, whether from one frame or reassembled.
    pub complete: u64,
    /// Fragments accepted into the reassembly buffer.
    pub fragments: u64,
    /// Payloads assembled from fragments.
    pub reassembled: u64,
    pub truncated: u64,
    pub checksum_invalid: u64,
    pub frame_start_invalid: u64,
    pub length_mismatch: u64,
    pub length_overflow: u64,
    /// Fragments dropped by the timeout or pending policies.
    pub fragments_dropped: u64,
}

impl DecodeCounters {
    /// Total chunks that produced a rejection.
    pub fn rejected(&self) -> u64 {
        self.truncated
            + self.checksum_invalid
            + self.frame_start_invalid
            + self.length_mismatch
            + self.length_overflow
    }

    fn record_reject(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Truncated { .. } => self.truncated += 1,
            RejectReason::ChecksumInvalid => self.checksum_invalid += 1,
            RejectReason::FrameStartInvalid => self.frame_start_invalid += 1,
            RejectReason::LengthMismatch { .. } => self.length_mismatch += 1,
            RejectReason::LengthOverflow { .. } => self.length_overflow += 1,
        }
    }
}

#[derive(Debug, Clone)]
struct Fragment {
    payload: Vec<u8>,
    received_at: Instant,
}

/// Payload fragments of one in-progress message, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ReassemblyBuffer {
    fragments: Vec<Fragment>,
}

impl ReassemblyBuffer {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of buffered fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Sum of buffered payload lengths, recomputed from the fragments.
    pub fn buffered_len(&self) -> usize {
        self.fragments.iter().map(|f| f.payload.len()).sum()
    }

    fn push(&mut self, payload: &[u8], received_at: Instant) {
        self.fragments.push(Fragment { payload: payload.to_vec(), received_at });
    }

    /// Drop everything, returning how many fragments were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.fragments.len();
        self.fragments.clear();
        dropped
    }

    /// Drop the whole sequence if its first fragment is older than `timeout`.
    fn evict_stale(&mut self, now: Instant, timeout: Duration) -> usize {
        match self.fragments.first() {
            Some(oldest) if now.saturating_duration_since(oldest.received_at) >= timeout => {
                self.clear()
            }
            _ => 0,
        }
    }

    /// Concatenate and clear once exactly one payload is buffered.
    fn take_payload(&mut self) -> Option<Payload> {
        if self.buffered_len() != FULL_PAYLOAD_LEN {
            return None;
        }
        let mut bytes = [0u8; FULL_PAYLOAD_LEN];
        let mut cursor = 0;
        for fragment in self.fragments.drain(..) {
            bytes[cursor..cursor + fragment.payload.len()].copy_from_slice(&fragment.payload);
            cursor += fragment.payload.len();
        }
        Some(Payload::new(bytes))
    }
}

/// Stateful decoder for one device's notification stream.
///
/// Not shared: one decoder per connection, fed in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    options: DecoderOptions,
    buffer: ReassemblyBuffer,
    counters: DecodeCounters,
}

impl FrameDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self { options, ..Self::default() }
    }

    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    pub fn counters(&self) -> DecodeCounters {
        self.counters
    }

    /// Fragments waiting for the rest of their message.
    pub fn pending(&self) -> &ReassemblyBuffer {
        &self.buffer
    }

    /// Discard any in-progress reassembly.
    pub fn reset(&mut self) {
        let dropped = self.buffer.clear();
        self.counters.fragments_dropped += dropped as u64;
    }

    /// Submit one chunk as received from the transport.
    pub fn submit(&mut self, chunk: &[u8]) -> FrameResult {
        self.submit_at(chunk, Instant::now())
    }

    /// Submit one chunk with an explicit arrival time.
    pub fn submit_at(&mut self, chunk: &[u8], now: Instant) -> FrameResult {
        trace!(len = chunk.len(), "chunk received");

        if chunk.len() < MIN_FRAME_LEN {
            return self.reject(RejectReason::Truncated { len: chunk.len() });
        }
        if !verify_checksum(chunk) {
            return self.reject(RejectReason::ChecksumInvalid);
        }
        if !has_valid_start(chunk) {
            return self.reject(RejectReason::FrameStartInvalid);
        }
        let Some(payload) = payload_slice(chunk) else {
            let declared = declared_length(chunk).unwrap_or_default();
            return self.reject(RejectReason::LengthMismatch {
                declared,
                available: chunk.len() - MIN_FRAME_LEN,
            });
        };

        if let Ok(bytes) = <[u8; FULL_PAYLOAD_LEN]>::try_from(payload) {
            if !self.buffer.is_empty() && self.options.pending_on_full_frame == PendingPolicy::Discard
            {
                let dropped = self.buffer.clear();
                self.counters.fragments_dropped += dropped as u64;
                debug!(dropped, "full frame arrived, discarding pending fragments");
            }
            self.counters.complete += 1;
            return FrameResult::Complete(Payload::new(bytes));
        }

        self.accept_fragment(payload, now)
    }

    fn accept_fragment(&mut self, payload: &[u8], now: Instant) -> FrameResult {
        // Contributes nothing to the concatenation; never buffered
        if payload.is_empty() {
            trace!("empty fragment ignored");
            return FrameResult::Incomplete;
        }

        if let Some(timeout) = self.options.fragment_timeout {
            let dropped = self.buffer.evict_stale(now, timeout);
            if dropped > 0 {
                self.counters.fragments_dropped += dropped as u64;
                debug!(dropped, ?timeout, "evicted stale fragments");
            }
        }

        let pending = self.buffer.buffered_len();
        if pending + payload.len() > FULL_PAYLOAD_LEN {
            let dropped = self.buffer.clear();
            self.counters.fragments_dropped += dropped as u64;
            return self.reject(RejectReason::LengthOverflow { pending, declared: payload.len() });
        }

        self.buffer.push(payload, now);
        self.counters.fragments += 1;
        debug!(
            fragment_len = payload.len(),
            buffered = self.buffer.buffered_len(),
            fragments = self.buffer.len(),
            "fragment buffered"
        );

        match self.buffer.take_payload() {
            Some(payload) => {
                self.counters.complete += 1;
                self.counters.reassembled += 1;
                debug!("payload reassembled from fragments");
                FrameResult::Complete(payload)
            }
            None => FrameResult::Incomplete,
        }
    }

    fn reject(&mut self, reason: RejectReason) -> FrameResult {
        self.counters.record_reject(reason);
        debug!(%reason, pending = self.buffer.buffered_len(), "chunk rejected");
        FrameResult::Rejected(reason)
    }
}
