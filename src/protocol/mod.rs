//! RaceBox binary protocol.
//!
//! Two stages, leaf first:
//!
//! - [`FrameDecoder`] validates raw notification chunks and reassembles
//!   fragments into a complete 80-byte [`Payload`]
//! - [`interpret`] converts a payload into a
//!   [`TelemetryRecord`](crate::TelemetryRecord)
//!
//! ```rust
//! use racebox::protocol::{FrameDecoder, FrameResult, encode_frame, interpret};
//!
//! let payload = [0u8; 80];
//! let mut decoder = FrameDecoder::default();
//!
//! // the transport split the message in two
//! assert_eq!(decoder.submit(&encode_frame(&payload[..40])), FrameResult::Incomplete);
//! let FrameResult::Complete(payload) = decoder.submit(&encode_frame(&payload[40..])) else {
//!     panic!("second half completes the payload");
//! };
//! let record = interpret(&payload);
//! assert_eq!(record.fix_status_label(), "no fix");
//! ```

mod decoder;
pub mod frame;
mod interpreter;
pub mod payload;

pub use decoder::{
    DecodeCounters, DecoderOptions, FrameDecoder, FrameResult, PendingPolicy, ReassemblyBuffer,
    RejectReason,
};
pub use frame::{FULL_PAYLOAD_LEN, checksum, encode_frame};
pub use interpreter::{interpret, interpret_fields};
pub use payload::{Payload, PayloadFields};
