//! Hand-written protobuf types for the file store's list logs.
//!
//! Uses prost derive macros for encode/decode without prost-build.

use prost::Message;

/// One pushed list value plus its position in the log.
#[derive(Clone, PartialEq, Message)]
pub struct ProtoListEntry {
    /// 1-based push counter within the list.
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(string, tag = "2")]
    pub value: String,
}
