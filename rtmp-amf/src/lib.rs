//! Stateful RTMP chunk stream reassembly and AMF0/AMF3 decoding for message interception.
//!
//! The crate turns a raw chunk stream into complete messages per channel, decodes the AMF0
//! command messages among them (including AMF3 values embedded through the AMF0 switch marker)
//! into an owned node graph, hands that graph to an [`Interceptor`](session::Interceptor), and
//! re-encodes and re-chunks the result.
//!
//! Example of decoding and re-encoding a message body
//! ```
//! use rtmp_amf::amf0;
//! use rtmp_amf::amf3::Externals;
//! use rtmp_amf::reference_tables::{ReferenceTables, TableScope};
//! use rtmp_amf::types::Amf0Node;
//!
//! let externals = Externals::with_flex();
//! let mut tables = ReferenceTables::new(TableScope::PerMessage);
//! let bytes = amf0::encode_all(
//!     &[Amf0Node::from("_result"), Amf0Node::from(1.0)],
//!     &mut tables,
//!     &externals,
//! )
//! .expect("Unable to encode");
//!
//! let mut tables = ReferenceTables::new(TableScope::PerMessage);
//! let nodes = amf0::decode_all(&bytes, &mut tables, &externals).expect("Unable to decode");
//! assert_eq!(nodes[0].as_str(), Some("_result"));
//! ```

#![warn(missing_docs)]

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

/// Support for the AMF0 format
pub mod amf0;
/// Support for the AMF3 format
pub mod amf3;
/// Reading and writing of chunk headers
pub mod chunk;
/// Error types
pub mod errors;
/// Externalizable flex classes seen on the wire
pub mod flex;
/// Relaying of the connection handshake
pub mod handshake;
/// Message reassembly and fragmentation
pub mod message;
/// Wiring of a full proxied connection
pub mod proxy;
/// Reference tables shared by a decode or encode session
pub mod reference_tables;
/// The per-connection read, transform and write pipeline
pub mod session;
/// Node types for both AMF versions
pub mod types;

mod nom_utils;

pub use errors::{DecodeError, EncodeError, Error, FramingError};
pub use nom_utils::{AMFResult, MAX_NESTING};
pub use session::{Interceptor, Session, SessionConfig};
