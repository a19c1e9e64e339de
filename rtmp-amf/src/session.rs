use crate::amf0;
use crate::amf3::Externals;
use crate::chunk::CHUNK_SIZE;
use crate::errors::{BoxError, Error};
use crate::message::{MessageReassembler, MessageWriter, RawMessage};
use crate::reference_tables::{ReferenceTables, TableScope};
use crate::types::Amf0Node;
use bytes::BytesMut;
use log::{debug, error};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Message type id of an AMF0 command
pub const AMF0_COMMAND: u8 = 0x14;

/// Settings for one proxied direction of a connection
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Chunk size used both for reading and writing
    pub chunk_size: NonZeroUsize,

    /// Lifetime of the reference tables
    pub table_scope: TableScope,

    /// Message type ids that are decoded and handed to the interceptor, everything else is
    /// forwarded untouched
    pub intercepted_types: Vec<u8>,

    /// Codecs for externalizable AMF3 classes
    pub externals: Arc<Externals>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            table_scope: TableScope::default(),
            intercepted_types: vec![AMF0_COMMAND],
            externals: Arc::new(Externals::with_flex()),
        }
    }
}

/// Sees, and may rewrite, the decoded values of every intercepted message
pub trait Interceptor: Send {
    /// Transform the values of one message body
    fn intercept(&mut self, nodes: Vec<Amf0Node>) -> Result<Vec<Amf0Node>, BoxError>;
}

impl<F> Interceptor for F
where
    F: FnMut(Vec<Amf0Node>) -> Result<Vec<Amf0Node>, BoxError> + Send,
{
    fn intercept(&mut self, nodes: Vec<Amf0Node>) -> Result<Vec<Amf0Node>, BoxError> {
        self(nodes)
    }
}

/// Decodes intercepted messages, runs the interceptor and encodes the result
///
/// Holds separate tables for decoding and encoding.
#[derive(Debug)]
pub struct Transcoder {
    intercepted_types: Vec<u8>,
    externals: Arc<Externals>,
    decode_tables: ReferenceTables,
    encode_tables: ReferenceTables,
}

impl Transcoder {
    /// Create a transcoder from the session settings
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            intercepted_types: config.intercepted_types.clone(),
            externals: Arc::clone(&config.externals),
            decode_tables: ReferenceTables::new(config.table_scope),
            encode_tables: ReferenceTables::new(config.table_scope),
        }
    }

    /// Whether messages of this type go through the interceptor
    pub fn is_intercepted(&self, type_id: u8) -> bool {
        self.intercepted_types.contains(&type_id)
    }

    /// Process one complete message
    pub fn process<I: Interceptor + ?Sized>(
        &mut self,
        mut message: RawMessage,
        interceptor: &mut I,
    ) -> Result<RawMessage, Error> {
        if !self.is_intercepted(message.message.type_id) {
            return Ok(message);
        }

        self.decode_tables.begin_message();
        self.encode_tables.begin_message();

        let nodes = amf0::decode_all(&message.payload, &mut self.decode_tables, &self.externals)?;
        let nodes = interceptor.intercept(nodes).map_err(Error::Transform)?;
        let bytes = amf0::encode_all(&nodes, &mut self.encode_tables, &self.externals)?;

        debug!(
            "Transcoded message on channel {}, {} bytes in, {} bytes out",
            message.channel_id(),
            message.payload.len(),
            bytes.len()
        );
        message.payload = BytesMut::from(bytes.as_slice());
        message.message.length = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        Ok(message)
    }
}

/// One direction of a connection: reassemble, transform, re-chunk
#[derive(Clone, Debug, Default)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Create a session with the given settings
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// The session settings
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run until the reader ends or any stage fails
    ///
    /// Reading, transforming and writing run as three stages joined by channels of capacity one.
    /// The writer is shut down once every message has been written.
    pub async fn run<R, W, I>(
        &self,
        mut reader: R,
        mut writer: W,
        mut interceptor: I,
    ) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        I: Interceptor,
    {
        let (read_tx, mut read_rx) = mpsc::channel::<RawMessage>(1);
        let (write_tx, mut write_rx) = mpsc::channel::<RawMessage>(1);

        let mut reassembler = MessageReassembler::new(self.config.chunk_size);
        let mut transcoder = Transcoder::new(&self.config);
        let mut message_writer = MessageWriter::new(self.config.chunk_size);

        let read = async move {
            while let Some(message) = reassembler.read_next_message(&mut reader).await? {
                if read_tx.send(message).await.is_err() {
                    break;
                }
            }
            Ok::<_, Error>(())
        };

        let transform = async move {
            while let Some(message) = read_rx.recv().await {
                let message = transcoder.process(message, &mut interceptor)?;
                if write_tx.send(message).await.is_err() {
                    break;
                }
            }
            Ok::<_, Error>(())
        };

        let write = async move {
            while let Some(message) = write_rx.recv().await {
                message_writer.write_message(&mut writer, &message).await?;
            }
            writer.shutdown().await?;
            Ok::<_, Error>(())
        };

        let result = tokio::try_join!(read, transform, write).map(|_| ());
        if let Err(e) = &result {
            error!("Session ended: {e}");
        }
        result
    }
}
