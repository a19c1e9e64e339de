use crate::errors::Error;
use crate::handshake::relay_handshake;
use crate::session::{Interceptor, Session, SessionConfig};
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Proxy one connection between a client and a server
///
/// After relaying the handshake, messages from the server are reassembled and pass through the
/// interceptor on their way to the client, while bytes from the client are copied to the server
/// as they are. The connection ends when either direction finishes or fails.
pub async fn proxy_connection<CR, CW, SR, SW, I>(
    client: (CR, CW),
    server: (SR, SW),
    config: &SessionConfig,
    interceptor: I,
) -> Result<(), Error>
where
    CR: AsyncRead + Unpin,
    CW: AsyncWrite + Unpin,
    SR: AsyncRead + Unpin,
    SW: AsyncWrite + Unpin,
    I: Interceptor,
{
    let (mut client_reader, mut client_writer) = client;
    let (mut server_reader, mut server_writer) = server;

    relay_handshake(
        &mut client_reader,
        &mut client_writer,
        &mut server_reader,
        &mut server_writer,
    )
    .await?;

    let session = Session::new(config.clone());
    let downstream = session.run(server_reader, client_writer, interceptor);
    let upstream = async move {
        let copied = tokio::io::copy(&mut client_reader, &mut server_writer).await?;
        server_writer.shutdown().await?;
        debug!("Client closed after sending {copied} bytes");
        Ok::<_, Error>(())
    };

    tokio::select! {
        result = downstream => result,
        result = upstream => result,
    }
}
