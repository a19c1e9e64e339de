use crate::errors::Error;
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of each of the C1, C2, S1 and S2 packets
pub const HANDSHAKE_SIZE: usize = 1536;

async fn read_packet<R: AsyncRead + Unpin>(
    reader: &mut R,
    size: usize,
    name: &str,
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; size];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Handshake(format!("Stream ended while reading {name}"))
        } else {
            Error::Transport(e)
        }
    })?;
    Ok(buf)
}

async fn forward<W: AsyncWrite + Unpin>(writer: &mut W, buf: &[u8]) -> Result<(), Error> {
    writer.write_all(buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Relay the handshake between a client and a server without taking part in it
///
/// C0 and C1 go to the server, S0 and S1 come back, then S2 and C2 are exchanged. The version
/// byte the server answers with must match the client's. Returns that version.
pub async fn relay_handshake<CR, CW, SR, SW>(
    client_reader: &mut CR,
    client_writer: &mut CW,
    server_reader: &mut SR,
    server_writer: &mut SW,
) -> Result<u8, Error>
where
    CR: AsyncRead + Unpin,
    CW: AsyncWrite + Unpin,
    SR: AsyncRead + Unpin,
    SW: AsyncWrite + Unpin,
{
    let c0_c1 = read_packet(client_reader, 1 + HANDSHAKE_SIZE, "C0/C1").await?;
    forward(server_writer, &c0_c1).await?;

    let s0_s1 = read_packet(server_reader, 1 + HANDSHAKE_SIZE, "S0/S1").await?;
    if s0_s1[0] != c0_c1[0] {
        return Err(Error::Handshake(format!(
            "Client requested version {} but server answered {}",
            c0_c1[0], s0_s1[0]
        )));
    }
    forward(client_writer, &s0_s1).await?;

    let s2 = read_packet(server_reader, HANDSHAKE_SIZE, "S2").await?;
    forward(client_writer, &s2).await?;

    let c2 = read_packet(client_reader, HANDSHAKE_SIZE, "C2").await?;
    forward(server_writer, &c2).await?;

    debug!("Relayed handshake, version {}", c0_c1[0]);
    Ok(c0_c1[0])
}
