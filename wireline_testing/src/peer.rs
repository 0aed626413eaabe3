//! Loopback TCP peers.

use std::{io, net::SocketAddr};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// A listener bound to an ephemeral loopback port.
pub struct LocalPeer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LocalPeer {
    /// Bind `127.0.0.1:0`.
    ///
    /// # Errors
    ///
    /// Returns any error from binding the listener.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Port the listener is bound to.
    #[must_use]
    pub fn port(&self) -> u16 { self.addr.port() }

    /// Accept a single connection.
    ///
    /// # Errors
    ///
    /// Returns any error from `accept`.
    pub async fn accept(&self) -> io::Result<TcpStream> {
        let (stream, _) = self.listener.accept().await?;
        Ok(stream)
    }
}

/// Read from `stream` until `expected` bytes arrive or the peer closes.
///
/// # Errors
///
/// Returns any error from reading the stream.
pub async fn read_exact_or_eof(stream: &mut TcpStream, expected: usize) -> io::Result<Vec<u8>> {
    let mut received = Vec::with_capacity(expected);
    let mut buf = [0_u8; 1024];
    while received.len() < expected {
        let read = stream.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        received.extend_from_slice(&buf[..read]);
    }
    Ok(received)
}

/// Spawn a server that echoes everything on the first connection it
/// accepts, then closes when the client does.
///
/// # Errors
///
/// Returns any error from binding the listener.
pub async fn spawn_echo_server() -> io::Result<SocketAddr> {
    let peer = LocalPeer::bind().await?;
    let addr = peer.addr();
    tokio::spawn(async move {
        let Ok(mut stream) = peer.accept().await else {
            return;
        };
        let mut buf = [0_u8; 1024];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    if stream.write_all(&buf[..read]).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
    Ok(addr)
}
