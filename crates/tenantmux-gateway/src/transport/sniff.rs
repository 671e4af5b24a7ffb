//! First-bytes protocol classification.
//!
//! Reads just enough of a fresh connection to tell an HTTP/1.x request line
//! from anything else (an HTTP/2 preface, a TLS hello, garbage). The bytes
//! read are kept and replayed by [`SniffedStream`], so the sub-server sees
//! the connection exactly as the client sent it.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tonic::transport::server::{Connected, TcpConnectInfo};

const HTTP1_METHODS: [&[u8]; 9] = [
    b"GET", b"HEAD", b"POST", b"PUT", b"DELETE", b"OPTIONS", b"PATCH", b"CONNECT", b"TRACE",
];

/// Longest method plus the separating space.
pub const SNIFF_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Plaintext HTTP/1.x request line.
    Http1,
    /// Everything else; handed to the RPC transport.
    Rpc,
}

/// Classify a connection prefix. `None` means more bytes are needed.
pub fn classify(prefix: &[u8]) -> Option<Protocol> {
    let window = &prefix[..prefix.len().min(SNIFF_LEN)];
    if let Some(sp) = window.iter().position(|b| *b == b' ') {
        let token = &window[..sp];
        return Some(if HTTP1_METHODS.contains(&token) {
            Protocol::Http1
        } else {
            Protocol::Rpc
        });
    }
    if window.len() >= SNIFF_LEN {
        return Some(Protocol::Rpc);
    }
    // still a possible method prefix?
    if HTTP1_METHODS.iter().any(|m| m.starts_with(window)) {
        None
    } else {
        Some(Protocol::Rpc)
    }
}

/// Read until [`classify`] decides. Returns `Ok(None)` if the peer closed
/// before sending anything.
pub async fn sniff<S>(mut io: S) -> io::Result<Option<(Protocol, SniffedStream<S>)>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(SNIFF_LEN * 8);
    loop {
        if let Some(proto) = classify(&buf) {
            return Ok(Some((proto, SniffedStream::new(buf.freeze(), io))));
        }
        let n = io.read_buf(&mut buf).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            // truncated prefix; let the RPC side reject it
            return Ok(Some((Protocol::Rpc, SniffedStream::new(buf.freeze(), io))));
        }
    }
}

/// A stream that first replays the sniffed prefix, then reads from `inner`.
#[derive(Debug)]
pub struct SniffedStream<S = TcpStream> {
    prefix: Bytes,
    inner: S,
}

impl<S> SniffedStream<S> {
    pub fn new(prefix: Bytes, inner: S) -> Self {
        Self { prefix, inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for SniffedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.prefix.is_empty() {
            let n = self.prefix.len().min(buf.remaining());
            let chunk = self.prefix.split_to(n);
            buf.put_slice(&chunk);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for SniffedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl Connected for SniffedStream<TcpStream> {
    type ConnectInfo = TcpConnectInfo;

    fn connect_info(&self) -> Self::ConnectInfo {
        self.inner.connect_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn request_lines_are_http1() {
        assert_eq!(classify(b"GET /healthz HTTP/1.1\r\n"), Some(Protocol::Http1));
        assert_eq!(classify(b"OPTIONS * HTTP/1.1"), Some(Protocol::Http1));
        assert_eq!(classify(b"DELETE /x"), Some(Protocol::Http1));
    }

    #[test]
    fn h2_preface_is_rpc() {
        assert_eq!(classify(b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"), Some(Protocol::Rpc));
    }

    #[test]
    fn tls_hello_is_rpc() {
        assert_eq!(classify(&[0x16, 0x03, 0x01, 0x02]), Some(Protocol::Rpc));
    }

    #[test]
    fn partial_method_needs_more() {
        assert_eq!(classify(b""), None);
        assert_eq!(classify(b"GE"), None);
        assert_eq!(classify(b"POS"), None);
        assert_eq!(classify(b"GETX"), Some(Protocol::Rpc));
    }

    #[test]
    fn lowercase_method_is_not_http1() {
        assert_eq!(classify(b"get / HTTP/1.1"), Some(Protocol::Rpc));
    }

    #[tokio::test]
    async fn sniffed_bytes_are_replayed() {
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(b"GET").await.unwrap();
        client.write_all(b" /healthz HTTP/1.1\r\n\r\n").await.unwrap();
        drop(client);

        let (proto, mut stream) = sniff(server).await.unwrap().unwrap();
        assert_eq!(proto, Protocol::Http1);

        let mut all = Vec::new();
        stream.read_to_end(&mut all).await.unwrap();
        assert_eq!(all, b"GET /healthz HTTP/1.1\r\n\r\n");
    }

    #[tokio::test]
    async fn closed_before_any_byte() {
        let (client, server) = tokio::io::duplex(8);
        drop(client);
        assert!(sniff(server).await.unwrap().is_none());
    }
}
