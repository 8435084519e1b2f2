//! Wire codec for the store's GET/SET protocol
//!
//! Commands go out as arrays of bulk strings; replies come back as simple
//! strings, errors, integers, bulk strings, or the null bulk that marks a
//! missing key. Anything else on the wire is a protocol violation and the
//! connection is not reused afterwards.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use kvgate_core::UnavailableCause;

/// One decoded reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK` style acknowledgment.
    Simple(String),
    /// `-ERR ...` rejection reported by the store itself.
    Error(String),
    /// `:N` integer reply.
    Integer(i64),
    /// `$N` bulk payload.
    Bulk(Vec<u8>),
    /// `$-1`, the store's "no such entry" marker.
    NullBulk,
}

/// A framed connection speaking the store's wire protocol.
pub struct RespConnection<S> {
    io: BufReader<S>,
}

/// The concrete connection type the pool hands out.
pub type StoreConnection = RespConnection<TcpStream>;

impl<S: AsyncRead + AsyncWrite + Unpin> RespConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            io: BufReader::new(stream),
        }
    }

    /// Send one command and read back its reply.
    pub async fn command(&mut self, args: &[&[u8]]) -> Result<Reply, UnavailableCause> {
        self.send(args).await?;
        self.read_reply().await
    }

    async fn send(&mut self, args: &[&[u8]]) -> Result<(), UnavailableCause> {
        let mut frame = Vec::with_capacity(32);
        frame.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
        for arg in args {
            frame.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
            frame.extend_from_slice(arg);
            frame.extend_from_slice(b"\r\n");
        }

        self.io
            .write_all(&frame)
            .await
            .map_err(|e| UnavailableCause::Io(e.to_string()))?;
        self.io
            .flush()
            .await
            .map_err(|e| UnavailableCause::Io(e.to_string()))
    }

    async fn read_reply(&mut self) -> Result<Reply, UnavailableCause> {
        let line = self.read_line().await?;
        match line.bytes().next() {
            Some(b'+') => Ok(Reply::Simple(line[1..].to_string())),
            Some(b'-') => Ok(Reply::Error(line[1..].to_string())),
            Some(b':') => line[1..]
                .parse()
                .map(Reply::Integer)
                .map_err(|_| UnavailableCause::Protocol(format!("bad integer reply: {line}"))),
            Some(b'$') => {
                let len: i64 = line[1..]
                    .parse()
                    .map_err(|_| UnavailableCause::Protocol(format!("bad bulk length: {line}")))?;
                if len < 0 {
                    return Ok(Reply::NullBulk);
                }
                self.read_bulk(len as usize).await
            }
            _ => Err(UnavailableCause::Protocol(format!(
                "unexpected reply type: {line}"
            ))),
        }
    }

    async fn read_bulk(&mut self, len: usize) -> Result<Reply, UnavailableCause> {
        let mut payload = vec![0u8; len + 2];
        self.io
            .read_exact(&mut payload)
            .await
            .map_err(|e| UnavailableCause::Io(e.to_string()))?;
        if &payload[len..] != b"\r\n" {
            return Err(UnavailableCause::Protocol(
                "bulk payload missing terminator".to_string(),
            ));
        }
        payload.truncate(len);
        Ok(Reply::Bulk(payload))
    }

    async fn read_line(&mut self) -> Result<String, UnavailableCause> {
        let mut line = String::new();
        let n = self
            .io
            .read_line(&mut line)
            .await
            .map_err(|e| UnavailableCause::Io(e.to_string()))?;
        if n == 0 {
            return Err(UnavailableCause::Io("connection closed by peer".to_string()));
        }
        if !line.ends_with("\r\n") {
            return Err(UnavailableCause::Protocol(format!(
                "reply line not CRLF-terminated: {line:?}"
            )));
        }
        line.truncate(line.len() - 2);
        Ok(line)
    }
}
