// net.rs

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::*;

/// One request buffer per exchange; the content is discarded.
pub const REQUEST_BUF_SIZE: usize = 1024;

const RESPONSE_HEADER: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nConnection: close\r\n\r\n";

/// One accepted client exchange. The connection closes when the value
/// is dropped.
pub trait ClientConn {
    /// Reads one request buffer. Path and method are never inspected.
    fn read_request(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Sends the rendered document and flushes.
    fn send_response(&mut self, body: &[u8]) -> io::Result<()>;
}

/// Blocking accept queue handing out one connection at a time.
pub trait ClientQueue {
    type Conn: ClientConn;

    /// Blocks until exactly one connection is accepted. No timeout, as in
    /// the firmware this replaces; a bounded wait would be a deviation.
    fn accept_one(&mut self) -> io::Result<Self::Conn>;
}

/// TCP listener serving the fixed HTML document.
///
/// The backlog is the platform default rather than the original's queue
/// depth of two; pending clients beyond that are the kernel's problem.
pub struct HttpQueue {
    listener: TcpListener,
}

impl HttpQueue {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl ClientQueue for HttpQueue {
    type Conn = HttpConn;

    fn accept_one(&mut self) -> io::Result<HttpConn> {
        let (stream, peer) = self.listener.accept()?;
        debug!("Accepted client {peer}");
        Ok(HttpConn { stream })
    }
}

#[derive(Debug)]
pub struct HttpConn {
    stream: TcpStream,
}

impl ClientConn for HttpConn {
    fn read_request(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn send_response(&mut self, body: &[u8]) -> io::Result<()> {
        self.stream.write_all(RESPONSE_HEADER.as_bytes())?;
        self.stream.write_all(body)?;
        self.stream.flush()
    }
}


// EOF
