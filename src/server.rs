//! This module contains a minimal server which reads one request from each
//! connection it accepts, hands it to an application handler along with a
//! [`Writer`] for the response, and then closes the connection.

use super::{
    error::Error,
    request::{
        Limits,
        Request,
    },
    response::{
        default_headers,
        StatusCode,
        Writer,
    },
};
use log::{
    debug,
    error,
    info,
    warn,
};
use std::{
    io::{
        self,
        Read,
    },
    net::{
        Ipv4Addr,
        Ipv6Addr,
        Shutdown,
        SocketAddr,
        TcpListener,
        TcpStream,
        ToSocketAddrs,
    },
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    thread,
    time::Duration,
};

// Request bytes left unread when a connection is dropped make the peer's
// side reset, which can discard a response it has not read yet, so this much
// is read and thrown away first.
const MAX_DRAIN_BYTES: u64 = 64 * 1024;
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

fn drain(
    stream: &TcpStream,
    peer: &str,
) {
    if let Err(error) = stream.set_read_timeout(Some(DRAIN_TIMEOUT)) {
        debug!("unable to set read timeout for {}: {}", peer, error);
        return;
    }
    match io::copy(&mut stream.take(MAX_DRAIN_BYTES), &mut io::sink()) {
        Ok(drained) if drained > 0 => {
            debug!("discarded {} unread bytes from {}", drained, peer);
        },
        Ok(_) => (),
        Err(error) => debug!("stopped draining {}: {}", peer, error),
    }
}

fn write_bad_request(
    writer: &mut Writer<&TcpStream>,
    parse_error: &Error,
) -> Result<(), Error> {
    let body = format!("unable to parse request: {}\n", parse_error);
    writer.write_status_line(StatusCode::BadRequest)?;
    writer.write_headers(&default_headers(body.len()))?;
    writer.write_body(body)?;
    Ok(())
}

fn handle_connection<H>(
    stream: &TcpStream,
    limits: Limits,
    handler: &H,
) where
    H: Fn(&mut Writer<&TcpStream>, &Request) -> Result<(), Error>,
{
    let peer = stream
        .peer_addr()
        .map_or_else(|_| String::from("unknown peer"), |addr| addr.to_string());
    let mut writer = Writer::new(stream);
    match Request::from_reader_with_limits(stream, limits) {
        Ok(request) => {
            if let Err(error) = handler(&mut writer, &request) {
                error!(
                    "handler failed for {} {} from {}: {}",
                    request.request_line.method,
                    request.request_line.target,
                    peer,
                    error
                );
            }
        },
        Err(parse_error) => {
            warn!("unable to parse request from {}: {}", peer, parse_error);
            if let Err(error) = write_bad_request(&mut writer, &parse_error) {
                warn!("unable to reject request from {}: {}", peer, error);
            }
        },
    }
    if let Err(error) = stream.shutdown(Shutdown::Write) {
        debug!("unable to shut down connection to {}: {}", peer, error);
    }
    drain(stream, &peer);
}

fn listen<H>(
    listener: &TcpListener,
    closed: &AtomicBool,
    limits: Limits,
    handler: &Arc<H>,
) where
    H: Fn(&mut Writer<&TcpStream>, &Request) -> Result<(), Error>
        + Send
        + Sync
        + 'static,
{
    for stream in listener.incoming() {
        if closed.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let handler = Arc::clone(handler);
                let spawned = thread::Builder::new()
                    .name(String::from("connection"))
                    .spawn(move || handle_connection(&stream, limits, &*handler));
                if let Err(error) = spawned {
                    error!("unable to start connection thread: {}", error);
                }
            },
            Err(error) => warn!("unable to accept connection: {}", error),
        }
    }
    debug!("accept loop finished");
}

/// This is a running server.  Connections are accepted on a thread of
/// their own, and each connection is handled on yet another thread.
pub struct Server {
    accept_thread: Option<thread::JoinHandle<()>>,
    closed: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl Server {
    /// Stop accepting connections and wait for the accept loop to finish.
    /// Connections already accepted are left to run to completion.
    pub fn close(mut self) {
        self.stop();
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Bind a listener to the given address and start accepting
    /// connections on it, calling the given handler once for every request
    /// which is received in full.  Requests which fail to parse are answered
    /// with `400 Bad Request` without involving the handler.
    pub fn serve<A, H>(
        addr: A,
        limits: Limits,
        handler: H,
    ) -> Result<Self, Error>
    where
        A: ToSocketAddrs,
        H: Fn(&mut Writer<&TcpStream>, &Request) -> Result<(), Error>
            + Send
            + Sync
            + 'static,
    {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        let closed = Arc::new(AtomicBool::new(false));
        let accept_thread = {
            let closed = Arc::clone(&closed);
            let handler = Arc::new(handler);
            thread::Builder::new().name(String::from("accept")).spawn(
                move || listen(&listener, &closed, limits, &handler),
            )?
        };
        info!("listening on {}", local_addr);
        Ok(Self {
            accept_thread: Some(accept_thread),
            closed,
            local_addr,
        })
    }

    fn stop(&mut self) {
        let accept_thread = match self.accept_thread.take() {
            Some(accept_thread) => accept_thread,
            None => return,
        };
        self.closed.store(true, Ordering::SeqCst);

        // The accept loop only looks at the flag after it accepts
        // something, so give it a connection to accept.
        let mut wake_addr = self.local_addr;
        if wake_addr.ip().is_unspecified() {
            wake_addr.set_ip(if wake_addr.is_ipv4() {
                Ipv4Addr::LOCALHOST.into()
            } else {
                Ipv6Addr::LOCALHOST.into()
            });
        }
        if let Err(error) = TcpStream::connect(wake_addr) {
            warn!("unable to wake accept loop: {}", error);
        }
        if accept_thread.join().is_err() {
            error!("accept loop panicked");
        }
        info!("stopped listening on {}", self.local_addr);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
