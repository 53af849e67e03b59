use super::{
    error::Error,
    find_crlf,
    headers::Headers,
    partial_line_too_long,
    ParseStatus,
    CRLF,
};
use log::{
    debug,
    trace,
};
use std::io::Read;

// This is how many bytes the stream reader can hold before it first has to
// grow its buffer.
const INITIAL_BUFFER_SIZE: usize = 8;

const PROTOCOL_PREFIX: &str = "HTTP/";
const SUPPORTED_VERSION: &str = "1.1";

fn is_method(method: &str) -> bool {
    !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase())
}

fn parse_request_line(request_line: &str) -> Result<RequestLine, Error> {
    let parts = request_line.split(' ').collect::<Vec<_>>();
    let (method, target, protocol) = match parts[..] {
        [method, target, protocol] => (method, target, protocol),
        _ => return Err(Error::RequestLineInvalid(request_line.into())),
    };
    if !is_method(method) {
        return Err(Error::RequestLineMethod(request_line.into()));
    }
    match protocol.strip_prefix(PROTOCOL_PREFIX) {
        Some(version) if version == SUPPORTED_VERSION => Ok(RequestLine {
            method: method.into(),
            target: target.into(),
            version: version.into(),
        }),
        _ => Err(Error::RequestLineProtocol(request_line.into())),
    }
}

/// These are the bounds placed on a request while it is being read, to keep
/// a misbehaving peer from making the reader buffer without end.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    /// The most bytes the whole request, including its declared body, may
    /// occupy.
    pub max_message_size: Option<usize>,

    /// The most bytes the request line or any one header line may occupy,
    /// not counting its line terminator.
    pub line_limit: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: Some(10_000_000),
            line_limit: Some(8192),
        }
    }
}

/// This is the first line of an HTTP request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestLine {
    /// The request method, such as `GET`.
    pub method: String,

    /// The request target, exactly as it appeared on the wire.
    pub target: String,

    /// The protocol version, without the `HTTP/` prefix.
    pub version: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RequestState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
}

/// This is an HTTP request which has been received in full.
#[derive(Debug, Eq, PartialEq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
    limits: Limits,
    state: RequestState,
    total_bytes: usize,
}

impl Request {
    fn count_bytes(
        &mut self,
        bytes: usize,
    ) -> Result<(), Error> {
        self.total_bytes += bytes;
        self.check_message_size(self.total_bytes)
    }

    fn check_message_size(
        &self,
        size: usize,
    ) -> Result<(), Error> {
        match self.limits.max_message_size {
            Some(max_message_size) if size > max_message_size => {
                Err(Error::MessageTooLong)
            },
            _ => Ok(()),
        }
    }

    /// Read a single request from the given stream, using the default
    /// [`Limits`].
    pub fn from_reader<R>(reader: R) -> Result<Self, Error>
    where
        R: Read,
    {
        Self::from_reader_with_limits(reader, Limits::default())
    }

    /// Read a single request from the given stream.  Bytes are pulled from
    /// the stream only until the request is complete; the stream ending
    /// before then is an error.
    pub fn from_reader_with_limits<R>(
        mut reader: R,
        limits: Limits,
    ) -> Result<Self, Error>
    where
        R: Read,
    {
        let mut request = Self::with_limits(limits);
        let mut buffer = vec![0; INITIAL_BUFFER_SIZE];
        let mut filled = 0;
        while request.state != RequestState::Done {
            if filled == buffer.len() {
                buffer.resize(buffer.len() * 2, 0);
                trace!("request buffer grown to {} bytes", buffer.len());
            }
            let read = match reader.read(&mut buffer[filled..]) {
                Ok(0) => return Err(Error::UnexpectedEndOfStream),
                Ok(read) => read,
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {
                    continue
                },
                Err(error) => return Err(error.into()),
            };
            filled += read;
            let (_, consumed) = request.parse(&buffer[..filled])?;
            buffer.copy_within(consumed..filled, 0);
            filled -= consumed;
            trace!(
                "parsed {} bytes, {} held back, state {:?}",
                consumed,
                filled,
                request.state
            );
        }
        debug!(
            "received {} {} ({} header(s), {} body bytes)",
            request.request_line.method,
            request.request_line.target,
            request.headers.len(),
            request.body.len()
        );
        Ok(request)
    }

    // Consume as many whole protocol units from the front of the input as
    // it holds.  This may be called again with more input whenever it
    // returns `ParseStatus::Incomplete`, as long as the bytes it reported
    // consumed are not offered again.
    pub(crate) fn parse<T>(
        &mut self,
        raw_message: T,
    ) -> Result<(ParseStatus, usize), Error>
    where
        T: AsRef<[u8]>,
    {
        if self.state == RequestState::Done {
            return Err(Error::ParseAfterDone);
        }
        let raw_message = raw_message.as_ref();
        let mut total_consumed = 0;
        loop {
            let (state, consumed) =
                self.parse_single(&raw_message[total_consumed..])?;
            self.state = state;
            total_consumed += consumed;
            if self.state == RequestState::Done {
                return Ok((ParseStatus::Complete, total_consumed));
            }
            if consumed == 0 {
                return Ok((ParseStatus::Incomplete, total_consumed));
            }
        }
    }

    fn parse_single(
        &mut self,
        raw_message: &[u8],
    ) -> Result<(RequestState, usize), Error> {
        match self.state {
            RequestState::Initialized => {
                self.parse_message_for_request_line(raw_message)
            },
            RequestState::ParsingHeaders => {
                self.parse_message_for_headers(raw_message)
            },
            RequestState::ParsingBody => self.parse_message_for_body(raw_message),
            RequestState::Done => Err(Error::ParseAfterDone),
        }
    }

    fn parse_message_for_body(
        &mut self,
        raw_message: &[u8],
    ) -> Result<(RequestState, usize), Error> {
        let content_length = match self.headers.get("Content-Length") {
            Some(content_length) => content_length
                .parse::<usize>()
                .map_err(Error::InvalidContentLength)?,
            None => return Ok((RequestState::Done, raw_message.len())),
        };
        self.check_message_size(self.total_bytes.saturating_add(content_length))?;
        let received = self.body.len() + raw_message.len();
        if received > content_length {
            return Err(Error::ContentLengthTooLarge {
                declared: content_length,
                received,
            });
        }
        self.body.extend_from_slice(raw_message);
        if received == content_length {
            Ok((RequestState::Done, raw_message.len()))
        } else {
            Ok((RequestState::ParsingBody, raw_message.len()))
        }
    }

    fn parse_message_for_headers(
        &mut self,
        raw_message: &[u8],
    ) -> Result<(RequestState, usize), Error> {
        let (status, consumed) =
            self.headers.parse_line(raw_message, self.limits.line_limit)?;
        self.count_bytes(consumed)?;
        match status {
            ParseStatus::Complete => Ok((RequestState::ParsingBody, consumed)),
            ParseStatus::Incomplete => {
                Ok((RequestState::ParsingHeaders, consumed))
            },
        }
    }

    fn parse_message_for_request_line(
        &mut self,
        raw_message: &[u8],
    ) -> Result<(RequestState, usize), Error> {
        match (find_crlf(raw_message), self.limits.line_limit) {
            (Some(request_line_end), Some(limit))
                if request_line_end > limit =>
            {
                Err(Error::LineTooLong(raw_message[..limit].to_vec()))
            },
            (Some(request_line_end), _) => {
                let request_line = &raw_message[..request_line_end];
                let request_line =
                    std::str::from_utf8(request_line).map_err(|_| {
                        Error::RequestLineNotValidText(request_line.to_vec())
                    })?;
                self.request_line = parse_request_line(request_line)?;
                let consumed = request_line_end + CRLF.len();
                self.count_bytes(consumed)?;
                Ok((RequestState::ParsingHeaders, consumed))
            },
            (None, Some(limit))
                if partial_line_too_long(raw_message, limit) =>
            {
                Err(Error::LineTooLong(raw_message[..limit].to_vec()))
            },
            (None, _) => Ok((RequestState::Initialized, 0)),
        }
    }

    fn with_limits(limits: Limits) -> Self {
        Self {
            request_line: RequestLine::default(),
            headers: Headers::new(),
            body: Vec::new(),
            limits,
            state: RequestState::Initialized,
            total_bytes: 0,
        }
    }
}
