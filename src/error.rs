/// This is the enumeration of all the different kinds of errors which this
/// crate generates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The attached bytes did not parse as valid chunk size text.
    #[error("chunk size line is not valid text")]
    ChunkSizeLineNotValidText(Vec<u8>),

    /// The body received exceeds the length declared by the
    /// `Content-Length` header.
    #[error("Content-Length too large: declared {declared}, received {received}")]
    ContentLengthTooLarge {
        declared: usize,
        received: usize,
    },

    /// The attached header line has no colon separating its name from its
    /// value.
    #[error("invalid header field")]
    HeaderLineMissingColon(String),

    /// The attached bytes did not parse as valid text for a header line.
    #[error("header line is not valid text")]
    HeaderLineNotValidText(Vec<u8>),

    /// The name in the attached header line is empty or has whitespace
    /// between it and the colon.
    #[error("invalid header key")]
    HeaderNameInvalid(String),

    /// The name in the attached header line contains a character which is
    /// not allowed in a token.
    #[error("invalid character in header key")]
    HeaderNameInvalidCharacter(String),

    /// A chunk size in the body was invalid.
    #[error("invalid chunk size value")]
    InvalidChunkSize(std::num::ParseIntError),

    /// The attached bytes appeared after the end of a chunk
    /// in the place where a carriage-return and line-feed were expected.
    #[error("unexpected extra junk at the end of a chunk")]
    InvalidChunkTerminator(Vec<u8>),

    /// The `Content-Length` header value is not valid.
    #[error("malformed Content-Length")]
    InvalidContentLength(#[source] std::num::ParseIntError),

    /// Reading from or writing to the underlying stream failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The attached bytes are the beginning of a request line or header line
    /// whose length exceeds the line limit.
    #[error("line too long")]
    LineTooLong(Vec<u8>),

    /// The message is too large to fit within the configured size limit.
    #[error("message exceeds maximum size limit")]
    MessageTooLong,

    /// More input was offered to a request which has already been parsed
    /// completely.
    #[error("trying to read data in a done state")]
    ParseAfterDone,

    /// The attached request line does not consist of exactly three parts
    /// separated by single spaces.
    #[error("invalid request")]
    RequestLineInvalid(String),

    /// The method in the attached request line is not made up solely of
    /// uppercase letters.
    #[error("invalid method")]
    RequestLineMethod(String),

    /// The attached bytes did not parse as valid text for the HTTP request
    /// line.
    #[error("request line is not valid text")]
    RequestLineNotValidText(Vec<u8>),

    /// The protocol is unrecognized or could not be parsed from the HTTP
    /// request line attached.
    #[error("invalid http version")]
    RequestLineProtocol(String),

    /// An error occurred with the message trailer.
    #[error("Error in trailer")]
    Trailer(#[source] Box<Error>),

    /// The stream ended before a complete request was received.
    #[error("unexpected end of stream while parsing")]
    UnexpectedEndOfStream,

    /// The attached status code has no known reason phrase.
    #[error("unknown status code {0}")]
    UnknownStatusCode(u16),
}
