use super::{
    error::Error,
    headers::Headers,
    CRLF,
};
use std::{
    convert::TryFrom,
    io::Write,
};

/// These are the response status codes this crate knows how to send.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    InternalServerError,
}

impl StatusCode {
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::InternalServerError => 500,
        }
    }

    #[must_use]
    pub fn reason_phrase(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(StatusCode::Ok),
            400 => Ok(StatusCode::BadRequest),
            500 => Ok(StatusCode::InternalServerError),
            _ => Err(Error::UnknownStatusCode(code)),
        }
    }
}

/// Make the headers every response starts out with: the given body length,
/// a plain text content type, and notice that the connection will close
/// after the response.  Use [`Headers::replace`] and [`Headers::remove`] to
/// adjust them.
#[must_use]
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", content_length.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

/// This writes the parts of an HTTP response straight to a byte sink.
///
/// Nothing is buffered, and nothing checks that the parts are written in
/// order: the status line, then the headers, then either the body, or the
/// chunks followed by [`write_chunked_body_done`] and [`write_trailers`].
///
/// [`write_chunked_body_done`]: Writer::write_chunked_body_done
/// [`write_trailers`]: Writer::write_trailers
#[derive(Debug)]
pub struct Writer<W> {
    writer: W,
}

impl<W> Writer<W>
where
    W: Write,
{
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
        }
    }

    pub fn write_body<B>(
        &mut self,
        body: B,
    ) -> Result<usize, Error>
    where
        B: AsRef<[u8]>,
    {
        let body = body.as_ref();
        self.writer.write_all(body)?;
        Ok(body.len())
    }

    /// Write one chunk of a body sent with the `chunked` transfer coding.
    /// An empty chunk is written as such; it does not end the body.
    pub fn write_chunked_body<B>(
        &mut self,
        chunk: B,
    ) -> Result<usize, Error>
    where
        B: AsRef<[u8]>,
    {
        let chunk = chunk.as_ref();
        let mut output = format!("{:x}{}", chunk.len(), CRLF).into_bytes();
        output.extend_from_slice(chunk);
        output.extend_from_slice(CRLF.as_bytes());
        self.writer.write_all(&output)?;
        Ok(output.len())
    }

    /// Write the last chunk of a body sent with the `chunked` transfer
    /// coding.  The body is not finished until [`Writer::write_trailers`]
    /// has also been called, even if there are no trailers to send.
    pub fn write_chunked_body_done(&mut self) -> Result<usize, Error> {
        let last_chunk = format!("0{}", CRLF);
        self.writer.write_all(last_chunk.as_bytes())?;
        Ok(last_chunk.len())
    }

    fn write_fields(
        &mut self,
        fields: &Headers,
    ) -> Result<(), Error> {
        for (name, value) in fields.iter() {
            write!(self.writer, "{}: {}{}", name, value, CRLF)?;
        }
        self.writer.write_all(CRLF.as_bytes())?;
        Ok(())
    }

    pub fn write_headers(
        &mut self,
        headers: &Headers,
    ) -> Result<(), Error> {
        self.write_fields(headers)
    }

    pub fn write_status_line(
        &mut self,
        status: StatusCode,
    ) -> Result<(), Error> {
        write!(
            self.writer,
            "HTTP/1.1 {} {}{}",
            status.code(),
            status.reason_phrase(),
            CRLF
        )?;
        Ok(())
    }

    pub fn write_trailers(
        &mut self,
        trailers: &Headers,
    ) -> Result<(), Error> {
        self.write_fields(trailers)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        ChunkedBody,
        DecodeStatus,
    };

    // This accepts a fixed number of bytes and then fails every write.
    struct FailingSink {
        capacity: usize,
        written: Vec<u8>,
    }

    impl Write for FailingSink {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            let room = self.capacity - self.written.len();
            if room == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "sink closed",
                ));
            }
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn output_of<F>(write: F) -> String
    where
        F: FnOnce(&mut Writer<Vec<u8>>) -> Result<(), Error>,
    {
        let mut writer = Writer::new(Vec::new());
        write(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn status_lines() {
        assert_eq!(
            "HTTP/1.1 200 OK\r\n",
            output_of(|w| w.write_status_line(StatusCode::Ok))
        );
        assert_eq!(
            "HTTP/1.1 400 Bad Request\r\n",
            output_of(|w| w.write_status_line(StatusCode::BadRequest))
        );
        assert_eq!(
            "HTTP/1.1 500 Internal Server Error\r\n",
            output_of(|w| w.write_status_line(StatusCode::InternalServerError))
        );
    }

    #[test]
    fn status_code_from_number() {
        assert_eq!(StatusCode::Ok, StatusCode::try_from(200).unwrap());
        assert_eq!(StatusCode::BadRequest, StatusCode::try_from(400).unwrap());
        assert_eq!(
            StatusCode::InternalServerError,
            StatusCode::try_from(500).unwrap()
        );
        assert!(matches!(
            StatusCode::try_from(404),
            Err(Error::UnknownStatusCode(404))
        ));
    }

    #[test]
    fn default_headers_for_length() {
        assert_eq!(
            vec![
                ("content-length", "42"),
                ("connection", "close"),
                ("content-type", "text/plain"),
            ],
            default_headers(42).iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn headers_written_in_order_then_blank_line() {
        let mut headers = default_headers(5);
        headers.replace("Content-Type", "text/html");
        assert_eq!(
            concat!(
                "content-length: 5\r\n",
                "connection: close\r\n",
                "content-type: text/html\r\n",
                "\r\n",
            ),
            output_of(|w| w.write_headers(&headers))
        );
    }

    #[test]
    fn empty_headers_are_just_blank_line() {
        assert_eq!("\r\n", output_of(|w| w.write_headers(&Headers::new())));
    }

    #[test]
    fn whole_response() {
        let body = "Hello World! My payload includes a trailing CRLF.\r\n";
        assert_eq!(
            concat!(
                "HTTP/1.1 200 OK\r\n",
                "content-length: 51\r\n",
                "connection: close\r\n",
                "content-type: text/plain\r\n",
                "\r\n",
                "Hello World! My payload includes a trailing CRLF.\r\n",
            ),
            output_of(|w| {
                w.write_status_line(StatusCode::Ok)?;
                w.write_headers(&default_headers(body.len()))?;
                assert_eq!(body.len(), w.write_body(body)?);
                Ok(())
            })
        );
    }

    #[test]
    fn chunks_then_last_chunk() {
        assert_eq!(
            "3\r\nfoo\r\n3\r\nbar\r\n0\r\n",
            output_of(|w| {
                assert_eq!(8, w.write_chunked_body("foo")?);
                assert_eq!(8, w.write_chunked_body("bar")?);
                assert_eq!(3, w.write_chunked_body_done()?);
                Ok(())
            })
        );
    }

    #[test]
    fn chunk_size_is_lowercase_hexadecimal() {
        let chunk = "x".repeat(0xab);
        let output = output_of(|w| w.write_chunked_body(&chunk).map(|_| ()));
        assert!(output.starts_with("ab\r\nxxx"));
        assert!(output.ends_with("xxx\r\n"));
    }

    #[test]
    fn empty_chunk_is_well_formed() {
        assert_eq!(
            "0\r\n\r\n",
            output_of(|w| w.write_chunked_body("").map(|_| ()))
        );
    }

    #[test]
    fn chunked_body_with_trailers_decodes() {
        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", "6");
        trailers.set("X-Checksum", "abc123");
        let output = output_of(|w| {
            w.write_chunked_body("foo")?;
            w.write_chunked_body("bar")?;
            w.write_chunked_body_done()?;
            w.write_trailers(&trailers)
        });
        assert_eq!(
            concat!(
                "3\r\nfoo\r\n3\r\nbar\r\n0\r\n",
                "x-content-length: 6\r\n",
                "x-checksum: abc123\r\n",
                "\r\n",
            ),
            output
        );
        let mut body = ChunkedBody::new();
        assert!(matches!(
            body.decode(&output),
            Ok((DecodeStatus::Complete, consumed)) if consumed == output.len()
        ));
        assert_eq!(b"foobar", body.body());
        assert_eq!(&trailers, body.trailer());
    }

    #[test]
    fn chunked_body_without_trailers_decodes() {
        let output = output_of(|w| {
            w.write_chunked_body("foo")?;
            w.write_chunked_body_done()?;
            w.write_trailers(&Headers::new())
        });
        assert_eq!("3\r\nfoo\r\n0\r\n\r\n", output);
        let mut body = ChunkedBody::new();
        assert!(matches!(
            body.decode(&output),
            Ok((DecodeStatus::Complete, 13))
        ));
        assert_eq!(b"foo", body.body());
    }

    #[test]
    fn write_failure_is_passed_through() {
        let mut writer = Writer::new(FailingSink {
            capacity: 10,
            written: Vec::new(),
        });
        assert!(matches!(
            writer.write_status_line(StatusCode::Ok),
            Err(Error::Io(error)) if error.kind() == std::io::ErrorKind::BrokenPipe
        ));
        assert_eq!(b"HTTP/1.1 2", &writer.get_ref().written[..]);
    }
}
