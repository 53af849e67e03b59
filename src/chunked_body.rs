//! This module contains a decoder for message bodies framed with the
//! `chunked` transfer coding.  Requests are never read this way; the decoder
//! is for the receiving end of the chunked responses which [`Writer`]
//! produces.
//!
//! [`Writer`]: crate::Writer

use super::{
    error::Error,
    find_crlf,
    headers::Headers,
    ParseStatus,
    CRLF,
};

fn parse_chunk_size(chunk_size_line: &str) -> Result<usize, Error> {
    // Chunk extensions are allowed after the size, but carry nothing this
    // decoder needs.
    let chunk_size = chunk_size_line
        .split(';')
        .next()
        .unwrap_or(chunk_size_line)
        .trim_end();
    usize::from_str_radix(chunk_size, 16).map_err(Error::InvalidChunkSize)
}

/// This indicates whether or not the decoder has seen the whole body.
#[derive(Debug, Eq, PartialEq)]
pub enum DecodeStatus {
    Complete,
    Incomplete,
}

enum Step {
    Continue,
    Finished,
    NeedMore,
}

#[derive(Debug, Eq, PartialEq)]
enum ChunkedBodyState {
    ChunkData,
    ChunkSize,
    ChunkTerminator,
    Done,
    Trailer,
}

/// This reassembles a body delivered with the `chunked` transfer coding,
/// along with any trailer fields sent after the last chunk.
#[derive(Debug)]
pub struct ChunkedBody {
    body: Vec<u8>,
    chunk_bytes_needed: usize,
    state: ChunkedBodyState,
    trailer: Headers,
}

impl ChunkedBody {
    /// The body bytes decoded so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode as much of the given input as possible, returning whether the
    /// body is now complete and how many bytes of input were consumed.
    /// Unconsumed input should be offered again, with more appended, on the
    /// next call.  Input past the end of the body is never consumed.
    pub fn decode<T>(
        &mut self,
        input: T,
    ) -> Result<(DecodeStatus, usize), Error>
    where
        T: AsRef<[u8]>,
    {
        let input = input.as_ref();
        let mut total_consumed = 0;
        loop {
            let remainder = &input[total_consumed..];
            let (step, consumed) = match self.state {
                ChunkedBodyState::ChunkData => self.decode_data(remainder),
                ChunkedBodyState::ChunkSize => self.decode_size(remainder)?,
                ChunkedBodyState::ChunkTerminator => {
                    self.decode_terminator(remainder)?
                },
                ChunkedBodyState::Trailer => self.decode_trailer(remainder)?,
                ChunkedBodyState::Done => (Step::Finished, 0),
            };
            total_consumed += consumed;
            match step {
                Step::Continue => (),
                Step::Finished => {
                    return Ok((DecodeStatus::Complete, total_consumed));
                },
                Step::NeedMore => {
                    return Ok((DecodeStatus::Incomplete, total_consumed));
                },
            }
        }
    }

    fn decode_data(
        &mut self,
        input: &[u8],
    ) -> (Step, usize) {
        let consumed = input.len().min(self.chunk_bytes_needed);
        self.chunk_bytes_needed -= consumed;
        self.body.extend_from_slice(&input[..consumed]);
        if self.chunk_bytes_needed == 0 {
            self.state = ChunkedBodyState::ChunkTerminator;
            (Step::Continue, consumed)
        } else {
            (Step::NeedMore, consumed)
        }
    }

    fn decode_size(
        &mut self,
        input: &[u8],
    ) -> Result<(Step, usize), Error> {
        let line_end = match find_crlf(input) {
            Some(line_end) => line_end,
            None => return Ok((Step::NeedMore, 0)),
        };
        let chunk_size_line = &input[..line_end];
        let chunk_size_line =
            std::str::from_utf8(chunk_size_line).map_err(|_| {
                Error::ChunkSizeLineNotValidText(chunk_size_line.to_vec())
            })?;
        self.chunk_bytes_needed = parse_chunk_size(chunk_size_line)?;
        self.state = if self.chunk_bytes_needed == 0 {
            ChunkedBodyState::Trailer
        } else {
            // The chunk size comes from the peer, so only make room for the
            // part of the chunk already at hand.
            let available = input.len() - line_end - CRLF.len();
            self.body.reserve(self.chunk_bytes_needed.min(available));
            ChunkedBodyState::ChunkData
        };
        Ok((Step::Continue, line_end + CRLF.len()))
    }

    fn decode_terminator(
        &mut self,
        input: &[u8],
    ) -> Result<(Step, usize), Error> {
        match input {
            [] | [b'\r'] => Ok((Step::NeedMore, 0)),
            [b'\r', b'\n', ..] => {
                self.state = ChunkedBodyState::ChunkSize;
                Ok((Step::Continue, CRLF.len()))
            },
            _ => Err(Error::InvalidChunkTerminator(input.to_vec())),
        }
    }

    fn decode_trailer(
        &mut self,
        input: &[u8],
    ) -> Result<(Step, usize), Error> {
        let (status, consumed) = self
            .trailer
            .parse(input)
            .map_err(|error| Error::Trailer(Box::new(error)))?;
        match (status, consumed) {
            (ParseStatus::Complete, _) => {
                self.state = ChunkedBodyState::Done;
                Ok((Step::Finished, consumed))
            },
            (ParseStatus::Incomplete, 0) => Ok((Step::NeedMore, 0)),
            (ParseStatus::Incomplete, _) => Ok((Step::Continue, consumed)),
        }
    }

    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    #[must_use]
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            chunk_bytes_needed: 0,
            state: ChunkedBodyState::ChunkSize,
            trailer: Headers::new(),
        }
    }

    /// The trailer fields which followed the last chunk.
    #[must_use]
    pub fn trailer(&self) -> &Headers {
        &self.trailer
    }
}

impl Default for ChunkedBody {
    fn default() -> Self {
        Self::new()
    }
}
