//! This module contains the collection of header fields which makes up the
//! header section of an HTTP message, or the trailer section of a chunked
//! body.  Header names are case-insensitive; they are stored lower-cased and
//! kept in the order in which they were first added.

use super::{
    error::Error,
    find_crlf,
    partial_line_too_long,
    ParseStatus,
    CRLF,
};

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%'*+-.^_`|~".contains(c)
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn parse_header_line(header_line: &str) -> Result<(&str, &str), Error> {
    let delimiter = header_line
        .find(':')
        .ok_or_else(|| Error::HeaderLineMissingColon(header_line.into()))?;
    let name = &header_line[..delimiter];
    if name.is_empty() || name.starts_with(is_space) || name.ends_with(is_space)
    {
        return Err(Error::HeaderNameInvalid(header_line.into()));
    }
    if !name.chars().all(is_token_char) {
        return Err(Error::HeaderNameInvalidCharacter(header_line.into()));
    }
    let value = header_line[delimiter + 1..].trim();
    Ok((name, value))
}

/// This is an ordered collection of HTTP header fields.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    fn position<N>(
        &self,
        name: N,
    ) -> Option<usize>
    where
        N: AsRef<str>,
    {
        let name = name.as_ref();
        self.fields
            .iter()
            .position(|(field_name, _)| field_name.eq_ignore_ascii_case(name))
    }

    /// Look up the value of the header with the given name, ignoring case.
    #[must_use]
    pub fn get<N>(
        &self,
        name: N,
    ) -> Option<&str>
    where
        N: AsRef<str>,
    {
        self.position(name).map(|i| self.fields[i].1.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate the headers as `(name, value)` pairs, in the order in which
    /// each name was first added.  Names are lower-cased.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse at most one header line from the front of the given input.
    ///
    /// Returns [`ParseStatus::Complete`] along with the two bytes consumed
    /// when the input begins with the blank line which ends the header
    /// section.  Otherwise [`ParseStatus::Incomplete`] is returned along with
    /// the number of bytes consumed, which is zero if the input does not yet
    /// hold a whole line.
    pub fn parse<T>(
        &mut self,
        raw_message: T,
    ) -> Result<(ParseStatus, usize), Error>
    where
        T: AsRef<[u8]>,
    {
        self.parse_line(raw_message.as_ref(), None)
    }

    pub(crate) fn parse_line(
        &mut self,
        raw_message: &[u8],
        line_limit: Option<usize>,
    ) -> Result<(ParseStatus, usize), Error> {
        let line_end = match (find_crlf(raw_message), line_limit) {
            (Some(0), _) => return Ok((ParseStatus::Complete, CRLF.len())),
            (Some(line_end), Some(limit)) if line_end > limit => {
                return Err(Error::LineTooLong(raw_message[..limit].to_vec()));
            },
            (Some(line_end), _) => line_end,
            (None, Some(limit))
                if partial_line_too_long(raw_message, limit) =>
            {
                return Err(Error::LineTooLong(raw_message[..limit].to_vec()));
            },
            (None, _) => return Ok((ParseStatus::Incomplete, 0)),
        };
        let header_line = &raw_message[..line_end];
        let header_line = std::str::from_utf8(header_line)
            .map_err(|_| Error::HeaderLineNotValidText(header_line.to_vec()))?;
        let (name, value) = parse_header_line(header_line)?;
        self.set(name, value);
        Ok((ParseStatus::Incomplete, line_end + CRLF.len()))
    }

    /// Remove the header with the given name, ignoring case.
    pub fn remove<N>(
        &mut self,
        name: N,
    ) where
        N: AsRef<str>,
    {
        if let Some(i) = self.position(name) {
            self.fields.remove(i);
        }
    }

    /// Set the header with the given name to the given value, discarding
    /// any value it already had.
    pub fn replace<N, V>(
        &mut self,
        name: N,
        value: V,
    ) where
        N: AsRef<str>,
        V: Into<String>,
    {
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.fields[i].1 = value,
            None => {
                self.fields.push((name.as_ref().to_ascii_lowercase(), value));
            },
        }
    }

    /// Add a value for the header with the given name.  If the header
    /// already has a value, the new value is appended to it, separated by a
    /// comma.
    pub fn set<N, V>(
        &mut self,
        name: N,
        value: V,
    ) where
        N: AsRef<str>,
        V: Into<String>,
    {
        let value = value.into();
        match self.position(&name) {
            Some(i) => {
                let existing = &mut self.fields[i].1;
                existing.push_str(", ");
                existing.push_str(&value);
            },
            None => {
                self.fields.push((name.as_ref().to_ascii_lowercase(), value));
            },
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parse_single_header() {
        let mut headers = Headers::new();
        let input = "Host: localhost:42069\r\n\r\n";
        assert!(matches!(
            headers.parse(input),
            Ok((ParseStatus::Incomplete, 23))
        ));
        assert_eq!(Some("localhost:42069"), headers.get("Host"));
        assert!(matches!(
            headers.parse(&input[23..]),
            Ok((ParseStatus::Complete, 2))
        ));
    }

    #[test]
    fn parse_header_without_space_after_colon() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("X-Foo:1\r\n"),
            Ok((ParseStatus::Incomplete, 9))
        ));
        assert_eq!(Some("1"), headers.get("x-foo"));
    }

    #[test]
    fn parse_header_value_whitespace_is_trimmed() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("Host:    localhost:42069    \r\n"),
            Ok((ParseStatus::Incomplete, 30))
        ));
        assert_eq!(Some("localhost:42069"), headers.get("host"));
    }

    #[test]
    fn parse_needs_whole_line() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("Host: localhost\r"),
            Ok((ParseStatus::Incomplete, 0))
        ));
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_blank_line_ends_header_section() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("\r\nHost: localhost\r\n"),
            Ok((ParseStatus::Complete, 2))
        ));
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_repeated_header_folds_values() {
        let mut headers = Headers::new();
        headers.parse("Set-Person: lane-loves-go\r\n").unwrap();
        headers.parse("Set-Person: prime-loves-zig\r\n").unwrap();
        headers.parse("set-person: tj-loves-ocaml\r\n").unwrap();
        assert_eq!(1, headers.len());
        assert_eq!(
            Some("lane-loves-go, prime-loves-zig, tj-loves-ocaml"),
            headers.get("Set-Person")
        );
    }

    #[test]
    fn parse_missing_colon() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("X-Foo Bar\r\n"),
            Err(Error::HeaderLineMissingColon(line)) if line == "X-Foo Bar"
        ));
    }

    #[test]
    fn parse_space_before_colon() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("       Host : localhost:42069       \r\n\r\n"),
            Err(Error::HeaderNameInvalid(_))
        ));
    }

    #[test]
    fn parse_leading_space_before_name() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse(" X-Foo: 1\r\n"),
            Err(Error::HeaderNameInvalid(_))
        ));
    }

    #[test]
    fn parse_empty_name() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse(": nothing\r\n"),
            Err(Error::HeaderNameInvalid(_))
        ));
    }

    #[test]
    fn parse_space_inside_name() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("X Foo: 1\r\n"),
            Err(Error::HeaderNameInvalidCharacter(_))
        ));
    }

    #[test]
    fn parse_invalid_character_in_name() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("H©st: localhost:42069\r\n\r\n"),
            Err(Error::HeaderNameInvalidCharacter(_))
        ));
        assert!(matches!(
            headers.parse("X(Foo): 1\r\n"),
            Err(Error::HeaderNameInvalidCharacter(_))
        ));
    }

    #[test]
    fn parse_every_token_punctuation_character() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse("!#$%'*+-.^_`|~: ok\r\n"),
            Ok((ParseStatus::Incomplete, 20))
        ));
        assert_eq!(Some("ok"), headers.get("!#$%'*+-.^_`|~"));
    }

    #[test]
    fn parse_line_too_long() {
        let mut headers = Headers::new();
        let line = format!("X-Long: {}\r\n", "x".repeat(20));
        assert!(matches!(
            headers.parse_line(line.as_bytes(), Some(10)),
            Err(Error::LineTooLong(start)) if start == b"X-Long: xx"
        ));
        assert!(matches!(
            headers.parse_line(&line.as_bytes()[..15], Some(10)),
            Err(Error::LineTooLong(_))
        ));
        assert!(matches!(
            headers.parse_line(line.as_bytes(), Some(28)),
            Ok((ParseStatus::Incomplete, 30))
        ));
    }

    #[test]
    fn parse_line_at_limit_waiting_for_line_feed() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.parse_line(b"X-Foo: 123456789\r", Some(16)),
            Ok((ParseStatus::Incomplete, 0))
        ));
        assert!(matches!(
            headers.parse_line(b"X-Foo: 123456789\r\n", Some(16)),
            Ok((ParseStatus::Incomplete, 18))
        ));
        assert_eq!(Some("123456789"), headers.get("X-Foo"));
        assert!(matches!(
            headers.parse_line(b"X-Foo: 1234567890", Some(16)),
            Err(Error::LineTooLong(_))
        ));
    }

    #[test]
    fn set_folds_values() {
        let mut headers = Headers::new();
        headers.set("X-Thing", "a");
        headers.set("x-thing", "b");
        assert_eq!(Some("a, b"), headers.get("X-THING"));
    }

    #[test]
    fn replace_overrides_value_in_place() {
        let mut headers = Headers::new();
        headers.set("Content-Length", "0");
        headers.set("Content-Type", "text/plain");
        headers.replace("content-type", "text/html");
        headers.replace("Connection", "close");
        assert_eq!(
            vec![
                ("content-length", "0"),
                ("content-type", "text/html"),
                ("connection", "close"),
            ],
            headers.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Length", "0");
        headers.set("Connection", "close");
        headers.remove("CONTENT-LENGTH");
        headers.remove("X-Not-There");
        assert_eq!(None, headers.get("Content-Length"));
        assert_eq!(vec![("connection", "close")], headers.iter().collect::<Vec<_>>());
    }
}
