//! SMTP response parsing.

use super::error::{Result, TransportError};

/// A complete (possibly multi-line) SMTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The SMTP status code.
    pub code: u16,
    /// Message text, one entry per response line.
    pub lines: Vec<String>,
}

impl Response {
    /// The message text joined into a single string.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines.join(" ")
    }

    /// Whether this is a 2xx response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Whether this is a 3xx intermediate response (e.g. 354 after DATA).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// Whether this is a 4xx or 5xx response.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.code >= 400 && self.code < 600
    }

    /// Try to parse one complete response from the front of `buffer`.
    ///
    /// Returns the response and the number of bytes it occupied, or
    /// `None` when the buffer does not yet hold a complete response.
    pub(crate) fn parse(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let text = std::str::from_utf8(buffer)?;

        let mut consumed = 0;
        let mut code = None;
        let mut lines = Vec::new();

        loop {
            let rest = &text[consumed..];
            let Some(newline) = rest.find('\n') else {
                // Last line still incomplete; wait for more data
                return Ok(None);
            };

            let raw = rest[..newline].trim_end_matches('\r');
            consumed += newline + 1;

            if raw.is_empty() {
                continue;
            }

            let (line_code, last, message) = Self::split_line(raw)?;
            match code {
                None => code = Some(line_code),
                Some(expected) if expected != line_code => {
                    return Err(TransportError::Parse(format!(
                        "status code changed mid-response: expected {expected}, got {line_code}"
                    )));
                }
                Some(_) => {}
            }
            lines.push(message.to_string());

            if last {
                let code = code.unwrap_or(line_code);
                return Ok(Some((Self { code, lines }, consumed)));
            }
        }
    }

    /// Split a single response line into code, is-last flag, and message.
    fn split_line(line: &str) -> Result<(u16, bool, &str)> {
        if line.len() < 3 {
            return Err(TransportError::Parse(format!(
                "response line too short: '{line}'"
            )));
        }

        let code_str = line
            .get(..3)
            .ok_or_else(|| TransportError::Parse(format!("malformed response line: '{line}'")))?;
        let code = code_str
            .parse::<u16>()
            .map_err(|_| TransportError::Parse(format!("invalid status code: '{code_str}'")))?;

        // A space after the code ends the response; a dash continues it
        let (last, message) = match line.as_bytes().get(3) {
            Some(b' ') | None => (true, line.get(4..).unwrap_or_default()),
            Some(b'-') => (false, line.get(4..).unwrap_or_default()),
            Some(_) => {
                return Err(TransportError::Parse(format!(
                    "invalid separator in response line: '{line}'"
                )));
            }
        };

        Ok((code, last, message))
    }
}
