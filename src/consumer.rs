//! Line-delimited JSON request reader

use crate::types::InferenceRequest;
use std::io::BufRead;
use tracing::{debug, info};

/// One input line: a single request or a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestLine {
    Single(InferenceRequest),
    Batch(Vec<InferenceRequest>),
}

impl RequestLine {
    pub fn requests(&self) -> &[InferenceRequest] {
        match self {
            RequestLine::Single(request) => std::slice::from_ref(request),
            RequestLine::Batch(requests) => requests,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, RequestLine::Batch(_))
    }
}

/// Parse one trimmed line. Arrays are batches, anything else a single request,
/// so serde reports the actual missing or mistyped field.
pub fn parse_line(line: &[u8]) -> Result<RequestLine, String> {
    let parsed = if line.starts_with(b"[") {
        serde_json::from_slice(line).map(RequestLine::Batch)
    } else {
        serde_json::from_slice(line).map(RequestLine::Single)
    };
    parsed.map_err(|e| e.to_string())
}

/// Reads requests from a line-oriented source (stdin in the binary).
pub struct RequestConsumer<R> {
    reader: R,
    line_number: u64,
}

impl<R: BufRead> RequestConsumer<R> {
    pub fn new(reader: R) -> Self {
        info!("Reading JSON requests, one per line");
        Self {
            reader,
            line_number: 0,
        }
    }

    /// Next non-blank line, parsed. `None` at end of input.
    ///
    /// The outer error is an I/O failure; the inner one a malformed line
    /// (including bytes that are not UTF-8).
    pub fn next_line(&mut self) -> std::io::Result<Option<(u64, Result<RequestLine, String>)>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            debug!(line = self.line_number, bytes = line.len(), "Received request line");
            return Ok(Some((self.line_number, parse_line(line))));
        }
    }

    /// Lines read so far, including blank ones.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CHEESECAKE: &str = r#"{"RestaurantID":"R003","MenuCategory":"Desserts","Ingredients":"Chocolate Butter Sugar Eggs","MenuItem":"Newyork Cheesecake","Price":18.66}"#;

    #[test]
    fn test_single_and_batch_lines() {
        let input = format!("{}\n\n[{},{}]\n", CHEESECAKE, CHEESECAKE, CHEESECAKE);
        let mut consumer = RequestConsumer::new(Cursor::new(input));

        let (line, single) = consumer.next_line().unwrap().unwrap();
        let single = single.unwrap();
        assert_eq!(line, 1);
        assert!(!single.is_batch());
        assert_eq!(single.requests()[0].menu_item, "Newyork Cheesecake");

        let (line, batch) = consumer.next_line().unwrap().unwrap();
        assert_eq!(line, 3);
        assert_eq!(batch.unwrap().requests().len(), 2);

        assert!(consumer.next_line().unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_is_reported() {
        let input = "{\"RestaurantID\": \"R003\"}\n";
        let mut consumer = RequestConsumer::new(Cursor::new(input));

        let (_, parsed) = consumer.next_line().unwrap().unwrap();
        let err = parsed.unwrap_err();
        assert!(err.contains("missing field"), "unexpected error: {}", err);
    }

    #[test]
    fn test_batch_error_names_field() {
        let err = parse_line(br#"[{"RestaurantID": "R003", "Price": 1.0}]"#).unwrap_err();
        assert!(err.contains("missing field"), "unexpected error: {}", err);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_reading() {
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(CHEESECAKE.as_bytes());
        input.push(b'\n');
        let mut consumer = RequestConsumer::new(Cursor::new(input));

        let (line, bad) = consumer.next_line().unwrap().unwrap();
        assert_eq!(line, 1);
        assert!(bad.is_err());

        let (line, good) = consumer.next_line().unwrap().unwrap();
        assert_eq!(line, 2);
        assert_eq!(good.unwrap().requests()[0].menu_item, "Newyork Cheesecake");

        assert!(consumer.next_line().unwrap().is_none());
    }
}
