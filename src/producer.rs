//! Line-delimited JSON response writer

use crate::types::InferenceResponse;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// One output line, mirroring the shape of the input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseLine {
    Single(InferenceResponse),
    Batch(Vec<InferenceResponse>),
    Error { error: String },
}

impl ResponseLine {
    pub fn error(message: impl ToString) -> Self {
        ResponseLine::Error {
            error: message.to_string(),
        }
    }
}

/// Writes responses (stdout in the binary), one JSON document per line.
pub struct ResponseProducer<W> {
    writer: W,
}

impl<W: Write> ResponseProducer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write and flush one response line.
    pub fn publish(&mut self, line: &ResponseLine) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        debug!(error = matches!(line, ResponseLine::Error { .. }), "Published response");
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_lines() {
        let mut producer = ResponseProducer::new(Vec::new());
        producer
            .publish(&ResponseLine::Single(InferenceResponse::new("High", 0)))
            .unwrap();
        producer
            .publish(&ResponseLine::Batch(vec![
                InferenceResponse::new("Low", 1),
                InferenceResponse::new("Medium", 2),
            ]))
            .unwrap();
        producer
            .publish(&ResponseLine::error("Schema mismatch: bad price"))
            .unwrap();

        let output = String::from_utf8(producer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], r#"{"label":"High","class_index":0}"#);
        assert_eq!(
            lines[1],
            r#"[{"label":"Low","class_index":1},{"label":"Medium","class_index":2}]"#
        );
        assert_eq!(lines[2], r#"{"error":"Schema mismatch: bad price"}"#);
    }
}
