//! [`JsonLinesFeed`] – detection feed written by an external detector.
//!
//! The detector process writes one JSON object per captured frame, one frame
//! per line:
//!
//! ```text
//! {"detections":[{"family":"primary","tag_id":4,"pose":{"x":0.02,"y":0.0,"z":0.61}}]}
//! {"detections":[]}
//! ```
//!
//! A blank line is an empty frame. A line that does not decode is a
//! transient [`TagError::FrameRead`]; an I/O error on the stream itself is a
//! [`TagError::SourceFault`].
//!
//! What end of stream means depends on the [`FeedMode`]. On a FIFO
//! ([`FeedMode::Stream`]) the detector has closed its end and the feed is
//! finished. On a regular file ([`FeedMode::Follow`]) the reader has only
//! caught up with the writer: the call yields no frame, the feed stays open,
//! and a half-written line is held back until its newline arrives.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tagsense_types::{Frame, TagError};
use tracing::{debug, trace};

use crate::source::FrameSource;

/// How the feed treats end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// End of stream is the end of the feed.
    #[default]
    Stream,
    /// End of stream means "nothing new yet"; keep reading as the file grows.
    Follow,
}

/// Line-delimited JSON frame reader.
pub struct JsonLinesFeed<R> {
    id: String,
    reader: Option<R>,
    mode: FeedMode,
    /// Bytes read so far for the current line.
    line: String,
}

impl JsonLinesFeed<BufReader<File>> {
    /// Open the feed at `path`. A regular file is followed as it grows; any
    /// other path (a FIFO) is read as a stream. Opening a FIFO blocks until
    /// the detector connects.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::SourceUnavailable`] if the path cannot be opened.
    pub fn open(id: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, TagError> {
        let id = id.into();
        let path = path.as_ref();
        let unavailable = |e: std::io::Error| TagError::SourceUnavailable {
            source_id: id.clone(),
            details: format!("cannot open {}: {e}", path.display()),
        };
        let file = File::open(path).map_err(unavailable)?;
        let mode = if file.metadata().map_err(unavailable)?.is_file() {
            FeedMode::Follow
        } else {
            FeedMode::Stream
        };
        Ok(Self::from_reader(id, BufReader::new(file)).with_mode(mode))
    }
}

impl<R: BufRead> JsonLinesFeed<R> {
    /// Wrap an already-open reader in [`FeedMode::Stream`].
    pub fn from_reader(id: impl Into<String>, reader: R) -> Self {
        Self {
            id: id.into(),
            reader: Some(reader),
            mode: FeedMode::Stream,
            line: String::new(),
        }
    }

    pub fn with_mode(mut self, mode: FeedMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    fn decode_line(&mut self) -> Result<Option<Frame>, TagError> {
        let line = std::mem::take(&mut self.line);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(Frame::default()));
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| TagError::FrameRead {
                source_id: self.id.clone(),
                details: format!("undecodable frame: {e}"),
            })
    }
}

impl<R: BufRead> FrameSource for JsonLinesFeed<R> {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, TagError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        // Appends to whatever a previous call left of an unterminated line.
        let read = match reader.read_line(&mut self.line) {
            Ok(n) => n,
            Err(e) => {
                self.line.clear();
                return Err(TagError::SourceFault {
                    source_id: self.id.clone(),
                    details: e.to_string(),
                });
            }
        };

        if self.line.ends_with('\n') {
            return self.decode_line();
        }
        match self.mode {
            FeedMode::Follow => {
                trace!(source = %self.id, pending = self.line.len(), "waiting for the detector");
                Ok(None)
            }
            FeedMode::Stream if read == 0 => {
                debug!(source = %self.id, "detection feed reached end of stream");
                Ok(None)
            }
            // Last line of a closed stream, written without a newline.
            FeedMode::Stream => self.decode_line(),
        }
    }

    fn is_finished(&self) -> bool {
        self.reader.is_none() || self.mode == FeedMode::Stream
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            self.line.clear();
            debug!(source = %self.id, "detection feed released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tagsense_types::TagFamily;

    fn feed(text: &str) -> JsonLinesFeed<Cursor<Vec<u8>>> {
        JsonLinesFeed::from_reader("camera8", Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn reads_frames_in_order_then_ends() {
        let mut src = feed(concat!(
            r#"{"detections":[{"family":"primary","pose":{"x":0.1,"z":0.9}}]}"#,
            "\n",
            r#"{"detections":[{"family":"secondary"}]}"#,
            "\n",
        ));
        let first = src.next_frame().unwrap().unwrap();
        assert_eq!(first.detections[0].family, TagFamily::Primary);
        assert_eq!(first.detections[0].forward_distance(), Some(0.9));

        let second = src.next_frame().unwrap().unwrap();
        assert_eq!(second.detections[0].family, TagFamily::Secondary);

        assert!(src.next_frame().unwrap().is_none());
        assert!(src.is_finished());
    }

    #[test]
    fn unterminated_last_line_of_stream_is_decoded() {
        let mut src = feed(r#"{"detections":[{"family":"secondary"}]}"#);
        assert_eq!(src.next_frame().unwrap().unwrap().detections.len(), 1);
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn blank_line_is_empty_frame() {
        let mut src = feed("\n{}\n");
        assert!(src.next_frame().unwrap().unwrap().is_empty());
        assert!(src.next_frame().unwrap().unwrap().is_empty());
    }

    #[test]
    fn garbage_line_is_transient_and_feed_continues() {
        let mut src = feed("not json\n{\"detections\":[]}\n");
        let err = src.next_frame().unwrap_err();
        assert!(matches!(err, TagError::FrameRead { .. }));
        assert!(err.is_transient());
        assert!(src.next_frame().unwrap().is_some());
    }

    #[test]
    fn released_feed_yields_nothing() {
        let mut src = feed("{}\n{}\n").with_mode(FeedMode::Follow);
        assert!(!src.is_finished());
        src.release();
        src.release();
        assert!(src.next_frame().unwrap().is_none());
        assert!(src.is_finished());
    }

    #[test]
    fn open_missing_path_is_unavailable() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let result = JsonLinesFeed::open("camera8", dir.path().join("missing.jsonl"));
        assert!(matches!(result, Err(TagError::SourceUnavailable { .. })));
    }

    #[test]
    fn open_reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        writeln!(
            file,
            r#"{{"detections":[{{"family":"secondary","pose":{{"x":0.0,"z":0.3}}}}]}}"#
        )
        .unwrap();
        let mut src = JsonLinesFeed::open("camera8", file.path()).unwrap();
        assert_eq!(src.id(), "camera8");
        assert_eq!(src.mode(), FeedMode::Follow);
        let frame = src.next_frame().unwrap().unwrap();
        assert_eq!(frame.detections[0].forward_distance(), Some(0.3));
    }

    #[test]
    fn followed_file_waits_for_the_writer_at_end_of_stream() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        writeln!(file, r#"{{"detections":[]}}"#).unwrap();
        file.flush().unwrap();

        let mut src = JsonLinesFeed::open("camera8", file.path()).unwrap();
        assert!(src.next_frame().unwrap().unwrap().is_empty());

        // Caught up with the writer: no frame, but not finished either.
        assert!(src.next_frame().unwrap().is_none());
        assert!(!src.is_finished());

        writeln!(
            file,
            r#"{{"detections":[{{"family":"primary","pose":{{"x":0.0,"z":1.5}}}}]}}"#
        )
        .unwrap();
        file.flush().unwrap();
        let frame = src.next_frame().unwrap().unwrap();
        assert_eq!(frame.detections[0].forward_distance(), Some(1.5));
    }

    #[test]
    fn half_written_line_is_held_until_complete() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        let mut src = JsonLinesFeed::open("camera8", file.path()).unwrap();

        write!(file, r#"{{"detections":["#).unwrap();
        file.flush().unwrap();
        assert!(src.next_frame().unwrap().is_none());

        writeln!(file, r#"{{"family":"secondary","pose":{{"x":0.2,"z":0.7}}}}]}}"#).unwrap();
        file.flush().unwrap();
        let frame = src.next_frame().unwrap().unwrap();
        assert_eq!(frame.detections[0].family, TagFamily::Secondary);
        assert_eq!(frame.detections[0].forward_distance(), Some(0.7));
        assert!(src.next_frame().unwrap().is_none());
    }
}
