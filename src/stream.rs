//! Async adapters around the parser, writer and store
//!
//! Parsing runs on a blocking task and hands quads over a bounded channel;
//! writing runs on a task that drains a channel of quads. Dropping either
//! end of a channel stops the other side.

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::model::{NamedNode, Quad};
use crate::parser::{ParseError, ParseResult, ParseSink, Parser, ParserOptions};
use crate::store::Store;
use crate::writer::{SerializeResult, Writer, WriterOptions};

/// Quads buffered between a producer task and its consumer
const CHANNEL_CAPACITY: usize = 1024;

/// Forwards parse events into the channel
struct ChannelSink {
    tx: Sender<ParseResult<Quad>>,
    closed: bool,
}

impl ParseSink for ChannelSink {
    fn on_quad(&mut self, quad: Quad) {
        if !self.closed && self.tx.blocking_send(Ok(quad)).is_err() {
            self.closed = true;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn on_prefix(&mut self, prefix: &str, iri: &NamedNode) {
        debug!(prefix, iri = iri.as_str(), "stream parser saw prefix");
    }

    fn on_end(&mut self, result: ParseResult<()>) {
        match result {
            Err(error) if !self.closed => {
                if self.tx.blocking_send(Err(error)).is_err() {
                    debug!("stream parser error dropped with its receiver");
                }
            }
            _ => {}
        }
    }
}

/// Reader that fails once nobody is listening for quads any more
struct Cancellable<R> {
    inner: R,
    tx: Sender<ParseResult<Quad>>,
}

impl<R: Read> Read for Cancellable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.tx.is_closed() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "quad stream dropped"));
        }
        self.inner.read(buf)
    }
}

/// Stream of quads parsed on a background task
///
/// Items arrive in document order; a parse error is the last item.
pub struct StreamParser {
    inner: ReceiverStream<ParseResult<Quad>>,
}

impl StreamParser {
    /// Start parsing `reader`; must be called within a tokio runtime
    pub fn spawn<R>(reader: R, options: ParserOptions) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::task::spawn_blocking(move || {
            let parser = Parser::new(options);
            let reader = Cancellable {
                inner: reader,
                tx: tx.clone(),
            };
            parser.parse_reader(reader, &mut ChannelSink { tx, closed: false });
        });
        Self {
            inner: ReceiverStream::new(rx),
        }
    }

    /// Parse a string on a background task
    pub fn from_text(text: impl Into<String>, options: ParserOptions) -> Self {
        Self::spawn(io::Cursor::new(text.into().into_bytes()), options)
    }
}

impl Stream for StreamParser {
    type Item = Result<Quad, ParseError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Serializes quads sent over a channel on a background task
pub struct StreamWriter;

impl StreamWriter {
    /// Start a writer task; it finishes with the document text once every
    /// sender is dropped. Must be called within a tokio runtime.
    pub fn spawn(options: WriterOptions) -> (Sender<Quad>, JoinHandle<SerializeResult<String>>) {
        let (tx, mut rx) = mpsc::channel::<Quad>(CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            let mut writer = Writer::new(options);
            while let Some(quad) = rx.recv().await {
                writer.add_quad(&quad)?;
            }
            writer.end_to_string()
        });
        (tx, handle)
    }
}

impl Store {
    /// Add every quad of a stream; returns how many were new
    ///
    /// Stops at the first error, keeping the quads added before it.
    pub async fn import<S, E>(&mut self, stream: S) -> Result<usize, E>
    where
        S: Stream<Item = Result<Quad, E>>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut added = 0;
        while let Some(quad) = stream.next().await {
            if self.add(quad?) {
                added += 1;
            }
        }
        debug!("Imported {} quads", added);
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Format;

    #[tokio::test]
    async fn test_stream_parser_yields_quads_in_order() {
        let text = "<http://ex.org/a> <http://ex.org/p> \"1\" .\n\
                    <http://ex.org/a> <http://ex.org/p> \"2\" .\n";
        let quads: Vec<_> = StreamParser::from_text(text, ParserOptions::new(Format::N_TRIPLES))
            .collect()
            .await;
        assert_eq!(quads.len(), 2);
        let values: Vec<String> = quads
            .into_iter()
            .map(|quad| quad.unwrap().object().to_string())
            .collect();
        assert_eq!(values, vec!["\"1\"", "\"2\""]);
    }

    #[tokio::test]
    async fn test_stream_parser_ends_with_error() {
        let text = "<http://ex.org/a> <http://ex.org/p> <http://ex.org/o> .\n<http://ex.org/a> .\n";
        let items: Vec<_> = StreamParser::from_text(text, ParserOptions::new(Format::N_TRIPLES))
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        let error = items[1].as_ref().unwrap_err();
        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn test_channel_sink_closes_when_receiver_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut sink = ChannelSink { tx, closed: false };
        let text = "<http://ex.org/a> <http://ex.org/p> \"1\" .\n\
                    <http://ex.org/a> <http://ex.org/p> \"2\" .\n\
                    <http://ex.org/a> .\n";
        Parser::new(ParserOptions::new(Format::N_TRIPLES)).parse_reader(text.as_bytes(), &mut sink);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_stream_writer_collects_text() {
        let (tx, handle) = StreamWriter::spawn(WriterOptions::new(Format::N_TRIPLES));
        tx.send(Quad::triple(
            NamedNode::new("http://ex.org/a"),
            NamedNode::new("http://ex.org/p"),
            NamedNode::new("http://ex.org/o"),
        ))
        .await
        .unwrap();
        drop(tx);
        let text = handle.await.unwrap().unwrap();
        assert_eq!(text, "<http://ex.org/a> <http://ex.org/p> <http://ex.org/o> .\n");
    }

    #[tokio::test]
    async fn test_import_into_store() {
        let text = "@prefix ex: <http://ex.org/>.\nex:a ex:p ex:b, ex:c.\n";
        let stream = StreamParser::from_text(text, ParserOptions::new(Format::TURTLE));
        let mut store = Store::new();
        assert_eq!(store.import(stream).await.unwrap(), 2);
        assert_eq!(store.len(), 2);
    }
}
