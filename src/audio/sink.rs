//! `rodio`-backed transports.
//!
//! Each transport owns one `Sink` on a shared output stream. Seeking rebuilds
//! the sink and skips into the file, which works for every format `rodio`
//! decodes.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::error::TransportError;
use crate::import::probe;

use super::transport::{Transport, TransportBackend};

/// Opens files on the default audio output device.
///
/// The output stream is opened lazily on the first `open` and kept for the
/// backend's lifetime.
#[derive(Default)]
pub struct RodioBackend {
    stream: Option<Rc<OutputStream>>,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> Result<Rc<OutputStream>, TransportError> {
        if let Some(stream) = &self.stream {
            return Ok(stream.clone());
        }
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| TransportError::Output(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped.
        stream.log_on_drop(false);
        let stream = Rc::new(stream);
        self.stream = Some(stream.clone());
        Ok(stream)
    }
}

impl TransportBackend for RodioBackend {
    type Transport = RodioTransport;

    fn open(&mut self, location: &Path) -> Result<RodioTransport, TransportError> {
        // Decode before touching the output device so bad files fail fast.
        let source = open_source(location)?;
        let duration = source
            .total_duration()
            .or_else(|| probe(location).duration_secs.map(Duration::from_secs_f64));

        let stream = self.stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(source);
        sink.pause();

        debug!(path = %location.display(), ?duration, "opened rodio transport");

        Ok(RodioTransport {
            stream,
            sink,
            path: location.to_path_buf(),
            duration,
            offset: Duration::ZERO,
        })
    }
}

pub struct RodioTransport {
    stream: Rc<OutputStream>,
    sink: Sink,
    path: PathBuf,
    duration: Option<Duration>,
    /// Where the current sink started within the file.
    offset: Duration,
}

impl Transport for RodioTransport {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek(&mut self, position: Duration) -> Result<(), TransportError> {
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        let source = open_source(&self.path)?.skip_duration(position);

        let sink = Sink::connect_new(self.stream.mixer());
        if self.sink.is_paused() {
            sink.pause();
        }
        sink.append(source);

        self.sink.stop();
        self.sink = sink;
        self.offset = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.offset + self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>, TransportError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TransportError::NotFound(path.to_path_buf()),
        _ => TransportError::Open {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    Decoder::new(BufReader::new(file)).map_err(|e| TransportError::Unsupported {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
