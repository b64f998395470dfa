//! Background parsing.
//!
//! A [`GffParser`] runs on its own thread and owns the context it builds
//! until it is done; the finished [`ParseOutput`] crosses back over a
//! channel in one piece. The caller can cancel between lines.
use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
};
use std::path::Path;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context as _;
use crossbeam::channel::{
    Receiver,
    RecvError,
    TryRecvError,
};
use log::debug;

use crate::io::gff::{
    GffError,
    GffParser,
    ParseOutput,
    ParserConfig,
};

pub type LoadResult = Result<ParseOutput, GffError>;

/// Handle on a parse running in the background.
pub struct LoadHandle {
    receiver:     Receiver<LoadResult>,
    cancel:       Arc<AtomicBool>,
    _join_handle: JoinHandle<()>,
}

impl LoadHandle {
    /// Asks the worker to stop before its next line.
    pub fn cancel(&self) { self.cancel.store(true, Ordering::Relaxed); }

    pub fn is_cancelled(&self) -> bool { self.cancel.load(Ordering::Relaxed) }

    /// Blocks until the worker delivers its result.
    pub fn wait(self) -> anyhow::Result<LoadResult> {
        self.receiver
            .recv()
            .map_err(|RecvError| anyhow::anyhow!("Loader thread exited without a result"))
    }

    /// The result, if the worker has finished.
    pub fn try_result(&self) -> anyhow::Result<Option<LoadResult>> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                anyhow::bail!("Loader thread exited without a result")
            },
        }
    }
}

/// Parses `reader` with `config` on a worker thread.
pub fn spawn_loader<R>(
    reader: R,
    config: ParserConfig,
) -> LoadHandle
where
    R: BufRead + Send + 'static, {
    let cancel = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = crossbeam::channel::bounded(1);

    let flag = cancel.clone();
    let join_handle = std::thread::spawn(move || {
        let mut parser = GffParser::new(config).with_cancel_flag(flag);
        let result = parser
            .parse_reader(reader)
            .and_then(|_| parser.finish());
        if sender.send(result).is_err() {
            debug!("Loader result dropped, receiver gone");
        }
    });

    LoadHandle {
        receiver,
        cancel,
        _join_handle: join_handle,
    }
}

/// Opens `path` and parses it on a worker thread.
pub fn spawn_file_loader<P: AsRef<Path>>(
    path: P,
    config: ParserConfig,
) -> anyhow::Result<LoadHandle> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Could not open {}", path.display()))?;
    Ok(spawn_loader(BufReader::new(file), config))
}
