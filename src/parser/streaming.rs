//! Streaming parser
//!
//! Runs the handler state machine on a worker thread and yields bound
//! values matching an element path filter, one at a time, through a
//! single-slot handoff buffer. The producer blocks until the consumer has
//! taken the previous value, so at most one bound value is pending and
//! the document never accumulates in memory.
//!
//! Cancellation unblocks both sides: dropping the parser (or calling
//! [`CancelHandle::cancel`]) stops the worker at its next handoff.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use tracing::debug;

use crate::binding::{BindingRegistry, ParseContext};
use crate::error::{Error, Result};
use crate::instance::BoundValue;
use crate::schema::{SchemaIndex, SchemaSet};

use super::filter::PathFilter;
use super::handler::DocumentHandler;
use super::{drive_events, ParserConfig};

/// One item through the handoff: a bound value or the worker's failure
type StreamItem = std::result::Result<BoundValue, Error>;

struct HandoffState {
    slot: Option<StreamItem>,
    closed: bool,
    cancelled: bool,
}

/// Single-slot blocking handoff between producer and consumer
struct Handoff {
    state: Mutex<HandoffState>,
    signal: Condvar,
}

impl Handoff {
    fn new() -> Self {
        Self {
            state: Mutex::new(HandoffState {
                slot: None,
                closed: false,
                cancelled: false,
            }),
            signal: Condvar::new(),
        }
    }

    /// Producer side: block until the slot is free, then fill it.
    /// Returns false when cancelled.
    fn put(&self, item: StreamItem) -> bool {
        let mut state = self.state.lock().expect("handoff poisoned");
        while state.slot.is_some() && !state.cancelled {
            state = self.signal.wait(state).expect("handoff poisoned");
        }
        if state.cancelled {
            return false;
        }
        state.slot = Some(item);
        self.signal.notify_all();
        true
    }

    /// Consumer side: block until a value, end-of-stream (None), or
    /// cancellation (also None)
    fn take(&self) -> Option<StreamItem> {
        let mut state = self.state.lock().expect("handoff poisoned");
        while state.slot.is_none() && !state.closed && !state.cancelled {
            state = self.signal.wait(state).expect("handoff poisoned");
        }
        if state.cancelled {
            return None;
        }
        let item = state.slot.take();
        if item.is_some() {
            self.signal.notify_all();
        }
        item
    }

    /// Producer finished; wake a waiting consumer
    fn close(&self) {
        let mut state = self.state.lock().expect("handoff poisoned");
        state.closed = true;
        self.signal.notify_all();
    }

    /// Unblock both sides permanently
    fn cancel(&self) {
        let mut state = self.state.lock().expect("handoff poisoned");
        state.cancelled = true;
        self.signal.notify_all();
    }
}

/// Handle for cancelling a streaming parse from any thread
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    handoff: Arc<Handoff>,
}

impl CancelHandle {
    /// Stop the worker at its next handoff and unblock a waiting consumer
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.handoff.cancel();
    }
}

/// Producer/consumer wrapper yielding filtered bound values one at a time
pub struct StreamingParser {
    handoff: Arc<Handoff>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    exhausted: bool,
}

impl StreamingParser {
    /// Start a streaming parse of an in-memory document.
    ///
    /// `filter` is an element path expression (`//localname` or
    /// `/a/b/c`); each element whose path matches has its bound value
    /// handed to the consumer instead of its parent.
    pub fn new(
        xml: impl Into<String>,
        schemas: &SchemaSet,
        registry: BindingRegistry,
        filter: &str,
    ) -> Result<Self> {
        Self::with_config(xml, schemas, registry, filter, ParserConfig::default())
    }

    /// Start a streaming parse with explicit parser configuration
    pub fn with_config(
        xml: impl Into<String>,
        schemas: &SchemaSet,
        registry: BindingRegistry,
        filter: &str,
        config: ParserConfig,
    ) -> Result<Self> {
        let xml = xml.into();
        Self::from_reader(
            std::io::Cursor::new(xml.into_bytes()),
            schemas,
            registry,
            filter,
            config,
        )
    }

    /// Start a streaming parse over any buffered reader
    pub fn from_reader<R>(
        input: R,
        schemas: &SchemaSet,
        registry: BindingRegistry,
        filter: &str,
        config: ParserConfig,
    ) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let filter = PathFilter::parse(filter)?;
        let index = Arc::new(SchemaIndex::new(schemas));
        let registry = Arc::new(registry);

        let handoff = Arc::new(Handoff::new());
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_handoff = Arc::clone(&handoff);
        let worker_cancelled = Arc::clone(&cancelled);
        let worker = std::thread::Builder::new()
            .name("geobind-streaming".to_string())
            .spawn(move || {
                let mut reader = quick_xml::Reader::from_reader(input);
                reader.trim_text(config.trim_text);

                let mut handler =
                    DocumentHandler::new(index, registry, config, ParseContext::new())
                        .with_filter(filter);

                let outcome = drive_events(&mut reader, &mut handler, &mut |value| {
                    if worker_cancelled.load(Ordering::Relaxed) {
                        return false;
                    }
                    match value {
                        // an emitted element whose chain produced nothing
                        // is skipped, not handed to the consumer
                        Some(value) => worker_handoff.put(Ok(value)),
                        None => true,
                    }
                });

                match outcome {
                    Ok(_) => debug!("streaming worker finished"),
                    Err(Error::Cancelled) => debug!("streaming worker cancelled"),
                    Err(error) => {
                        debug!(%error, "streaming worker failed");
                        worker_handoff.put(Err(error));
                    }
                }
                worker_handoff.close();
            })
            .map_err(|e| Error::Other(format!("failed to spawn streaming worker: {}", e)))?;

        Ok(Self {
            handoff,
            cancelled,
            worker: Some(worker),
            exhausted: false,
        })
    }

    /// Block until the next matching bound value is available.
    ///
    /// Returns `Ok(None)` once the document is exhausted (or the parse
    /// was cancelled). A worker-side failure is re-raised here.
    pub fn parse(&mut self) -> Result<Option<BoundValue>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.handoff.take() {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(error)) => {
                self.exhausted = true;
                Err(error)
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// A handle that cancels this parse from any thread
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
            handoff: Arc::clone(&self.handoff),
        }
    }
}

impl Drop for StreamingParser {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.handoff.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
