//! Off-thread syntax highlighting over message passing.
//!
//! The worker owns its own [`SyntaxHighlighter`] and shares nothing with the
//! caller: requests and replies are owned values sent over channels. Each
//! request carries a caller-generated id; [`HighlightClient`] remembers the
//! latest id it issued and drops replies to anything older, so switching
//! files while a highlight is in flight never paints stale fragments.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::HighlightError;
use crate::syntax::SyntaxHighlighter;

/// Correlation id chosen by the caller for one highlight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRequest {
    pub id: RequestId,
    pub left_text: String,
    pub right_text: String,
    pub filename: String,
}

/// Per-line fragments, indexed by 0-based source line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightResponse {
    pub id: RequestId,
    pub left_highlighted: Vec<String>,
    pub right_highlighted: Vec<String>,
}

#[derive(Debug)]
pub struct HighlightReply {
    pub id: RequestId,
    pub outcome: Result<HighlightResponse, HighlightError>,
}

/// Handle to the highlighting thread.
pub struct HighlightWorker {
    requests: Option<Sender<HighlightRequest>>,
    replies: Receiver<HighlightReply>,
    handle: Option<JoinHandle<()>>,
}

impl HighlightWorker {
    /// Start the worker thread. `overrides` extend the extension -> language table.
    pub fn spawn(overrides: BTreeMap<String, String>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<HighlightRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<HighlightReply>();

        let handle = thread::Builder::new()
            .name("highlight-worker".to_string())
            .spawn(move || run_worker(SyntaxHighlighter::new(overrides), request_rx, reply_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
        })
    }

    fn send(&self, request: HighlightRequest) -> Result<(), HighlightError> {
        self.requests
            .as_ref()
            .ok_or(HighlightError::WorkerDisconnected)?
            .send(request)
            .map_err(|_| HighlightError::WorkerDisconnected)
    }
}

impl Drop for HighlightWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop once the
        // current request is done. A busy worker is left to finish detached.
        self.requests.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !handle.is_finished() {
            tracing::debug!("detaching busy highlight worker");
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("highlight worker panicked");
        }
    }
}

fn run_worker(
    highlighter: SyntaxHighlighter,
    requests: Receiver<HighlightRequest>,
    replies: Sender<HighlightReply>,
) {
    tracing::debug!("highlight worker started");
    for request in requests {
        let reply = handle_request(&highlighter, request);
        if replies.send(reply).is_err() {
            break;
        }
    }
    tracing::debug!("highlight worker stopped");
}

fn handle_request(highlighter: &SyntaxHighlighter, request: HighlightRequest) -> HighlightReply {
    let HighlightRequest {
        id,
        left_text,
        right_text,
        filename,
    } = request;

    let started = Instant::now();
    let outcome = highlighter
        .highlight(&left_text, &right_text, &filename)
        .map(|lines| HighlightResponse {
            id,
            left_highlighted: lines.left_lines,
            right_highlighted: lines.right_lines,
        });
    tracing::debug!(
        id = id.0,
        filename = %filename,
        ok = outcome.is_ok(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "highlight request handled"
    );

    HighlightReply { id, outcome }
}

/// Caller side of the worker: issues ids and filters stale replies.
pub struct HighlightClient {
    worker: HighlightWorker,
    next_id: u64,
    latest: Option<RequestId>,
}

impl HighlightClient {
    pub fn new(worker: HighlightWorker) -> Self {
        Self {
            worker,
            next_id: 1,
            latest: None,
        }
    }

    /// Queue a highlight of both texts; supersedes any request still in flight.
    pub fn submit(
        &mut self,
        left_text: impl Into<String>,
        right_text: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<RequestId, HighlightError> {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.worker.send(HighlightRequest {
            id,
            left_text: left_text.into(),
            right_text: right_text.into(),
            filename: filename.into(),
        })?;
        self.latest = Some(id);
        Ok(id)
    }

    pub fn latest(&self) -> Option<RequestId> {
        self.latest
    }

    fn accept(&mut self, reply: HighlightReply) -> Option<HighlightReply> {
        if Some(reply.id) == self.latest {
            self.latest = None;
            Some(reply)
        } else {
            tracing::debug!(id = reply.id.0, "discarding stale highlight reply");
            None
        }
    }

    /// Next reply for the latest request, if one is already waiting.
    pub fn try_recv(&mut self) -> Result<Option<HighlightReply>, HighlightError> {
        loop {
            match self.worker.replies.try_recv() {
                Ok(reply) => {
                    if let Some(reply) = self.accept(reply) {
                        return Ok(Some(reply));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(HighlightError::WorkerDisconnected),
            }
        }
    }

    /// Wait up to `timeout` for the reply to the latest request.
    ///
    /// Returns `Ok(None)` on timeout; stale replies do not reset the clock.
    pub fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<HighlightReply>, HighlightError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.worker.replies.recv_timeout(remaining) {
                Ok(reply) => {
                    if let Some(reply) = self.accept(reply) {
                        return Ok(Some(reply));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HighlightError::WorkerDisconnected);
                }
            }
        }
    }
}
