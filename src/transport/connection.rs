//! Bridge connection: one WebSocket, one I/O task.
//!
//! Requests are written by the I/O task and answered out of order by the
//! extension; [`PendingRequests`] pairs each response with its waiting caller
//! by request ID. The READY handshake uses the same table under the nil ID,
//! registered before the task starts so an eager extension cannot race it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, SessionId, TabId};
use crate::protocol::{Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command responses (60s, the response timeout of a run).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Requests allowed in flight on one connection.
const MAX_PENDING_REQUESTS: usize = 100;

/// Time the extension has to send READY after the upgrade.
const READY_TIMEOUT: Duration = Duration::from_secs(30);

type Reply = oneshot::Sender<Result<Response>>;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

// ============================================================================
// PendingRequests
// ============================================================================

/// Requests awaiting a response, keyed by request ID.
#[derive(Default)]
pub(crate) struct PendingRequests {
    waiting: FxHashMap<RequestId, Reply>,
}

impl PendingRequests {
    /// Registers `reply` for `id`, refusing once the table is full.
    fn register(&mut self, id: RequestId, reply: Reply) -> std::result::Result<(), Reply> {
        if self.waiting.len() >= MAX_PENDING_REQUESTS {
            return Err(reply);
        }
        self.waiting.insert(id, reply);
        Ok(())
    }

    /// Hands `response` to its caller. Returns `false` for unknown IDs.
    fn complete(&mut self, response: Response) -> bool {
        match self.waiting.remove(&response.id) {
            Some(reply) => {
                let _ = reply.send(Ok(response));
                true
            }
            None => false,
        }
    }

    /// Fails one request, if it is still waiting.
    fn fail(&mut self, id: &RequestId, error: Error) {
        if let Some(reply) = self.waiting.remove(id) {
            let _ = reply.send(Err(error));
        }
    }

    /// Drops a request whose caller stopped waiting.
    fn forget(&mut self, id: &RequestId) -> bool {
        self.waiting.remove(id).is_some()
    }

    /// Fails every waiting request with [`Error::ConnectionClosed`].
    fn close_all(&mut self) -> usize {
        let count = self.waiting.len();
        for (_, reply) in self.waiting.drain() {
            let _ = reply.send(Err(Error::ConnectionClosed));
        }
        count
    }

    fn len(&self) -> usize {
        self.waiting.len()
    }
}

// ============================================================================
// ReadyData
// ============================================================================

/// What the extension reports in its READY message.
#[derive(Debug, Clone, Copy)]
pub struct ReadyData {
    /// Tab the extension controls.
    pub tab_id: TabId,
    /// Session ID echoed back from the init page.
    pub session_id: SessionId,
}

impl ReadyData {
    fn from_response(response: Response) -> Result<Self> {
        let result = response.into_result()?;

        let tab_id = result
            .get("tabId")
            .and_then(serde_json::Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .and_then(TabId::new)
            .ok_or_else(|| Error::protocol("READY message carries no valid tabId"))?;
        let session_id = result
            .get("sessionId")
            .and_then(serde_json::Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .map(SessionId::from_u32)
            .ok_or_else(|| Error::protocol("READY message carries no valid sessionId"))?;

        Ok(Self { tab_id, session_id })
    }
}

// ============================================================================
// Handshake
// ============================================================================

/// The pending READY message of a fresh connection.
pub(crate) struct Handshake {
    ready: oneshot::Receiver<Result<Response>>,
}

impl Handshake {
    /// Waits for READY.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if READY does not arrive within 30s
    /// - [`Error::ConnectionClosed`] if the socket closes first
    /// - [`Error::Protocol`] if READY lacks a tab or session ID
    pub(crate) async fn wait(self) -> Result<ReadyData> {
        let response = timeout(READY_TIMEOUT, self.ready)
            .await
            .map_err(|_| Error::connection_timeout(READY_TIMEOUT.as_millis() as u64))???;

        let ready = ReadyData::from_response(response)?;
        debug!(tab_id = %ready.tab_id, session_id = %ready.session_id, "READY received");
        Ok(ready)
    }
}

// ============================================================================
// Connection
// ============================================================================

enum Outgoing {
    Request { request: Request, reply: Reply },
    Forget(RequestId),
    Close,
}

/// Handle to the bridge connection of one window.
///
/// Cloning is cheap; clones share the I/O task.
#[derive(Clone)]
pub struct Connection {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    pending: Arc<Mutex<PendingRequests>>,
}

impl Connection {
    /// Takes over an upgraded socket and starts its I/O task.
    pub(crate) fn new(ws_stream: WebSocketStream<TcpStream>) -> (Self, Handshake) {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(PendingRequests::default()));

        let (ready_tx, ready_rx) = oneshot::channel();
        pending.lock().waiting.insert(RequestId::ready(), ready_tx);

        tokio::spawn(run_io(ws_stream, outgoing_rx, Arc::clone(&pending)));

        let connection = Self { outgoing, pending };
        (connection, Handshake { ready: ready_rx })
    }

    /// Sends a request and waits up to [`DEFAULT_COMMAND_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// See [`send_with_timeout`](Self::send_with_timeout).
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.send_with_timeout(request, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a request and waits up to `request_timeout` for its response.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is gone
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::Protocol`] if too many requests are already in flight
    pub async fn send_with_timeout(
        &self,
        request: Request,
        request_timeout: Duration,
    ) -> Result<Response> {
        let id = request.id;
        let (reply, response) = oneshot::channel();

        self.outgoing
            .send(Outgoing::Request { request, reply })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(request_timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self.outgoing.send(Outgoing::Forget(id));
                let in_flight = self.pending.lock().len();
                debug!(request_id = %id, in_flight, "Request timed out");
                Err(Error::request_timeout(id, request_timeout.as_millis() as u64))
            }
        }
    }

    /// Closes the socket. Waiting requests fail with [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

// ============================================================================
// I/O Task
// ============================================================================

async fn run_io(
    ws_stream: WebSocketStream<TcpStream>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    pending: Arc<Mutex<PendingRequests>>,
) {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => route_response(text.as_str(), &pending),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Extension closed the socket");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket read failed");
                    break;
                }
                None => break,
            },

            command = outgoing.recv() => match command {
                Some(Outgoing::Request { request, reply }) => {
                    write_request(request, reply, &mut sink, &pending).await;
                }
                Some(Outgoing::Forget(id)) => {
                    if pending.lock().forget(&id) {
                        debug!(request_id = %id, "Dropped timed-out request");
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sink.close().await;
                    break;
                }
            },
        }
    }

    let failed = pending.lock().close_all();
    debug!(failed, "Bridge I/O task stopped");
}

fn route_response(text: &str, pending: &Mutex<PendingRequests>) {
    let Ok(response) = serde_json::from_str::<Response>(text) else {
        trace!(len = text.len(), "Ignoring message without a response envelope");
        return;
    };

    let id = response.id;
    if pending.lock().complete(response) {
        return;
    }
    if id.is_ready() {
        debug!("Ignoring repeated READY");
    } else {
        warn!(request_id = %id, "Response for a request nobody is waiting on");
    }
}

async fn write_request(
    request: Request,
    reply: Reply,
    sink: &mut WsSink,
    pending: &Mutex<PendingRequests>,
) {
    let id = request.id;
    let json = match serde_json::to_string(&request) {
        Ok(json) => json,
        Err(e) => {
            let _ = reply.send(Err(e.into()));
            return;
        }
    };

    if let Err(reply) = pending.lock().register(id, reply) {
        warn!(max = MAX_PENDING_REQUESTS, "Pending request table full");
        let _ = reply.send(Err(Error::protocol(format!(
            "more than {MAX_PENDING_REQUESTS} requests in flight"
        ))));
        return;
    }

    if let Err(e) = sink.send(Message::Text(json.into())).await {
        pending.lock().fail(&id, Error::connection(e.to_string()));
        return;
    }

    trace!(request_id = %id, method = request.command.method(), "Request written");
}

// ============================================================================
// Tests
// ============================================================================
