//! Response proxying
//!
//! GraphQL execution writes its HTTP response into a [`ResponseSink`]. The
//! pipeline hands it a [`BufferedResponse`], closes the request's store
//! session once execution is over, and only then replays the buffer onto
//! the [`LiveResponse`] that reaches the client.
//!
//! Replaying consumes the buffer, so a buffered response can be flushed at
//! most once and cannot be written to afterwards.

use async_trait::async_trait;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::channel::{mpsc, oneshot};
use futures::SinkExt;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;

/// Size of the chunks a buffered body is replayed in
pub const REPLAY_CHUNK_SIZE: usize = 16 * 1024;

/// Number of body chunks the live response holds before the writer waits for the client
const LIVE_BODY_CAPACITY: usize = 8;

/// Errors raised by a response sink
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// Status or header set after the head was sent
    #[error("response head already sent")]
    HeadCommitted,

    /// Write after `end`
    #[error("response already ended")]
    Ended,

    /// The client side of the live response is gone
    #[error("client disconnected before the response was flushed")]
    Disconnected,
}

/// Minimal response surface the GraphQL stage writes to
#[async_trait]
pub trait ResponseSink: Send {
    /// Set the status code
    fn set_status(&mut self, status: StatusCode) -> Result<(), ProxyError>;

    /// Set a header, replacing any earlier value under the same name
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), ProxyError>;

    /// Append a chunk to the body
    async fn write(&mut self, chunk: Bytes) -> Result<(), ProxyError>;

    /// Finish the body
    async fn end(&mut self) -> Result<(), ProxyError>;
}

/// In-memory response, filled during execution and replayed afterwards
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    ended: bool,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            ended: false,
        }
    }
}

impl BufferedResponse {
    /// Create an empty `200 OK` buffer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether `end` has been called
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Copy status and headers onto `sink`, stream the body into it, and end it.
    ///
    /// Resolves once the sink has accepted the last chunk.
    pub async fn replay<S>(self, sink: &mut S) -> Result<(), ProxyError>
    where
        S: ResponseSink + ?Sized,
    {
        sink.set_status(self.status)?;

        for (name, value) in &self.headers {
            sink.set_header(name.clone(), value.clone())?;
        }

        let mut body = self.body.freeze();
        while !body.is_empty() {
            let chunk = body.split_to(body.len().min(REPLAY_CHUNK_SIZE));
            sink.write(chunk).await?;
        }

        sink.end().await
    }
}

#[async_trait]
impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) -> Result<(), ProxyError> {
        if self.ended {
            return Err(ProxyError::Ended);
        }
        self.status = status;
        Ok(())
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), ProxyError> {
        if self.ended {
            return Err(ProxyError::Ended);
        }
        self.headers.insert(name, value);
        Ok(())
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), ProxyError> {
        if self.ended {
            return Err(ProxyError::Ended);
        }
        self.body.extend_from_slice(&chunk);
        Ok(())
    }

    async fn end(&mut self) -> Result<(), ProxyError> {
        self.ended = true;
        Ok(())
    }
}

type BodyChunk = Result<Bytes, Infallible>;

/// Head of a live response that has not been sent yet
struct PendingHead {
    status: StatusCode,
    headers: HeaderMap,
    deliver: oneshot::Sender<Response>,
    body: mpsc::Receiver<BodyChunk>,
}

/// The outbound response, streamed to the client as it is written.
///
/// The head (status and headers) is sent with the first body write or at
/// `end`, whichever comes first; after that only body writes are accepted.
pub struct LiveResponse {
    head: Option<PendingHead>,
    body: Option<mpsc::Sender<BodyChunk>>,
}

/// Receiving half of a [`LiveResponse`], resolved once its head is sent
pub struct PendingResponse {
    receiver: oneshot::Receiver<Response>,
}

impl LiveResponse {
    /// Create a live response and the handle that yields it to the server
    pub fn channel() -> (Self, PendingResponse) {
        let (deliver, receiver) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(LIVE_BODY_CAPACITY);

        let live = Self {
            head: Some(PendingHead {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                deliver,
                body: body_rx,
            }),
            body: Some(body_tx),
        };

        (live, PendingResponse { receiver })
    }

    fn pending_head(&mut self) -> Result<&mut PendingHead, ProxyError> {
        self.head.as_mut().ok_or(ProxyError::HeadCommitted)
    }

    fn commit(&mut self) -> Result<(), ProxyError> {
        let Some(head) = self.head.take() else {
            return Ok(());
        };

        let mut response = Response::new(Body::from_stream(head.body));
        *response.status_mut() = head.status;
        *response.headers_mut() = head.headers;

        head.deliver
            .send(response)
            .map_err(|_| ProxyError::Disconnected)
    }
}

#[async_trait]
impl ResponseSink for LiveResponse {
    fn set_status(&mut self, status: StatusCode) -> Result<(), ProxyError> {
        self.pending_head()?.status = status;
        Ok(())
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), ProxyError> {
        self.pending_head()?.headers.insert(name, value);
        Ok(())
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), ProxyError> {
        self.commit()?;
        let body = self.body.as_mut().ok_or(ProxyError::Ended)?;
        body.send(Ok(chunk))
            .await
            .map_err(|_| ProxyError::Disconnected)
    }

    async fn end(&mut self) -> Result<(), ProxyError> {
        self.commit()?;
        // Dropping the sender terminates the body stream.
        self.body.take().ok_or(ProxyError::Ended).map(drop)
    }
}

impl PendingResponse {
    /// Wait for the head and turn it into the response handed to the server
    pub async fn into_response(self) -> Response {
        match self.receiver.await {
            Ok(response) => response,
            Err(_) => {
                warn!("live response dropped before its head was sent");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Replay `buffer` onto a fresh live response and return that response.
///
/// The body is streamed by a background task so that the server can start
/// sending while the replay is still writing.
pub async fn flush(buffer: BufferedResponse) -> Response {
    let (mut live, pending) = LiveResponse::channel();

    tokio::spawn(async move {
        if let Err(e) = buffer.replay(&mut live).await {
            warn!(error = %e, "response replay aborted");
        }
    });

    pending.into_response().await
}
