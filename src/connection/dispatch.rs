//! Inbound frame handling and request dispatch.

use futures::SinkExt;
use log::{debug, error, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::oneshot,
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use super::{CloseReason, Connection, Event, Job, REPLY_TOO_LARGE_TEXT, Replies, SocketError};
use crate::{
    codec::{Decoded, EncodeError},
    message::{Message, catalog},
    metrics::{self, Direction},
};

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Apply one event; returns a reason once the connection must close.
    pub(super) async fn handle_event(&mut self, event: Event) -> Option<CloseReason> {
        match event {
            Event::Shutdown => Some(CloseReason::Local),
            Event::Reply(reply) => self.write_reply(reply).await.err(),
            Event::RequestDone => {
                self.finish_request();
                self.dispatch_next().await;
                self.served_after_eof()
            }
            Event::Inbound(Some(Ok(Decoded::Message(request)))) => {
                self.last_activity = Instant::now();
                metrics::inc_frames(Direction::Inbound);
                debug!(
                    "request received: id={}, message_id={}, values={}",
                    self.id,
                    request.id(),
                    request.len()
                );
                self.pending.push_back(request);
                self.dispatch_next().await;
                None
            }
            Event::Inbound(Some(Ok(Decoded::Corrupted(err)))) => {
                self.last_activity = Instant::now();
                metrics::inc_corrupted();
                warn!(
                    "corrupted frame discarded: reason={err}, id={}, peer={:?}",
                    self.id, self.peer
                );
                None
            }
            Event::Inbound(Some(Err(err))) => {
                self.reading = false;
                debug!("read failed: id={}, error={err}", self.id);
                Some(CloseReason::Socket(SocketError::from(&err)))
            }
            Event::Inbound(None) => {
                self.reading = false;
                if self.in_flight.is_some() {
                    debug!(
                        "peer finished sending, serving queued requests: id={}, queued={}",
                        self.id,
                        self.pending.len() + 1
                    );
                }
                self.served_after_eof()
            }
            Event::IdleTimeout => Some(CloseReason::Socket(SocketError::Timeout)),
        }
    }

    /// Once the peer has half-closed, close after the last queued request.
    fn served_after_eof(&self) -> Option<CloseReason> {
        (!self.reading && self.in_flight.is_none())
            .then_some(CloseReason::Socket(SocketError::HostClosed))
    }

    /// Hand the next queued request to the worker pool if none is in flight.
    pub(super) async fn dispatch_next(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(request) = self.pending.pop_front() else {
            return;
        };

        let (done, done_rx) = oneshot::channel();
        let response = CancellationToken::new();
        let job = Job {
            request,
            replies: Replies::channel(self.outbox_tx.clone(), response.clone()),
            done,
        };
        if self.jobs.send(job).await.is_err() {
            warn!(
                "worker pool unavailable, dropping requests: id={}, queued={}",
                self.id,
                self.pending.len() + 1
            );
            self.pending.clear();
            let reply = Message::new(catalog::ERROR).with("Server is shutting down.");
            let _ = self.outbox_tx.try_send(reply);
            return;
        }
        self.in_flight = Some(done_rx);
        self.response = Some(response);
    }

    /// Forget the request whose worker has finished.
    pub(super) fn finish_request(&mut self) {
        self.in_flight = None;
        self.response = None;
    }

    fn response_aborted(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Encode and write one reply.
    ///
    /// A reply that cannot be encoded abandons the rest of its response: the
    /// peer receives one `ERROR` reply instead, and later replies to the same
    /// request are discarded. Socket failures close the connection.
    pub(super) async fn write_reply(&mut self, reply: Message) -> Result<(), CloseReason> {
        let message_id = reply.id();
        if self.response_aborted() {
            debug!(
                "reply discarded from abandoned response: id={}, message_id={message_id}",
                self.id
            );
            return Ok(());
        }
        match self.writer.send(reply).await {
            Ok(()) => {
                metrics::inc_frames(Direction::Outbound);
                Ok(())
            }
            Err(err) => {
                if let Some(encode) = err
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<EncodeError>())
                {
                    metrics::inc_errors();
                    error!(
                        "response abandoned: id={}, message_id={message_id}, reason={encode}",
                        self.id
                    );
                    if let Some(response) = &self.response {
                        response.cancel();
                    }
                    let notice = Message::new(catalog::ERROR).with(REPLY_TOO_LARGE_TEXT);
                    return match self.writer.send(notice).await {
                        Ok(()) => {
                            metrics::inc_frames(Direction::Outbound);
                            Ok(())
                        }
                        Err(err) => Err(CloseReason::Socket(SocketError::from(&err))),
                    };
                }
                debug!("write failed: id={}, error={err}", self.id);
                Err(CloseReason::Socket(SocketError::from(&err)))
            }
        }
    }
}
