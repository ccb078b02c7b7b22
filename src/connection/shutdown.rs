//! Cooperative close sequence for the connection actor.

use futures::SinkExt;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::{CloseReason, Connection, Event, wait_done};

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Finish the in-flight request, drain the outbox and shut the socket.
    ///
    /// Requests still queued behind the in-flight one are dropped.
    pub(super) async fn close(&mut self, reason: CloseReason) {
        self.state.start_closing();
        self.reading = false;
        if !self.pending.is_empty() {
            debug!(
                "dropping queued requests on close: id={}, count={}",
                self.id,
                self.pending.len()
            );
            self.pending.clear();
        }

        let mut writable = true;
        while self.in_flight.is_some() {
            match self.next_closing_event().await {
                Event::Reply(reply) => {
                    if writable && self.write_reply(reply).await.is_err() {
                        writable = false;
                        // Unblock a worker still streaming into the outbox.
                        self.outbox_rx.close();
                    }
                }
                _ => self.finish_request(),
            }
        }

        while let Ok(reply) = self.outbox_rx.try_recv() {
            if writable && self.write_reply(reply).await.is_err() {
                writable = false;
            }
        }

        if writable {
            if let Err(err) = self.writer.flush().await {
                debug!("flush on close failed: id={}, error={err}", self.id);
            } else if let Err(err) = self.writer.get_mut().shutdown().await {
                debug!("socket shutdown failed: id={}, error={err}", self.id);
            }
        }
        self.state.finish();
        debug!(
            "connection state: id={}, state={}, reason={reason}",
            self.id, self.state
        );
    }

    async fn next_closing_event(&mut self) -> Event {
        tokio::select! {
            biased;

            Some(reply) = self.outbox_rx.recv() => Event::Reply(reply),
            () = wait_done(self.in_flight.as_mut()) => Event::RequestDone,
        }
    }
}
