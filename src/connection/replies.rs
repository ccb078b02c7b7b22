//! Reply sink handed to routers and the job carrying one request.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::message::Message;

/// The connection stopped accepting replies for this request.
///
/// Either the connection closed or it abandoned the response after a reply
/// could not be encoded.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("connection stopped accepting replies for this request")]
pub struct ConnectionGone;

enum Sink {
    Channel {
        outbox: mpsc::Sender<Message>,
        aborted: CancellationToken,
    },
    Buffer(Vec<Message>),
}

/// Ordered outbound queue of one connection, as seen by a router.
///
/// Replies are queued in call order. Routers run on blocking worker
/// threads, so queuing blocks while the connection's outbox is full.
///
/// # Examples
///
/// ```
/// use scorewire::{
///     connection::Replies,
///     message::{Message, catalog},
/// };
///
/// let mut replies = Replies::buffered();
/// replies.send(Message::new(catalog::ERROR).with("oops")).expect("buffered");
/// assert_eq!(replies.into_messages().len(), 1);
/// ```
pub struct Replies {
    sink: Sink,
    sent: usize,
}

impl Replies {
    pub(crate) fn channel(outbox: mpsc::Sender<Message>, aborted: CancellationToken) -> Self {
        Self {
            sink: Sink::Channel { outbox, aborted },
            sent: 0,
        }
    }

    /// A sink that collects replies in memory.
    #[must_use]
    pub fn buffered() -> Self {
        Self {
            sink: Sink::Buffer(Vec::new()),
            sent: 0,
        }
    }

    /// Queue one reply.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionGone`] when the connection no longer accepts
    /// replies.
    pub fn send(&mut self, message: Message) -> Result<(), ConnectionGone> {
        match &mut self.sink {
            Sink::Channel { aborted, .. } if aborted.is_cancelled() => return Err(ConnectionGone),
            Sink::Channel { outbox, .. } => {
                outbox.blocking_send(message).map_err(|_| ConnectionGone)?;
            }
            Sink::Buffer(buf) => buf.push(message),
        }
        self.sent += 1;
        Ok(())
    }

    /// Queue every message from `messages`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionGone`] when the connection no longer accepts
    /// replies; the remaining messages are not pulled.
    pub fn send_all<I>(&mut self, messages: I) -> Result<(), ConnectionGone>
    where
        I: IntoIterator<Item = Message>,
    {
        messages.into_iter().try_for_each(|message| self.send(message))
    }

    /// Number of replies queued so far.
    #[must_use]
    pub fn sent(&self) -> usize { self.sent }

    /// Messages collected by a [`Replies::buffered`] sink.
    ///
    /// Channel-backed sinks return an empty vector.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        match self.sink {
            Sink::Channel { .. } => Vec::new(),
            Sink::Buffer(buf) => buf,
        }
    }
}

/// One decoded request queued for a worker.
pub(crate) struct Job {
    pub(crate) request: Message,
    pub(crate) replies: Replies,
    /// Dropped or fired once the router has finished with the request.
    pub(crate) done: oneshot::Sender<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::catalog;

    #[test]
    fn send_all_preserves_order() {
        let mut replies = Replies::buffered();
        let batch = (0..3).map(|n| Message::new(catalog::PULL_MATCHES).with(i64::from(n)));
        replies.send_all(batch).expect("buffered sink accepts");

        let ints: Vec<_> = replies
            .into_messages()
            .iter()
            .filter_map(|m| m.get(0).and_then(crate::value::Value::as_int))
            .collect();
        assert_eq!(ints, vec![0, 1, 2]);
    }

    #[test]
    fn closed_channel_stops_streaming() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let mut replies = Replies::channel(tx, CancellationToken::new());
        let mut pulled = 0;
        let batch = std::iter::repeat_with(|| {
            pulled += 1;
            Message::new(catalog::PULL_MATCHES)
        })
        .take(10);

        assert_eq!(replies.send_all(batch), Err(ConnectionGone));
        assert_eq!(pulled, 1);
        assert_eq!(replies.sent(), 0);
    }

    #[test]
    fn aborted_response_rejects_further_replies() {
        let (tx, mut rx) = mpsc::channel(4);
        let aborted = CancellationToken::new();
        let mut replies = Replies::channel(tx, aborted.clone());

        replies.send(Message::new(catalog::PULL_MATCHES)).expect("open");
        aborted.cancel();
        assert_eq!(
            replies.send(Message::new(catalog::ALL_MATCHES_PULLED)),
            Err(ConnectionGone)
        );
        assert_eq!(replies.sent(), 1);
        assert_eq!(rx.try_recv().map(|m| m.id()), Ok(catalog::PULL_MATCHES));
        assert!(rx.try_recv().is_err());
    }
}
