//! Request routing collaborator.
//!
//! A [`Router`] receives one decoded request at a time on a worker thread
//! and queues zero or more replies. Routers may block on their database:
//! each worker owns its own router, so a blocked router only stalls that
//! worker.

use crate::{connection::Replies, message::Message};

pub mod tournament;

pub use tournament::TournamentRouter;

/// Business-logic entry point invoked by pool workers.
///
/// Any `FnMut(Message, &mut Replies)` closure is a router, which keeps tests
/// short:
///
/// ```
/// use scorewire::{
///     connection::Replies,
///     message::{Message, catalog},
///     router::Router,
/// };
///
/// let mut echo = |request: Message, replies: &mut Replies| {
///     let _ = replies.send(request);
/// };
/// let mut replies = Replies::buffered();
/// echo.deliver(Message::new(catalog::LOGIN), &mut replies);
/// assert_eq!(replies.into_messages(), vec![Message::new(catalog::LOGIN)]);
/// ```
pub trait Router: Send + 'static {
    /// Handle `request`, queuing replies in order on `replies`.
    fn deliver(&mut self, request: Message, replies: &mut Replies);
}

impl<F> Router for F
where
    F: FnMut(Message, &mut Replies) + Send + 'static,
{
    fn deliver(&mut self, request: Message, replies: &mut Replies) { self(request, replies); }
}
