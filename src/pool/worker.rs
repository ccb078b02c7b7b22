//! Blocking worker threads that run routers.
//!
//! Workers share one job queue. Each owns the router built for it by the
//! pool's factory, so a router (and its database handle) only ever serves
//! one request at a time.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use log::{debug, error};
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    connection::Job,
    message::{Message, catalog},
    metrics,
    panic::format_panic,
    router::Router,
};

/// Reply sent when a router panics while serving a request.
pub const INTERNAL_ERROR_TEXT: &str = "Internal server error.";

type SharedJobs = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Spawn `count` workers on the blocking thread pool.
///
/// Workers exit once every job sender has been dropped.
pub(crate) fn spawn_workers<R, F>(
    count: usize,
    factory: Arc<F>,
    jobs: mpsc::Receiver<Job>,
) -> Vec<JoinHandle<()>>
where
    R: Router,
    F: Fn() -> R + Send + Sync + 'static,
{
    let jobs: SharedJobs = Arc::new(Mutex::new(jobs));
    (0..count.max(1))
        .map(|index| {
            let factory = Arc::clone(&factory);
            let jobs = Arc::clone(&jobs);
            tokio::task::spawn_blocking(move || run_worker(index, factory.as_ref(), &jobs))
        })
        .collect()
}

fn run_worker<R, F>(index: usize, factory: &F, jobs: &Mutex<mpsc::Receiver<Job>>)
where
    R: Router,
    F: Fn() -> R,
{
    debug!("worker started: index={index}");
    let mut router = factory();
    loop {
        let next = jobs.lock().blocking_recv();
        let Some(Job {
            request,
            mut replies,
            done,
        }) = next
        else {
            break;
        };

        let message_id = request.id();
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| router.deliver(request, &mut replies)));
        if let Err(payload) = outcome {
            let panic_msg = format_panic(payload.as_ref());
            metrics::inc_errors();
            // Emit via both `log` and `tracing` for tests that capture either.
            error!("router panicked: worker={index}, message_id={message_id}, panic={panic_msg}");
            tracing::error!(worker = index, %message_id, panic = %panic_msg, "router panicked");
            let _ = replies.send(Message::new(catalog::ERROR).with(INTERNAL_ERROR_TEXT));
            router = factory();
        }
        let _ = done.send(());
    }
    debug!("worker stopped: index={index}");
}
