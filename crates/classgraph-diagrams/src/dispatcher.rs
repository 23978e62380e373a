//! Round-robin dispatch of render jobs over a pool of long-lived processes.
//!
//! Each pool slot owns one rendering process and two tasks:
//!
//! - a writer task feeding submitted markup into the process input,
//! - a reader task cutting the process output into images and resolving
//!   the slot's pending jobs in submission order.
//!
//! Processes are started lazily, the first time a job lands on their slot.
//! A process answers its jobs strictly in the order it received them, so a
//! per-slot FIFO of result senders is all the correlation needed.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};

use crate::error::RenderError;
use crate::format::RenderFormat;
use crate::process::{DelimitedOutput, ProcessPipes, ProcessSpawner};

type RenderResult = Result<Vec<u8>, RenderError>;

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Jobs waiting for output from one process.
#[derive(Default)]
struct PendingQueue {
    senders: VecDeque<oneshot::Sender<RenderResult>>,
    /// Set once the process output has ended; nothing will be resolved anymore.
    closed: bool,
}

type SharedQueue = Arc<Mutex<PendingQueue>>;

struct ProcessSlot {
    /// Dropped on shutdown, which closes the process input.
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    pending: SharedQueue,
    _process: Option<Child>,
}

/// Future resolving to one rendered image.
///
/// Returned by [`RenderDispatcher::submit`]. Resolves with
/// [`RenderError::ProcessExited`] if the process goes away first.
#[derive(Debug)]
pub struct PendingRender {
    slot: usize,
    receiver: oneshot::Receiver<RenderResult>,
}

impl PendingRender {
    /// Pool slot the job was sent to.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    fn failed(slot: usize, error: RenderError) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(Err(error));
        Self { slot, receiver }
    }
}

impl Future for PendingRender {
    type Output = RenderResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let slot = self.slot;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RenderError::ProcessExited { slot })))
    }
}

/// Fixed-size pool of rendering processes fed round robin.
///
/// Jobs go to slot `n % pool_size`, where `n` counts submissions since the
/// dispatcher was created. Must be used from within a tokio runtime.
pub struct RenderDispatcher {
    format: RenderFormat,
    spawner: Arc<dyn ProcessSpawner>,
    slots: Vec<Option<ProcessSlot>>,
    submitted: usize,
}

impl std::fmt::Debug for RenderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDispatcher")
            .field("format", &self.format)
            .field("pool_size", &self.slots.len())
            .field("running", &self.running())
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl RenderDispatcher {
    /// Create a dispatcher for `pool_size` processes rendering `format`.
    ///
    /// No process is started until the first job arrives.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidPoolSize`] if `pool_size` is zero.
    pub fn new(
        pool_size: usize,
        format: RenderFormat,
        spawner: Arc<dyn ProcessSpawner>,
    ) -> Result<Self, RenderError> {
        if pool_size == 0 {
            return Err(RenderError::InvalidPoolSize(pool_size));
        }
        Ok(Self {
            format,
            spawner,
            slots: (0..pool_size).map(|_| None).collect(),
            submitted: 0,
        })
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    /// Number of processes started so far.
    #[must_use]
    pub fn running(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Queue `markup` for rendering and return a future for its image.
    ///
    /// Never waits on the process. Starts the slot's process if it is not
    /// running yet.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Spawn`] if the process for the chosen slot
    /// cannot be started. The job still counts towards the rotation.
    pub fn submit(&mut self, markup: &str) -> Result<PendingRender, RenderError> {
        let index = self.submitted % self.slots.len();
        self.submitted += 1;

        let slot = match self.slots[index].take() {
            Some(slot) => slot,
            None => self.start(index)?,
        };
        let slot = self.slots[index].insert(slot);

        let Some(input) = &slot.input else {
            return Ok(PendingRender::failed(index, RenderError::ProcessExited { slot: index }));
        };

        let (sender, receiver) = oneshot::channel();
        {
            let mut queue = slot.pending.lock().unwrap();
            if queue.closed {
                drop(queue);
                return Ok(PendingRender::failed(index, RenderError::ProcessExited { slot: index }));
            }
            queue.senders.push_back(sender);
        }

        // A closed input means the writer task is gone; the reader fails the
        // queued job once the process output ends.
        if input.send(markup.as_bytes().to_vec()).is_err() {
            tracing::debug!(slot = index, "render process input already closed");
        }

        Ok(PendingRender {
            slot: index,
            receiver,
        })
    }

    /// Close the input of every running process.
    ///
    /// Does not wait for outstanding jobs. Processes finish the jobs they
    /// already received, then exit; their futures resolve as usual.
    /// Later submissions fail with [`RenderError::ProcessExited`].
    pub fn shutdown(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(slot) = slot
                && slot.input.take().is_some()
            {
                tracing::debug!(slot = index, "closing render process input");
            }
        }
    }

    fn start(&self, index: usize) -> Result<ProcessSlot, RenderError> {
        let ProcessPipes {
            input,
            output,
            process,
        } = self
            .spawner
            .spawn(index, self.format)
            .map_err(|source| RenderError::Spawn {
                slot: index,
                source,
            })?;

        tracing::info!(slot = index, format = self.format.as_str(), "started render process");

        let (sender, jobs) = mpsc::unbounded_channel();
        let pending = SharedQueue::default();

        tokio::spawn(write_jobs(index, input, jobs));
        tokio::spawn(read_results(index, output, Arc::clone(&pending)));

        Ok(ProcessSlot {
            input: Some(sender),
            pending,
            _process: process,
        })
    }
}

async fn write_jobs(
    slot: usize,
    mut input: Box<dyn AsyncWrite + Send + Unpin>,
    mut jobs: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(markup) = jobs.recv().await {
        let written = match input.write_all(&markup).await {
            Ok(()) => input.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::warn!(slot, error = %e, "failed to write to render process");
            return;
        }
    }
    if let Err(e) = input.shutdown().await {
        tracing::debug!(slot, error = %e, "failed to close render process input");
    }
}

async fn read_results(
    slot: usize,
    mut output: Box<dyn AsyncRead + Send + Unpin>,
    pending: SharedQueue,
) {
    let mut images = DelimitedOutput::default();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = match output.read(&mut buffer).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) => {
                tracing::warn!(slot, error = %e, "failed to read from render process");
                break;
            }
        };
        for image in images.feed(&buffer[..read]) {
            let next = pending.lock().unwrap().senders.pop_front();
            match next {
                Some(sender) => {
                    let _ = sender.send(Ok(image));
                }
                None => tracing::warn!(slot, "render process produced unrequested output"),
            }
        }
    }

    let orphaned = {
        let mut queue = pending.lock().unwrap();
        queue.closed = true;
        std::mem::take(&mut queue.senders)
    };
    if !orphaned.is_empty() {
        tracing::warn!(slot, jobs = orphaned.len(), "render process exited with jobs pending");
    }
    for sender in orphaned {
        let _ = sender.send(Err(RenderError::ProcessExited { slot }));
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::process::fake::{Behaviour, FakeSpawner, svg};

    fn job(body: &str) -> String {
        format!("@startuml\n{body}\n@enduml\n")
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let result = RenderDispatcher::new(0, RenderFormat::Svg, Arc::new(FakeSpawner::default()));
        assert!(matches!(result, Err(RenderError::InvalidPoolSize(0))));
    }

    #[tokio::test]
    async fn test_single_process_answers_in_submission_order() {
        let spawner = Arc::new(FakeSpawner::default());
        let mut dispatcher = RenderDispatcher::new(1, RenderFormat::Svg, spawner.clone()).unwrap();

        let first = dispatcher.submit(&job("J1")).unwrap();
        let second = dispatcher.submit(&job("J2")).unwrap();
        let third = dispatcher.submit(&job("J3")).unwrap();

        assert_eq!(third.await.unwrap(), svg(0, "J3"));
        assert_eq!(first.await.unwrap(), svg(0, "J1"));
        assert_eq!(second.await.unwrap(), svg(0, "J2"));
        assert_eq!(spawner.spawned(), 1);
    }

    #[tokio::test]
    async fn test_round_robin_over_pool() {
        let spawner = Arc::new(FakeSpawner::default());
        let mut dispatcher = RenderDispatcher::new(3, RenderFormat::Svg, spawner.clone()).unwrap();

        let jobs: Vec<_> = (0..7)
            .map(|i| dispatcher.submit(&job(&format!("J{i}"))).unwrap())
            .collect();

        let slots: Vec<_> = jobs.iter().map(PendingRender::slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(dispatcher.running(), 3);
        assert_eq!(spawner.spawned(), 3);

        for (i, pending) in jobs.into_iter().enumerate() {
            assert_eq!(pending.await.unwrap(), svg(i % 3, &format!("J{i}")));
        }
    }

    #[tokio::test]
    async fn test_processes_start_lazily() {
        let spawner = Arc::new(FakeSpawner::default());
        let mut dispatcher = RenderDispatcher::new(4, RenderFormat::Svg, spawner).unwrap();
        assert_eq!(dispatcher.running(), 0);

        let only = dispatcher.submit(&job("only")).unwrap();
        assert_eq!(only.await.unwrap(), svg(0, "only"));
        assert_eq!(dispatcher.running(), 1);
        assert_eq!(dispatcher.pool_size(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_lets_submitted_jobs_finish() {
        let spawner = Arc::new(FakeSpawner::default());
        let mut dispatcher = RenderDispatcher::new(2, RenderFormat::Svg, spawner).unwrap();

        let first = dispatcher.submit(&job("A")).unwrap();
        let second = dispatcher.submit(&job("B")).unwrap();
        dispatcher.shutdown();

        assert_eq!(first.await.unwrap(), svg(0, "A"));
        assert_eq!(second.await.unwrap(), svg(1, "B"));

        let late = dispatcher.submit(&job("C")).unwrap();
        assert!(matches!(late.await, Err(RenderError::ProcessExited { slot: 0 })));
    }

    #[tokio::test]
    async fn test_process_exit_fails_pending_jobs() {
        let spawner = Arc::new(FakeSpawner::new(Behaviour::ExitAfter(1)));
        let mut dispatcher = RenderDispatcher::new(1, RenderFormat::Svg, spawner).unwrap();

        let answered = dispatcher.submit(&job("ok")).unwrap();
        let lost = dispatcher.submit(&job("lost")).unwrap();

        assert_eq!(answered.await.unwrap(), svg(0, "ok"));
        assert!(matches!(lost.await, Err(RenderError::ProcessExited { slot: 0 })));

        let after_exit = dispatcher.submit(&job("after")).unwrap();
        assert!(matches!(after_exit.await, Err(RenderError::ProcessExited { slot: 0 })));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        struct Missing;
        impl ProcessSpawner for Missing {
            fn spawn(&self, _slot: usize, _format: RenderFormat) -> io::Result<ProcessPipes> {
                Err(io::Error::new(io::ErrorKind::NotFound, "plantuml"))
            }
        }

        let mut dispatcher = RenderDispatcher::new(2, RenderFormat::Png, Arc::new(Missing)).unwrap();
        assert!(matches!(
            dispatcher.submit(&job("x")),
            Err(RenderError::Spawn { slot: 0, .. })
        ));
        assert!(matches!(
            dispatcher.submit(&job("y")),
            Err(RenderError::Spawn { slot: 1, .. })
        ));
        assert_eq!(dispatcher.running(), 0);
    }
}
