//! Worker → front-end event delivery and cooperative cancellation.
//!
//! The worker pushes [`RunEvent`]s into an [`EventSink`] (normally a crossbeam
//! sender); the interactive side drains them with [`EventQueue::drain_tick`]
//! on a fixed timer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::controller::RunState;

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// One human-readable line.
    Status(String),
    /// Zones completed so far out of zones found in the model.
    Progress { current: usize, total: usize },
    /// Terminal event of a run.
    Finished {
        state: RunState,
        log_path: Option<PathBuf>,
    },
}

impl RunEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunEvent::Finished { .. })
    }
}

pub trait EventSink {
    fn emit(&self, event: RunEvent);
}

impl EventSink for Sender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: RunEvent) {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: RunEvent) {
        (**self).emit(event)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Status/progress helper mirroring every status line into the log.
pub struct Reporter<'a> {
    sink: &'a dyn EventSink,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a dyn EventSink) -> Self {
        Self { sink }
    }

    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.sink.emit(RunEvent::Status(message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.sink.emit(RunEvent::Status(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.sink.emit(RunEvent::Status(message));
    }

    pub fn progress(&self, current: usize, total: usize) {
        tracing::debug!(current, total, "progress");
        self.sink.emit(RunEvent::Progress { current, total });
    }

    pub fn finished(&self, state: RunState, log_path: Option<PathBuf>) {
        self.sink.emit(RunEvent::Finished { state, log_path });
    }
}

/// Result of one drain step.
#[derive(Debug, Default)]
pub struct Tick {
    pub events: Vec<RunEvent>,
    /// Status/progress events dropped because the backlog was too deep.
    pub discarded: usize,
    /// The worker side hung up and the channel is empty.
    pub disconnected: bool,
}

/// Consumer end of the event channel.
pub struct EventQueue {
    receiver: Receiver<RunEvent>,
    events_per_tick: usize,
    backlog_limit: usize,
}

impl EventQueue {
    /// Unbounded channel; the worker never blocks on a slow front end.
    pub fn channel(events_per_tick: usize, backlog_limit: usize) -> (Sender<RunEvent>, Self) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (
            sender,
            Self {
                receiver,
                events_per_tick: events_per_tick.max(1),
                backlog_limit,
            },
        )
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Take up to `events_per_tick` events. If more than the backlog limit is
    /// still pending afterwards, the rest is flushed, keeping only `Finished`.
    pub fn drain_tick(&self) -> Tick {
        let mut tick = Tick::default();

        while tick.events.len() < self.events_per_tick {
            match self.receiver.try_recv() {
                Ok(event) => tick.events.push(event),
                Err(TryRecvError::Empty) => return tick,
                Err(TryRecvError::Disconnected) => {
                    tick.disconnected = true;
                    return tick;
                }
            }
        }

        if self.receiver.len() > self.backlog_limit {
            for event in self.receiver.try_iter() {
                if event.is_finished() {
                    tick.events.push(event);
                } else {
                    tick.discarded += 1;
                }
            }
            tracing::debug!(discarded = tick.discarded, "event backlog flushed");
        }
        tick
    }
}

/// Shared cancellation flag; set once by the interactive side, polled by the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, for registration with signal handlers.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}
