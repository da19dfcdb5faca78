// src/painter/event_loop.rs
//! OperationLoop - dedicated worker thread that applies operations to a
//! double-buffered surface.
//!
//! Threading model:
//! - Producers (script submission, HTTP handler, console) call `Poster::post`
//!   from any thread.
//! - One worker owns the `State` and both surfaces; nothing else touches them
//!   while the loop runs.
//! - The bounded operation queue is the only backpressure: a full queue blocks
//!   the posting producer until the worker frees a slot.
//!
//! Lifecycle: `Idle -> Running -> Stopping -> Stopped`. Stop is one-shot.
//! Once requested, `post` silently drops operations. Whatever is still queued
//! when the worker notices the stop signal is handled by the `ShutdownPolicy`.

use crate::painter::op::Operation;
use crate::painter::state::State;
use crate::surface::{Screen, Surface};
use anyhow::{bail, Context, Result};
use crossbeam::channel::{self, Sender, TryRecvError};
use log::*;
use serde::{Deserialize, Serialize};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Consumer of presentable frames (typically a window).
///
/// Called synchronously on the worker thread: the worker does not continue
/// until `update` returns, so a slow receiver throttles the loop.
pub trait Receiver<S>: Send {
    fn update(&mut self, surface: &S);
}

/// What the worker does with operations still queued when it observes stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Drop them unexecuted.
    #[default]
    Discard,
    /// Apply them (presenting as usual) before exiting.
    Drain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Sizing and shutdown parameters for an `OperationLoop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOptions {
    pub width: u32,
    pub height: u32,
    pub queue_capacity: usize,
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for LoopOptions {
    fn default() -> Self {
        LoopOptions {
            width: 400,
            height: 400,
            queue_capacity: 100,
            shutdown_policy: ShutdownPolicy::Discard,
        }
    }
}

/// Cloneable producer handle.
#[derive(Clone, Debug)]
pub struct Poster {
    queue_tx: Sender<Operation>,
    stop_requested: Arc<AtomicBool>,
}

impl Poster {
    /// Enqueue `op`, blocking while the queue is full.
    ///
    /// After stop has been requested this returns immediately and `op` is
    /// dropped.
    pub fn post(&self, op: Operation) {
        if self.stop_requested.load(Ordering::Acquire) {
            trace!("OperationLoop: dropping '{}' posted after stop", op.name());
            return;
        }
        if let Err(e) = self.queue_tx.send(op) {
            trace!(
                "OperationLoop: worker gone, dropping '{}'",
                e.into_inner().name()
            );
        }
    }
}

pub struct OperationLoop {
    options: LoopOptions,
    status: LoopStatus,
    stop_requested: Arc<AtomicBool>,
    poster: Option<Poster>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<State>>,
    final_state: Option<State>,
}

impl OperationLoop {
    pub fn new(options: LoopOptions) -> Self {
        OperationLoop {
            options,
            status: LoopStatus::Idle,
            stop_requested: Arc::new(AtomicBool::new(false)),
            poster: None,
            stop_tx: None,
            worker: None,
            final_state: None,
        }
    }

    /// Allocate the two surfaces, create the queue and spawn the worker.
    ///
    /// The worker takes ownership of `state` and `receiver` until stop.
    pub fn start<Sc, R>(&mut self, screen: &Sc, receiver: R, state: State) -> Result<Poster>
    where
        Sc: Screen,
        R: Receiver<Sc::Surface> + 'static,
    {
        if self.status != LoopStatus::Idle {
            bail!("operation loop cannot start from {:?}", self.status);
        }

        let LoopOptions {
            width,
            height,
            queue_capacity,
            shutdown_policy,
        } = self.options;
        let next = screen
            .new_surface(width, height)
            .context("Failed to allocate next surface")?;
        let prev = screen
            .new_surface(width, height)
            .context("Failed to allocate prev surface")?;

        let (queue_tx, queue_rx) = channel::bounded(queue_capacity);
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        let worker = Worker {
            state,
            next,
            prev,
            receiver,
            policy: shutdown_policy,
            applied: 0,
            frames: 0,
        };
        let handle = thread::Builder::new()
            .name("painter-loop".to_string())
            .spawn(move || worker.run(queue_rx, stop_rx))
            .context("Failed to spawn operation loop thread")?;

        let poster = Poster {
            queue_tx,
            stop_requested: self.stop_requested.clone(),
        };
        self.poster = Some(poster.clone());
        self.stop_tx = Some(stop_tx);
        self.worker = Some(handle);
        self.status = LoopStatus::Running;
        info!(
            "OperationLoop: started ({}x{}, queue capacity {}, {:?} on shutdown)",
            width, height, queue_capacity, shutdown_policy
        );
        Ok(poster)
    }

    /// Same as `Poster::post`. A loop that was never started drops `op`.
    pub fn post(&self, op: Operation) {
        match &self.poster {
            Some(poster) => poster.post(op),
            None => debug!("OperationLoop: not started, dropping '{}'", op.name()),
        }
    }

    /// A producer handle, once the loop has been started.
    pub fn poster(&self) -> Option<Poster> {
        self.poster.clone()
    }

    pub fn status(&self) -> LoopStatus {
        self.status
    }

    /// Request stop and block until the worker has exited.
    ///
    /// An operation already being applied runs to completion first. Calling
    /// this again is a no-op.
    pub fn stop_and_wait(&mut self) {
        match self.status {
            LoopStatus::Stopping | LoopStatus::Stopped => return,
            LoopStatus::Idle => {
                self.stop_requested.store(true, Ordering::Release);
                self.status = LoopStatus::Stopped;
                return;
            }
            LoopStatus::Running => {}
        }

        info!("OperationLoop: stop requested");
        self.stop_requested.store(true, Ordering::Release);
        self.status = LoopStatus::Stopping;
        // Closing the stop channel is the signal.
        drop(self.stop_tx.take());

        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(state) => self.final_state = Some(state),
                Err(e) => error!("OperationLoop: worker thread panicked: {:?}", e),
            }
        }
        self.status = LoopStatus::Stopped;
        info!("OperationLoop: stopped");
    }

    /// The state the worker held when it exited. Available once after stop.
    pub fn take_state(&mut self) -> Option<State> {
        self.final_state.take()
    }
}

impl Drop for OperationLoop {
    fn drop(&mut self) {
        if self.status == LoopStatus::Running {
            debug!("OperationLoop dropped while running");
            self.stop_and_wait();
        }
    }
}

/// Worker-side state, owned by the loop thread.
struct Worker<S, R> {
    state: State,
    next: S,
    prev: S,
    receiver: R,
    policy: ShutdownPolicy,
    applied: u64,
    frames: u64,
}

impl<S, R> Worker<S, R>
where
    S: Surface + Clone,
    R: Receiver<S>,
{
    fn run(mut self, queue_rx: channel::Receiver<Operation>, stop_rx: channel::Receiver<()>) -> State {
        info!("OperationLoop: worker started");

        let pending = loop {
            if stop_signaled(&stop_rx) {
                break None;
            }
            crossbeam::select! {
                recv(stop_rx) -> _ => break None,
                recv(queue_rx) -> msg => match msg {
                    // Both were ready and select picked the operation; stop wins.
                    Ok(op) if stop_signaled(&stop_rx) => break Some(op),
                    Ok(op) => self.execute(op),
                    Err(_) => {
                        info!("OperationLoop: queue closed");
                        break None;
                    }
                },
            }
        };

        self.shutdown(pending, &queue_rx);
        info!(
            "OperationLoop: worker stopped after {} operations, {} frames",
            self.applied, self.frames
        );
        self.state
    }

    fn execute(&mut self, op: Operation) {
        trace!("OperationLoop: applying '{}'", op.name());
        let ready = op.apply(&mut self.state, &mut self.next);
        self.applied += 1;
        if ready {
            self.present();
        }
    }

    /// Hand `next` to the receiver, then swap roles.
    ///
    /// The receiver only borrows the frame, so the new `next` is overwritten
    /// with the frame just presented. Figures and rects are drawn
    /// incrementally and would otherwise be missing from alternate frames.
    fn present(&mut self) {
        self.receiver.update(&self.next);
        mem::swap(&mut self.next, &mut self.prev);
        self.next.clone_from(&self.prev);
        self.frames += 1;
        trace!("OperationLoop: presented frame {}", self.frames);
    }

    fn shutdown(&mut self, pending: Option<Operation>, queue_rx: &channel::Receiver<Operation>) {
        let remaining = pending.into_iter().chain(queue_rx.try_iter());
        match self.policy {
            ShutdownPolicy::Discard => {
                let dropped = remaining.count();
                if dropped > 0 {
                    debug!("OperationLoop: discarded {} queued operations", dropped);
                }
            }
            ShutdownPolicy::Drain => {
                let mut drained = 0usize;
                for op in remaining {
                    self.execute(op);
                    drained += 1;
                }
                debug!("OperationLoop: drained {} queued operations", drained);
            }
        }
    }
}

fn stop_signaled(stop_rx: &channel::Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}
