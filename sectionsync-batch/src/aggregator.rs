//! Throttled aggregation of change notifications.
//!
//! A single task owns every subscription's [`ChangeBatch`]. Producers talk to
//! it through an [`AggregatorHandle`], whose methods only push a command onto
//! an unbounded channel, so they never block and may be called from any
//! thread. Finished batches come out of the task as [`Flush`]es on a second
//! channel, in the order they were produced.
//!
//! # Flush Triggers
//!
//! A subscription's batch is flushed when either:
//! - no enqueue arrived for `quiescence` (debounce)
//! - `max_latency` elapsed since the first pending enqueue (bounded mode only)
//! - `force_flush` was requested for it
//!
//! In immediate mode every enqueue is flushed right away.

use crate::change_batch::{ChangeBatch, Digest};
use crate::error::{BatchError, BatchResult};
use sectionsync_types::{OperationKind, Record, SubscriptionId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace};

/// Default quiet period before a batch is flushed.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// AggregatorConfig
// ---------------------------------------------------------------------------

/// Configuration for a batch aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Quiet period after the last enqueue before a batch is flushed.
    pub quiescence: Duration,
    /// Flush after every enqueue instead of debouncing.
    pub immediate: bool,
    /// Upper bound on how long a batch may keep accumulating under
    /// continuous activity. `None` means plain debounce.
    pub max_latency: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            quiescence: DEFAULT_QUIESCENCE,
            immediate: false,
            max_latency: None,
        }
    }
}

impl AggregatorConfig {
    /// A configuration that flushes every enqueue immediately.
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            ..Self::default()
        }
    }

    /// A debounce that never holds a batch longer than `max_latency`.
    pub fn bounded(quiescence: Duration, max_latency: Duration) -> Self {
        Self {
            quiescence,
            immediate: false,
            max_latency: Some(max_latency),
        }
    }
}

// ---------------------------------------------------------------------------
// Flush
// ---------------------------------------------------------------------------

/// A finished batch for one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Flush<R> {
    pub subscription: SubscriptionId,
    pub digest: Digest<R>,
}

/// Receiving end of an aggregator's flush stream.
pub type FlushReceiver<R> = mpsc::UnboundedReceiver<Flush<R>>;

// ---------------------------------------------------------------------------
// AggregatorHandle
// ---------------------------------------------------------------------------

enum Command<R> {
    Enqueue {
        subscription: SubscriptionId,
        records: Vec<R>,
        kind: OperationKind,
    },
    ForceFlush(SubscriptionId),
    Cancel(SubscriptionId),
    Shutdown,
}

/// Cloneable producer side of a [`BatchAggregator`].
pub struct AggregatorHandle<R> {
    commands: mpsc::UnboundedSender<Command<R>>,
}

impl<R> Clone for AggregatorHandle<R> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<R: Record> AggregatorHandle<R> {
    fn send(&self, command: Command<R>) -> BatchResult<()> {
        self.commands
            .send(command)
            .map_err(|_| BatchError::AggregatorClosed)
    }

    /// Adds records to a subscription's pending batch.
    ///
    /// An empty `records` list still arms the subscription's flush timer, so
    /// a data source can report "no results" and the consumer still receives
    /// a (empty) flush.
    pub fn enqueue(
        &self,
        subscription: SubscriptionId,
        records: Vec<R>,
        kind: OperationKind,
    ) -> BatchResult<()> {
        self.send(Command::Enqueue {
            subscription,
            records,
            kind,
        })
    }

    /// Delivers the subscription's batch now, even if it is empty.
    pub fn force_flush(&self, subscription: SubscriptionId) -> BatchResult<()> {
        self.send(Command::ForceFlush(subscription))
    }

    /// Discards the subscription's pending batch. Nothing already discarded
    /// is ever delivered.
    pub fn cancel(&self, subscription: SubscriptionId) -> BatchResult<()> {
        self.send(Command::Cancel(subscription))
    }

    /// Stops the aggregator task. Pending batches are dropped.
    pub fn shutdown(&self) -> BatchResult<()> {
        self.send(Command::Shutdown)
    }

    /// Returns true once the aggregator task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

// ---------------------------------------------------------------------------
// BatchAggregator
// ---------------------------------------------------------------------------

/// Pending batch plus its flush deadline.
struct Slot<R: Record> {
    batch: ChangeBatch<R>,
    /// When the first pending enqueue arrived.
    opened: Instant,
    /// When this batch is due.
    deadline: Instant,
}

/// Single-writer owner of every subscription's pending batch.
pub struct BatchAggregator<R: Record> {
    config: AggregatorConfig,
    slots: HashMap<SubscriptionId, Slot<R>>,
    commands: mpsc::UnboundedReceiver<Command<R>>,
    output: mpsc::UnboundedSender<Flush<R>>,
}

impl<R: Record> BatchAggregator<R> {
    /// Spawns an aggregator task on the current tokio runtime.
    ///
    /// Returns the producer handle and the flush stream. The task stops when
    /// every handle is dropped, on [`AggregatorHandle::shutdown`], or when the
    /// flush receiver is dropped.
    pub fn spawn(config: AggregatorConfig) -> (AggregatorHandle<R>, FlushReceiver<R>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (flush_tx, flush_rx) = mpsc::unbounded_channel();

        let aggregator = Self {
            config,
            slots: HashMap::new(),
            commands: command_rx,
            output: flush_tx,
        };
        tokio::spawn(aggregator.run());

        (
            AggregatorHandle {
                commands: command_tx,
            },
            flush_rx,
        )
    }

    async fn run(mut self) {
        loop {
            let next = self.next_deadline();
            let sleep_target = next.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    // Deadlines can expire while commands keep arriving.
                    if !self.handle(command) || !self.flush_due(Instant::now()) {
                        break;
                    }
                }
                _ = time::sleep_until(sleep_target), if next.is_some() => {
                    if !self.flush_due(Instant::now()) {
                        break;
                    }
                }
            }
        }

        info!(
            "Batch aggregator stopped, dropping {} pending batch(es)",
            self.slots.len()
        );
    }

    /// Applies one command. Returns false when the task should stop.
    fn handle(&mut self, command: Command<R>) -> bool {
        match command {
            Command::Enqueue {
                subscription,
                records,
                kind,
            } => {
                trace!("Enqueue {} {} record(s) for {}", records.len(), kind, subscription);
                let now = Instant::now();
                let quiescence = self.config.quiescence;
                let max_latency = self.config.max_latency;

                let slot = self.slots.entry(subscription).or_insert_with(|| Slot {
                    batch: ChangeBatch::new(),
                    opened: now,
                    deadline: now,
                });
                slot.batch.extend(records, kind);
                slot.deadline = match max_latency {
                    Some(max) => (now + quiescence).min(slot.opened + max),
                    None => now + quiescence,
                };

                if self.config.immediate {
                    return self.flush(subscription);
                }
                true
            }
            Command::ForceFlush(subscription) => {
                debug!("Forced flush for {}", subscription);
                if !self.slots.contains_key(&subscription) {
                    return self.deliver(subscription, Digest::empty());
                }
                self.flush(subscription)
            }
            Command::Cancel(subscription) => {
                if let Some(slot) = self.slots.remove(&subscription) {
                    debug!(
                        "Cancelled {} with {} pending operation(s)",
                        subscription,
                        slot.batch.pending_len()
                    );
                }
                true
            }
            Command::Shutdown => false,
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().map(|slot| slot.deadline).min()
    }

    /// Flushes every batch whose deadline has passed, earliest first.
    fn flush_due(&mut self, now: Instant) -> bool {
        let mut due: Vec<(Instant, SubscriptionId)> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .map(|(id, slot)| (slot.deadline, *id))
            .collect();
        due.sort();

        for (_, subscription) in due {
            if !self.flush(subscription) {
                return false;
            }
        }
        true
    }

    fn flush(&mut self, subscription: SubscriptionId) -> bool {
        let digest = match self.slots.remove(&subscription) {
            Some(mut slot) => slot.batch.flush(),
            None => return true,
        };
        self.deliver(subscription, digest)
    }

    fn deliver(&mut self, subscription: SubscriptionId, digest: Digest<R>) -> bool {
        debug!(
            "Flushing {}: {} inserted, {} updated, {} deleted",
            subscription,
            digest.inserted.len(),
            digest.updated.len(),
            digest.deleted.len()
        );
        self.output
            .send(Flush {
                subscription,
                digest,
            })
            .is_ok()
    }
}
