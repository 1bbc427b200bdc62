// In crates/engine/src/runner.rs

use crate::report::RunReport;
use crate::strategy_engine::StrategyEngine;
use crate::Result;
use core_types::{Bar, OrderNotification};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tokio::sync::{mpsc, watch};

/// One unit of work for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    Bar(Bar),
    Notification(OrderNotification),
}

/// What woke the loop up.
enum Wake {
    Shutdown { sender_alive: bool },
    Notification(OrderNotification),
    Bar(Option<Bar>),
}

/// Drives a [`StrategyEngine`] from a bar feed and the gateway's
/// notification channel.
///
/// All inputs go through a single FIFO queue and are handled one at a time.
/// Notifications already sitting in the channel are always queued ahead of
/// the next bar, so a fill is applied before the bar that follows it is
/// evaluated.
pub struct Runner<F> {
    engine: StrategyEngine,
    feed: F,
    notifications: mpsc::UnboundedReceiver<OrderNotification>,
    queue: VecDeque<EngineInput>,
}

impl<F> Runner<F>
where
    F: Stream<Item = Bar> + Unpin,
{
    pub fn new(
        engine: StrategyEngine,
        feed: F,
        notifications: mpsc::UnboundedReceiver<OrderNotification>,
    ) -> Self {
        Self {
            engine,
            feed,
            notifications,
            queue: VecDeque::new(),
        }
    }

    /// Runs until the feed is exhausted and every queued input has been
    /// handled, or until `shutdown` flips to `true`. Shutdown is honored
    /// between inputs, never in the middle of one.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunReport> {
        tracing::info!("Starting strategy run.");

        let mut feed_done = false;
        let mut watching = true;

        let halted = loop {
            if *shutdown.borrow() {
                break true;
            }

            // 1. Work already queued.
            if let Some(input) = self.queue.pop_front() {
                self.dispatch(input)?;
                continue;
            }

            // 2. Anything the gateway has already sent.
            if self.drain_notifications() > 0 {
                continue;
            }

            if feed_done {
                break false;
            }

            // 3. Wait for the next thing to happen.
            let wake = tokio::select! {
                biased;

                changed = shutdown.changed(), if watching => Wake::Shutdown { sender_alive: changed.is_ok() },
                Some(notification) = self.notifications.recv() => Wake::Notification(notification),
                bar = self.feed.next() => Wake::Bar(bar),
            };

            match wake {
                Wake::Shutdown { sender_alive } => {
                    if !sender_alive {
                        // Nobody can ask us to stop any more.
                        watching = false;
                    }
                }
                Wake::Notification(notification) => {
                    self.queue.push_back(EngineInput::Notification(notification));
                }
                Wake::Bar(Some(bar)) => {
                    // The venue sees the bar first; whatever it reports goes
                    // ahead of the bar itself.
                    self.engine.gateway_mut().on_market_data(&bar);
                    self.drain_notifications();
                    self.queue.push_back(EngineInput::Bar(bar));
                }
                Wake::Bar(None) => {
                    tracing::info!("Bar feed exhausted.");
                    feed_done = true;
                }
            }
        };

        if halted {
            tracing::warn!(queued = self.queue.len(), "Shutdown requested; stopping run.");
        }

        Ok(self.engine.finish(halted))
    }

    fn dispatch(&mut self, input: EngineInput) -> Result<()> {
        match input {
            EngineInput::Bar(bar) => self.engine.on_bar(&bar),
            EngineInput::Notification(notification) => {
                self.engine.on_notification(notification);
                Ok(())
            }
        }
    }

    fn drain_notifications(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(notification) = self.notifications.try_recv() {
            self.queue.push_back(EngineInput::Notification(notification));
            drained += 1;
        }
        drained
    }
}
