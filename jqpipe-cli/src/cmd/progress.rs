use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use jqpipe_exec::executor::{Event, EventSink};

/// Renders a one-line item/attempt counter on stderr.
#[derive(Default)]
pub struct ProgressEventSink {
    total_items: AtomicUsize,
    finished: AtomicUsize,
    retries: AtomicUsize,
}

impl ProgressEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_progress(&self, current: Option<(usize, usize)>) {
        let total = self.total_items.load(Ordering::Relaxed);
        let done = self.finished.load(Ordering::Relaxed);
        let retries = self.retries.load(Ordering::Relaxed);
        match current {
            Some((item, attempt)) => eprint!(
                "\rProgress: [{done}/{total}] item {item} attempt {attempt} (retries {retries})"
            ),
            None => eprint!("\rProgress: [{done}/{total}] (retries {retries})"),
        }
    }
}

#[async_trait]
impl EventSink for ProgressEventSink {
    async fn emit(&self, event: Event) {
        match event {
            Event::RunStarted { items, .. } => {
                self.total_items.store(items, Ordering::Relaxed);
            }
            Event::ItemStarted { item, attempt, .. } => self.update_progress(Some((item, attempt))),
            Event::RetryRequested { .. } => {
                self.retries.fetch_add(1, Ordering::Relaxed);
            }
            Event::ItemFinished { .. } => {
                self.finished.fetch_add(1, Ordering::Relaxed);
                self.update_progress(None);
            }
            Event::RunFinished { .. } => {
                if self.total_items.load(Ordering::Relaxed) > 0 {
                    eprintln!();
                }
            }
            _ => {}
        }
    }
}
