use crate::events::{Highlight, ViewerEvent};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Outbound queue depth per viewer connection.
const QUEUE_DEPTH: usize = 256;

struct ViewerSlot {
    id: u64,
    tx: mpsc::Sender<ViewerEvent>,
}

/// Routes outbound events to the one live viewer connection.
///
/// The hub only reads the highlight; it is written through the
/// `watch::Sender` held by the bridge handle.
pub struct EventHub {
    viewer: Mutex<Option<ViewerSlot>>,
    highlight: watch::Receiver<Option<Highlight>>,
    connected: watch::Sender<bool>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new(highlight: watch::Receiver<Option<Highlight>>) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            viewer: Mutex::new(None),
            highlight,
            connected,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new viewer, superseding any previous one. The pending
    /// highlight, if any, is queued ahead of everything else.
    pub fn attach(&self) -> (u64, mpsc::Receiver<ViewerEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);

        // read the highlight under the slot lock so a concurrent publish
        // lands either in this snapshot or in the new slot
        let mut viewer = self.lock_viewer();
        if let Some(highlight) = self.current_highlight() {
            let _ = tx.try_send(highlight.into());
        }

        let previous = viewer.replace(ViewerSlot { id, tx });
        drop(viewer);
        if let Some(old) = previous {
            info!("Viewer {} superseded by viewer {}", old.id, id);
        } else {
            info!("Viewer {} connected", id);
        }

        self.connected.send_replace(true);
        (id, rx)
    }

    /// Forget viewer `id` if it is still the live one.
    pub fn detach(&self, id: u64) {
        let mut viewer = self.lock_viewer();
        if viewer.as_ref().is_some_and(|slot| slot.id == id) {
            *viewer = None;
            self.connected.send_replace(false);
            info!("Viewer {} disconnected", id);
        }
    }

    /// Queue `event` for the live viewer. Returns false when nobody is
    /// listening or the queue is full; the event is dropped either way.
    pub fn publish(&self, event: ViewerEvent) -> bool {
        let viewer = self.lock_viewer();
        let Some(slot) = viewer.as_ref() else {
            debug!("No viewer connected, dropping {:?}", event);
            return false;
        };

        match slot.tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping event for viewer {}: {}", slot.id, e);
                false
            }
        }
    }

    /// Resend the pending highlight to viewer `id` after it reports a page load.
    pub fn replay_highlight(&self, id: u64) -> bool {
        let viewer = self.lock_viewer();
        let Some(highlight) = self.current_highlight() else {
            return false;
        };
        match viewer.as_ref() {
            Some(slot) if slot.id == id => slot.tx.try_send(highlight.into()).is_ok(),
            _ => false,
        }
    }

    /// Drop the live viewer's queue so its connection sends a close frame.
    pub fn close(&self) {
        if let Some(slot) = self.lock_viewer().take() {
            self.connected.send_replace(false);
            info!("Viewer {} closed", slot.id);
        }
    }

    pub fn current_highlight(&self) -> Option<Highlight> {
        self.highlight.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    fn lock_viewer(&self) -> std::sync::MutexGuard<'_, Option<ViewerSlot>> {
        // the slot stays consistent even if a holder panicked
        self.viewer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
