//! Mode signal with change notification
//!
//! [`ModeSignal`] is a stack of [`GameMode`]s (pause menus push over play,
//! resuming pops back) plus a subscriber list that is notified on every
//! change of the top of the stack. Handlers run synchronously on the thread
//! that changed the mode, outside the signal's lock, so a handler may read
//! the signal again.

use crate::mode::{GameMode, ModeChange};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub u64);

type ModeHandler = Arc<dyn Fn(&ModeChange) + Send + Sync>;

struct SignalInner {
    /// Mode stack (current mode is last element)
    stack: Vec<GameMode>,
    /// Every change that was published
    history: Vec<ModeChange>,
    handlers: BTreeMap<SubscriberId, ModeHandler>,
    next_subscriber_id: u64,
}

/// Externally owned game mode with change notification
#[derive(Clone)]
pub struct ModeSignal {
    inner: Arc<Mutex<SignalInner>>,
}

impl ModeSignal {
    /// Create a signal starting in `initial`
    pub fn new(initial: GameMode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SignalInner {
                stack: vec![initial],
                history: Vec::new(),
                handlers: BTreeMap::new(),
                next_subscriber_id: 1,
            })),
        }
    }

    /// Current mode
    pub fn current(&self) -> GameMode {
        self.inner
            .lock()
            .stack
            .last()
            .copied()
            .unwrap_or_default()
    }

    /// Whether the current mode is active play
    pub fn is_active_play(&self) -> bool {
        self.current().is_active_play()
    }

    /// Full mode stack, bottom first
    pub fn stack(&self) -> Vec<GameMode> {
        self.inner.lock().stack.clone()
    }

    /// Every published change, oldest first
    pub fn history(&self) -> Vec<ModeChange> {
        self.inner.lock().history.clone()
    }

    /// Push a mode over the current one
    pub fn push(&self, mode: GameMode) {
        self.mutate(|stack| stack.push(mode));
    }

    /// Pop the current mode, returning to the previous one
    ///
    /// The bottom mode is never popped.
    pub fn pop(&self) -> Option<GameMode> {
        let mut popped = None;
        self.mutate(|stack| {
            if stack.len() > 1 {
                popped = stack.pop();
            }
        });
        popped
    }

    /// Replace the current mode
    pub fn set(&self, mode: GameMode) {
        self.mutate(|stack| match stack.last_mut() {
            Some(last) => *last = mode,
            None => stack.push(mode),
        });
    }

    /// Clear the stack down to a single mode
    pub fn reset(&self, mode: GameMode) {
        self.mutate(|stack| {
            stack.clear();
            stack.push(mode);
        });
    }

    /// Register a change handler
    ///
    /// The handler stays registered until the returned subscription is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> ModeSubscription
    where
        F: Fn(&ModeChange) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = SubscriberId(inner.next_subscriber_id);
        inner.next_subscriber_id += 1;
        inner.handlers.insert(id, Arc::new(handler));
        ModeSubscription {
            id,
            signal: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    /// A token that is cancelled as soon as the mode leaves active play
    ///
    /// The link lives as long as the returned subscription. If the signal is
    /// not in active play right now the token starts cancelled.
    pub fn play_token(&self) -> (CancellationToken, ModeSubscription) {
        let token = CancellationToken::new();
        let linked = token.clone();
        let subscription = self.subscribe(move |change| {
            if !change.to.is_active_play() {
                linked.cancel();
            }
        });
        if !self.is_active_play() {
            token.cancel();
        }
        (token, subscription)
    }

    fn mutate<F>(&self, change: F)
    where
        F: FnOnce(&mut Vec<GameMode>),
    {
        let (event, handlers) = {
            let mut inner = self.inner.lock();
            let from = inner.stack.last().copied().unwrap_or_default();
            change(&mut inner.stack);
            let to = inner.stack.last().copied().unwrap_or_default();
            if from == to {
                return;
            }
            let event = ModeChange::new(from, to);
            inner.history.push(event);
            let handlers: Vec<ModeHandler> = inner.handlers.values().cloned().collect();
            (event, handlers)
        };

        log::debug!("Mode changed: {} -> {}", event.from, event.to);
        for handler in handlers {
            handler(&event);
        }
    }
}

impl Default for ModeSignal {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

impl std::fmt::Debug for ModeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ModeSignal")
            .field("stack", &inner.stack)
            .field("subscribers", &inner.handlers.len())
            .finish()
    }
}

/// A registered change handler; unsubscribes on drop
#[derive(Debug)]
pub struct ModeSubscription {
    id: SubscriberId,
    signal: Weak<Mutex<SignalInner>>,
}

impl ModeSubscription {
    /// Subscriber ID of this registration
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the handler now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for ModeSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.lock().handlers.remove(&self.id);
        }
    }
}
