//! Issuance notifications
//!
//! Generators report `Generating` once the subject is accepted and
//! `Generated` after the token is signed. Delivery is fire-and-forget: a
//! listener that fails or panics is logged and never fails the issuance.

use crate::token::Token;
use arc_swap::ArcSwap;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{trace, warn};

const DEFAULT_CAPACITY: usize = 1024;

/// Notification emitted around token issuance
#[derive(Debug, Clone)]
pub enum TokenEvent {
    /// The subject was accepted and claims are about to be composed
    Generating {
        /// Generator name
        generator: String,
        /// Subject of the token
        subject: String,
    },
    /// The token was signed
    Generated {
        /// Generator name
        generator: String,
        /// The signed token
        token: Token,
    },
}

impl TokenEvent {
    /// Name of the generator that emitted the event
    #[must_use]
    pub fn generator(&self) -> &str {
        match self {
            TokenEvent::Generating { generator, .. } | TokenEvent::Generated { generator, .. } => {
                generator
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            TokenEvent::Generating { .. } => "generating",
            TokenEvent::Generated { .. } => "generated",
        }
    }
}

/// Failure reported by a listener
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    /// Create a listener error
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Synchronous event listener
pub trait TokenListener: Send + Sync + 'static {
    /// Handle one event
    ///
    /// # Errors
    /// Any error is logged by the dispatcher and otherwise ignored.
    fn handle(&self, event: &TokenEvent) -> Result<(), ListenerError>;
}

impl<F> TokenListener for F
where
    F: Fn(&TokenEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    fn handle(&self, event: &TokenEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Fans events out to registered listeners and async subscribers
pub struct EventDispatcher {
    listeners: ArcSwap<Vec<Arc<dyn TokenListener>>>,
    sender: broadcast::Sender<TokenEvent>,
}

impl EventDispatcher {
    /// Dispatcher with the default subscriber buffer
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Dispatcher whose async subscribers lag after `capacity` unread events
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
            sender,
        }
    }

    /// Register a synchronous listener
    pub fn listen(&self, listener: impl TokenListener) {
        let listener: Arc<dyn TokenListener> = Arc::new(listener);
        self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&listener));
            next
        });
    }

    /// Receive every event emitted from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TokenEvent> {
        self.sender.subscribe()
    }

    /// Number of synchronous listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.load().len()
    }

    /// Deliver `event` to every listener and subscriber
    pub fn dispatch(&self, event: TokenEvent) {
        trace!(generator = event.generator(), kind = event.kind(), "Dispatching JWT event");

        for listener in self.listeners.load().iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.handle(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(
                    generator = event.generator(),
                    kind = event.kind(),
                    %error,
                    "JWT event listener failed"
                ),
                Err(payload) => warn!(
                    generator = event.generator(),
                    kind = event.kind(),
                    panic = panic_message(payload.as_ref()),
                    "JWT event listener panicked"
                ),
            }
        }

        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}
