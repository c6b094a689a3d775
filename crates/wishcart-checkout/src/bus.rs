//! In-process publish/subscribe for availability events.

use wishcart_core::AvailabilityEvent;

type Handler = Box<dyn Fn(&AvailabilityEvent) + Send + Sync>;

/// Delivers each published [`AvailabilityEvent`] to every subscriber,
/// synchronously and in registration order.
///
/// Built by the composing layer and passed to whoever publishes; there is no
/// process-wide instance. Subscribe everything before handing it out.
#[derive(Default)]
pub struct NotificationBus {
    subscribers: Vec<Handler>,
}

impl NotificationBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&AvailabilityEvent) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(handler));
    }

    /// Calls every subscriber with `event` and returns how many were notified.
    /// Publishing with no subscribers is fine and returns 0.
    pub fn publish(&self, event: &AvailabilityEvent) -> usize {
        tracing::debug!(
            company = %event.company_name,
            url = %event.url,
            subscribers = self.subscribers.len(),
            "publishing availability event"
        );
        for handler in &self.subscribers {
            handler(event);
        }
        self.subscribers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
