//! Topic filter to handler routing for received messages

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::messaging::topic::{TopicError, TopicFilter};
use crate::types::{InboundMessage, Qos};

/// Callback run for every message whose topic matches the registered filter
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

struct Route {
    filter: TopicFilter,
    qos: Qos,
    handler: MessageHandler,
}

/// Ordered set of subscriptions. A message is delivered to every matching route.
#[derive(Default)]
pub struct TopicRouter {
    routes: Vec<Route>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. The filter is validated before anything is registered.
    pub fn register<F>(&mut self, filter: &str, qos: Qos, handler: F) -> Result<(), TopicError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let filter = TopicFilter::parse(filter)?;
        debug!("Registered route for {} at {}", filter, qos);
        self.routes.push(Route {
            filter,
            qos,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Registered filters with their subscription QoS, in registration order
    pub fn filters(&self) -> impl Iterator<Item = (&TopicFilter, Qos)> {
        self.routes.iter().map(|route| (&route.filter, route.qos))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Run every handler whose filter matches the message topic; returns how many ran
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let mut delivered = 0;
        for route in self
            .routes
            .iter()
            .filter(|route| route.filter.matches(&message.topic))
        {
            (route.handler)(message);
            delivered += 1;
        }
        if delivered == 0 {
            warn!("No route matched message on {}", message.topic);
        }
        delivered
    }
}

impl fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|route| route.filter.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> impl Fn(&InboundMessage) + Send + Sync {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_dispatch_runs_every_matching_handler() {
        let states = Arc::new(AtomicUsize::new(0));
        let everything = Arc::new(AtomicUsize::new(0));

        let mut router = TopicRouter::new();
        router
            .register("+/+/+/state", Qos::AtMostOnce, counting_handler(&states))
            .unwrap();
        router
            .register("#", Qos::AtLeastOnce, counting_handler(&everything))
            .unwrap();

        let delivered = router.dispatch(&InboundMessage::new("fleet/truck/7/state", "{}"));
        assert_eq!(delivered, 2);

        let delivered = router.dispatch(&InboundMessage::new("fleet/truck/7/telemetry", "{}"));
        assert_eq!(delivered, 1);

        assert_eq!(states.load(Ordering::SeqCst), 1);
        assert_eq!(everything.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unmatched_message_runs_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut router = TopicRouter::new();
        router
            .register(
                "vehicles/+/state",
                Qos::AtMostOnce,
                counting_handler(&counter),
            )
            .unwrap();

        assert_eq!(router.dispatch(&InboundMessage::new("other/topic", "x")), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_filter_is_not_registered() {
        let mut router = TopicRouter::new();
        let result = router.register("a/#/b", Qos::AtMostOnce, |_| {});
        assert!(matches!(result, Err(TopicError::InvalidFilter { .. })));
        assert!(router.is_empty());
    }

    #[test]
    fn test_filters_keep_registration_order() {
        let mut router = TopicRouter::new();
        router.register("b/#", Qos::AtLeastOnce, |_| {}).unwrap();
        router.register("a/+", Qos::AtMostOnce, |_| {}).unwrap();

        let filters: Vec<(String, Qos)> = router
            .filters()
            .map(|(filter, qos)| (filter.to_string(), qos))
            .collect();
        assert_eq!(
            filters,
            vec![
                ("b/#".to_string(), Qos::AtLeastOnce),
                ("a/+".to_string(), Qos::AtMostOnce)
            ]
        );
    }
}
