use crate::error::EventBusError;
use crate::receiver::EventReceiverExt;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Buffer size for a channel created on first use.
const DEFAULT_CAPACITY: usize = 256;

/// Marker trait for types that can be sent across the [`EventBus`].
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

/// Thread-safe broadcast bus. Cloning is cheap and clones share channels.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to events of type `T`.
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        Ok(self.sender::<T>(DEFAULT_CAPACITY)?.subscribe())
    }

    /// Subscribes with an explicit buffer size. The size only applies when this call
    /// creates the channel.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        if capacity == 0 {
            return Err(EventBusError::InvalidCapacity {
                message: "capacity must be greater than zero".into(),
                context: Some(std::any::type_name::<T>().into()),
            });
        }
        Ok(self.sender::<T>(capacity)?.subscribe())
    }

    /// Publishes an event and returns the number of receivers that got it.
    ///
    /// Publishing without subscribers is not an error; the event is dropped.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        let sender = self.sender::<T>(DEFAULT_CAPACITY)?;
        match sender.send(Arc::new(event)) {
            Ok(count) => {
                trace!(event = std::any::type_name::<T>(), count, "Event dispatched");
                Ok(count)
            }
            Err(_) => {
                trace!(event = std::any::type_name::<T>(), "Event dropped: no active subscribers");
                Ok(0)
            }
        }
    }

    /// Spawns a task that feeds every `T` into `handler` until the bus shuts down.
    ///
    /// The subscription is registered before this returns, so events published
    /// afterwards are never missed. Must be called inside a Tokio runtime.
    pub fn listen<T, F, Fut>(&self, name: &'static str, handler: F) -> Result<JoinHandle<()>, EventBusError>
    where
        T: Event,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.subscribe::<T>()?;
        debug!(listener = name, event = std::any::type_name::<T>(), "Event listener started");

        Ok(tokio::spawn(async move {
            while let Some(event) = rx.next_event().await {
                handler(event).await;
            }
            debug!(listener = name, "Event listener stopped");
        }))
    }

    /// Drops every channel, which ends all listeners. Returns the number of channels closed.
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn sender<T: Event>(&self, capacity: usize) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        let id = TypeId::of::<T>();

        if let Some(existing) = self.channels.read().get(&id) {
            return downcast::<T>(existing.as_ref());
        }

        let mut channels = self.channels.write();
        let entry = channels.entry(id).or_insert_with(|| {
            trace!(event = std::any::type_name::<T>(), capacity, "Initializing event channel");
            let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
            Box::new(tx)
        });
        downcast::<T>(entry.as_ref())
    }
}

fn downcast<T: Event>(
    sender: &(dyn Any + Send + Sync),
) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
    sender.downcast_ref::<broadcast::Sender<Arc<T>>>().cloned().ok_or_else(|| {
        EventBusError::TypeMismatch {
            message: std::any::type_name::<T>().into(),
            context: Some("Unexpected sender type in channel registry".into()),
        }
    })
}
