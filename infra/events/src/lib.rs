//! # Event Bus
//!
//! A typed, asynchronous broadcast bus that lets feature slices react to each
//! other without compile-time coupling. Channels are keyed by the event's
//! [`TypeId`](std::any::TypeId) and created on first use.
//!
//! # Example
//!
//! ```rust
//! use cardly_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct CardPublished { slug: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe::<CardPublished>()?;
//!     bus.publish(CardPublished { slug: "jane".into() })?;
//!
//!     let event = rx.next_event().await.unwrap();
//!     assert_eq!(event.slug, "jane");
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
