use cardly_event_bus::{EventBus, EventBusError, EventReceiverExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
struct CardViewed(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
struct ContactCaptured(&'static str);

#[tokio::test]
async fn published_events_reach_subscribers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<CardViewed>().unwrap();

    assert_eq!(bus.publish(CardViewed(42)).unwrap(), 1);

    let received = rx.next_event().await.unwrap();
    assert_eq!(*received, CardViewed(42));
}

#[tokio::test]
async fn publishing_without_subscribers_is_not_an_error() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(CardViewed(1)).unwrap(), 0);
}

#[tokio::test]
async fn event_types_are_isolated() {
    let bus = EventBus::new();
    let mut views = bus.subscribe::<CardViewed>().unwrap();
    let mut contacts = bus.subscribe::<ContactCaptured>().unwrap();

    bus.publish(CardViewed(7)).unwrap();
    bus.publish(ContactCaptured("jane")).unwrap();

    assert_eq!(views.next_event().await.unwrap().0, 7);
    assert_eq!(contacts.next_event().await.unwrap().0, "jane");
}

#[tokio::test]
async fn lagged_receivers_resume_from_the_buffer_tail() {
    let bus = EventBus::new();
    let capacity = 2;
    let mut rx = bus.subscribe_with_capacity::<CardViewed>(capacity).unwrap();

    for i in 0..100 {
        bus.publish(CardViewed(i)).unwrap();
    }

    let first = rx.next_event().await.unwrap();
    assert!(first.0 >= 100 - capacity, "expected the buffer tail, got {}", first.0);
    let second = rx.next_event().await.unwrap();
    assert_eq!(second.0, first.0 + 1);
}

#[tokio::test]
async fn zero_capacity_is_rejected() {
    let bus = EventBus::new();
    let err = bus.subscribe_with_capacity::<CardViewed>(0).unwrap_err();
    assert!(matches!(err, EventBusError::InvalidCapacity { .. }));
}

#[tokio::test]
async fn listeners_handle_events_until_shutdown() {
    let bus = EventBus::new();
    let seen = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&seen);
    let handle = bus
        .listen::<CardViewed, _, _>("test", move |event| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(event.0, Ordering::SeqCst);
            }
        })
        .unwrap();

    bus.publish(CardViewed(2)).unwrap();
    bus.publish(CardViewed(3)).unwrap();

    for _ in 0..50 {
        if seen.load(Ordering::SeqCst) == 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen.load(Ordering::SeqCst), 5);

    assert_eq!(bus.shutdown(), 1);
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}
