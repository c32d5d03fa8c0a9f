use crate::helpers::{configure_database, connect, InMemoryStore};
use claim::{assert_err, assert_ok};
use diesel::{QueryDsl, RunQueryDsl};
use quakewatch::domain::{EventType, SubscriberEmail};
use quakewatch::models;
use quakewatch::schema::subscriptions;
use quakewatch::store::{subscribe, SubscribeError, SubscriptionStore};

#[test]
fn a_valid_subscription_is_stored_pending() {
    let mut store = InMemoryStore::default();

    let new_subscriber = subscribe(
        &mut store,
        "ursula@example.com".into(),
        4.5,
        "quarry blast",
    )
    .unwrap();

    assert_eq!(new_subscriber.filter.event_type, EventType::QuarryBlast);
    assert_eq!(store.rows.len(), 1);
    assert_eq!(store.rows[0].min_magnitude, 4.5);
    assert!(!store.rows[0].sent);
}

#[test]
fn subscribing_twice_keeps_one_row() {
    let mut store = InMemoryStore::default();

    assert_ok!(subscribe(&mut store, "ursula@example.com".into(), 2.5, "earthquake"));
    let second = subscribe(&mut store, "ursula@example.com".into(), 5.0, "explosion");

    assert!(matches!(second, Err(SubscribeError::DuplicateSubscription)));
    assert_eq!(store.rows.len(), 1);
    assert_eq!(store.rows[0].min_magnitude, 2.5);
}

#[test]
fn invalid_requests_never_create_a_row() {
    let mut store = InMemoryStore::default();
    let test_cases = vec![
        ("not-an-email", 2.5, "earthquake", "an invalid email"),
        ("", 2.5, "earthquake", "an empty email"),
        ("ursula@example.com", 0.5, "earthquake", "a magnitude below the scale"),
        ("ursula@example.com", 2.5, "tornado", "an unknown event type"),
    ];

    for (email, min_magnitude, event_type, description) in test_cases {
        let outcome = subscribe(&mut store, email.into(), min_magnitude, event_type);
        assert!(
            matches!(
                outcome,
                Err(SubscribeError::InvalidEmail(_)) | Err(SubscribeError::InvalidFilter(_))
            ),
            "The store accepted {}.",
            description
        );
    }
    assert!(store.rows.is_empty());
}

fn load_rows(connection: &mut diesel::PgConnection) -> Vec<models::Subscription> {
    subscriptions::table
        .order(subscriptions::email)
        .load::<models::Subscription>(connection)
        .expect("Failed to load subscriptions.")
}

#[test]
#[ignore = "requires a running Postgres instance"]
fn postgres_rejects_a_duplicate_email() {
    let (_, mut connection) = configure_database();

    assert_ok!(subscribe(&mut connection, "ursula@example.com".into(), 2.5, "earthquake"));
    let second = subscribe(&mut connection, "ursula@example.com".into(), 3.0, "earthquake");

    assert!(matches!(second, Err(SubscribeError::DuplicateSubscription)));
    assert_eq!(load_rows(&mut connection).len(), 1);
}

#[test]
#[ignore = "requires a running Postgres instance"]
fn postgres_stores_nothing_for_an_invalid_email() {
    let (_, mut connection) = configure_database();

    assert_err!(subscribe(&mut connection, "not-an-email".into(), 2.5, "earthquake"));

    assert!(load_rows(&mut connection).is_empty());
}

#[test]
#[ignore = "requires a running Postgres instance"]
fn postgres_tracks_the_sent_flag() {
    let (_, mut connection) = configure_database();
    for email in ["ada@example.com", "grace@example.com"] {
        subscribe(&mut connection, email.into(), 2.5, "earthquake").unwrap();
    }

    connection
        .mark_sent(&SubscriberEmail::parse("ada@example.com".into()).unwrap())
        .unwrap();
    let pending: Vec<_> = connection
        .list_pending()
        .unwrap()
        .into_iter()
        .map(|s| s.unwrap().email.as_ref().to_string())
        .collect();
    assert_eq!(pending, vec!["grace@example.com"]);

    assert_eq!(connection.reset_all_sent().unwrap(), 2);
    assert!(load_rows(&mut connection).iter().all(|row| !row.sent));
}

#[test]
#[ignore = "requires a running Postgres instance"]
fn initializing_twice_is_harmless() {
    let (_, mut connection) = configure_database();

    assert_ok!(connection.initialize());
}

#[test]
#[ignore = "requires a running Postgres instance"]
fn only_one_session_holds_the_run_lock() {
    let (configuration, mut first) = configure_database();
    let mut second = connect(&configuration);

    assert!(first.try_acquire_run_lock().unwrap());
    assert!(!second.try_acquire_run_lock().unwrap());

    first.release_run_lock().unwrap();
    assert!(second.try_acquire_run_lock().unwrap());
    second.release_run_lock().unwrap();
}

#[test]
#[ignore = "requires a running Postgres instance"]
fn concurrent_subscribes_for_one_email_store_one_row() {
    let (configuration, mut connection) = configure_database();
    let barrier = std::sync::Barrier::new(2);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let mut racer = connect(&configuration);
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    subscribe(&mut racer, "ursula@example.com".into(), 2.5, "earthquake")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("A subscribing thread panicked."))
            .collect()
    });

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let duplicates = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(SubscribeError::DuplicateSubscription)))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(load_rows(&mut connection).len(), 1);
}
