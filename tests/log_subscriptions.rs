use std::sync::{Arc, Mutex};

use reqlog::{
    log::RequestLog,
    message::{HttpHost, LogRecord, RequestSnapshot, ResponseSnapshot, Scheme},
    persist::sqlite::SqliteLogSink,
    subscribe::{ChangeHandle, FilterHandle, UpdateHandle, UpdateListeners},
};

fn open_log() -> RequestLog {
    let sink = SqliteLogSink::open_in_memory().expect("open sqlite");
    RequestLog::open(Box::new(sink)).expect("open log")
}

fn host(name: &str) -> HttpHost {
    HttpHost {
        scheme: Scheme::Http,
        name: name.to_string(),
        port: 80,
    }
}

fn request(target: &str) -> RequestSnapshot {
    RequestSnapshot {
        method: "GET".to_string(),
        target: target.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: vec![],
        body: vec![],
    }
}

fn response(status: u16) -> ResponseSnapshot {
    ResponseSnapshot {
        status,
        reason: String::new(),
        version: "HTTP/1.1".to_string(),
        headers: vec![],
        body: vec![],
    }
}

fn collector() -> (Arc<Mutex<Vec<u64>>>, UpdateHandle) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: UpdateHandle = Arc::new(move |record: &LogRecord| {
        sink.lock().expect("lock").push(record.id);
    });
    (seen, callback)
}

#[test]
fn subscriber_receives_only_records_created_after_registration() {
    let log = open_log();
    log.add_request(&request("/old1"), host("h")).expect("add");
    log.add_request(&request("/old2"), host("h")).expect("add");

    let (seen, callback) = collector();
    log.add_update_listener(callback);

    let id = log.add_request(&request("/new"), host("h")).expect("add");
    assert_eq!(*seen.lock().expect("lock"), vec![id]);
}

#[test]
fn filtered_subscription_sees_matching_hosts_in_creation_order() {
    let log = open_log();
    let (seen, callback) = collector();
    let key = host("alpha").key();
    let filter: FilterHandle = Arc::new(move |record: &LogRecord| record.host.key() == key);
    log.add_update_listener_filtered(callback, filter);

    log.add_request(&request("/1"), host("alpha")).expect("add");
    log.add_request(&request("/2"), host("beta")).expect("add");
    log.add_request(&request("/3"), host("alpha")).expect("add");
    log.add_request(&request("/4"), host("beta")).expect("add");

    assert_eq!(*seen.lock().expect("lock"), vec![1, 3]);
}

#[test]
fn change_events_fire_once_per_attach_and_never_for_new_records() {
    let log = open_log();

    let changes = Arc::new(Mutex::new(Vec::new()));
    let change_sink = Arc::clone(&changes);
    let change_callback: ChangeHandle = Arc::new(move |record: &LogRecord| {
        let status = record.response.as_ref().map(|r| r.status);
        change_sink.lock().expect("lock").push((record.id, status));
    });
    log.add_change_listener(change_callback);

    let id = log.add_request(&request("/a"), host("h")).expect("add");
    log.add_request_response(&request("/b"), &response(200), host("h"))
        .expect("add");
    assert!(changes.lock().expect("lock").is_empty());

    log.add_response(id, &response(302)).expect("attach");
    assert_eq!(*changes.lock().expect("lock"), vec![(id, Some(302))]);
}

#[test]
fn unknown_id_response_fires_no_change_event() {
    let log = open_log();
    let fired = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&fired);
    let callback: ChangeHandle = Arc::new(move |_: &LogRecord| {
        *counter.lock().expect("lock") += 1;
    });
    log.add_change_listener(callback);

    log.add_response(404, &response(200)).expect("no-op");
    assert_eq!(*fired.lock().expect("lock"), 0);
}

#[test]
fn new_record_subscribers_see_no_change_traffic() {
    let log = open_log();
    let (seen, callback) = collector();
    log.add_update_listener(callback);

    let id = log.add_request(&request("/a"), host("h")).expect("add");
    log.add_response(id, &response(200)).expect("attach");

    // One new-record delivery; attaching the response adds nothing.
    assert_eq!(*seen.lock().expect("lock"), vec![id]);
}

#[test]
fn removal_drops_every_registration_of_the_callback() {
    let log = open_log();
    let (seen, callback) = collector();

    log.add_update_listener(Arc::clone(&callback));
    log.add_update_listener(Arc::clone(&callback));
    assert_eq!(log.update_listener_count(), 2);

    log.add_request(&request("/twice"), host("h")).expect("add");
    assert_eq!(seen.lock().expect("lock").len(), 2);

    let removed = log.remove_update_listener(&callback);
    assert_eq!(removed, 2);
    assert_eq!(log.update_listener_count(), 0);

    log.add_request(&request("/silent"), host("h")).expect("add");
    assert_eq!(seen.lock().expect("lock").len(), 2);
}

#[test]
fn removing_one_callback_leaves_others_registered() {
    let log = open_log();
    let (seen_a, callback_a) = collector();
    let (seen_b, callback_b) = collector();

    log.add_update_listener(Arc::clone(&callback_a));
    log.add_update_listener(Arc::clone(&callback_b));
    log.remove_update_listener(&callback_a);

    log.add_request(&request("/only-b"), host("h")).expect("add");
    assert!(seen_a.lock().expect("lock").is_empty());
    assert_eq!(seen_b.lock().expect("lock").len(), 1);
}

#[test]
fn panicking_subscriber_is_isolated() {
    let log = open_log();
    let panicking: UpdateHandle = Arc::new(|_: &LogRecord| panic!("subscriber bug"));
    let (seen, callback) = collector();

    // Registered first, so it runs before the healthy subscriber.
    log.add_update_listener(panicking);
    log.add_update_listener(callback);

    let id1 = log.add_request(&request("/a"), host("h")).expect("add");
    let id2 = log.add_request(&request("/b"), host("h")).expect("add");
    assert_eq!(*seen.lock().expect("lock"), vec![id1, id2]);
}

#[test]
fn change_listener_removal_is_independent_of_update_listeners() {
    let log = open_log();
    let fired = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&fired);
    let change_callback: ChangeHandle = Arc::new(move |_: &LogRecord| {
        *counter.lock().expect("lock") += 1;
    });

    log.add_change_listener(Arc::clone(&change_callback));
    assert_eq!(log.change_listener_count(), 1);
    assert_eq!(log.update_listener_count(), 0);

    let id = log.add_request(&request("/a"), host("h")).expect("add");
    log.add_response(id, &response(200)).expect("attach");
    assert_eq!(*fired.lock().expect("lock"), 1);

    assert_eq!(log.remove_change_listener(&change_callback), 1);
    log.add_response(id, &response(500)).expect("attach");
    assert_eq!(*fired.lock().expect("lock"), 1);
}

#[test]
fn baseline_records_the_population_at_registration() {
    let mut listeners = UpdateListeners::new();
    let (_, callback) = collector();

    listeners.add(Arc::clone(&callback), None, 0);
    listeners.add(callback, None, 5);

    let baselines: Vec<usize> = listeners
        .subscriptions()
        .iter()
        .map(|sub| sub.baseline())
        .collect();
    assert_eq!(baselines, vec![0, 5]);
    assert!(!listeners.subscriptions()[0].is_filtered());
}
