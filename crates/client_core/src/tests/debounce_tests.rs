use super::*;
use tokio::time::{sleep, Instant};

type Calls = Arc<Mutex<Vec<(String, Instant)>>>;

fn recorder() -> (
    Calls,
    impl Fn(String) -> futures::future::Ready<()> + Send + Sync + 'static,
) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let callback = move |value: String| {
        lock(&sink).push((value, Instant::now()));
        futures::future::ready(())
    };
    (calls, callback)
}

#[tokio::test(start_paused = true)]
async fn burst_of_calls_fires_once_with_last_arguments() {
    let (calls, callback) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(500), callback);

    for query in ["E", "En", "Eng", "Engi", "Engin"] {
        debouncer.call(query.to_string());
        sleep(Duration::from_millis(100)).await;
    }
    sleep(Duration::from_millis(600)).await;

    let calls = lock(&calls);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "Engin");
}

#[tokio::test(start_paused = true)]
async fn fires_after_quiet_period_from_last_call() {
    let (calls, callback) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(500), callback);
    let started = Instant::now();

    debouncer.call("a".to_string());
    sleep(Duration::from_millis(300)).await;
    debouncer.call("b".to_string());
    sleep(Duration::from_millis(1000)).await;

    let calls = lock(&calls);
    assert_eq!(calls.len(), 1);
    let fired_after = calls[0].1 - started;
    assert!(fired_after >= Duration::from_millis(800));
    assert!(fired_after < Duration::from_millis(810));
}

#[tokio::test(start_paused = true)]
async fn separate_windows_fire_separately() {
    let (calls, callback) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(200), callback);

    debouncer.call("first".to_string());
    sleep(Duration::from_millis(250)).await;
    debouncer.call("second".to_string());
    sleep(Duration::from_millis(250)).await;

    let values: Vec<String> = lock(&calls).iter().map(|(v, _)| v.clone()).collect();
    assert_eq!(values, vec!["first".to_string(), "second".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn replacing_callback_keeps_timer_and_uses_latest_callback() {
    let (old_calls, old_callback) = recorder();
    let (new_calls, new_callback) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(500), old_callback);
    let started = Instant::now();

    debouncer.call("query".to_string());
    sleep(Duration::from_millis(300)).await;
    debouncer.set_callback(new_callback);
    assert!(debouncer.is_pending());
    sleep(Duration::from_millis(300)).await;

    assert!(lock(&old_calls).is_empty());
    let new_calls = lock(&new_calls);
    assert_eq!(new_calls.len(), 1);
    let fired_after = new_calls[0].1 - started;
    assert!(fired_after >= Duration::from_millis(500));
    assert!(fired_after < Duration::from_millis(510));
}

#[tokio::test(start_paused = true)]
async fn cancel_prevents_pending_call() {
    let (calls, callback) = recorder();
    let debouncer = Debouncer::new(Duration::from_millis(500), callback);

    debouncer.call("draft".to_string());
    assert!(debouncer.cancel());
    assert!(!debouncer.is_pending());
    sleep(Duration::from_secs(1)).await;

    assert!(lock(&calls).is_empty());
    assert!(!debouncer.cancel());
}

#[tokio::test(start_paused = true)]
async fn dropping_debouncer_discards_pending_call() {
    let (calls, callback) = recorder();
    {
        let debouncer = Debouncer::new(Duration::from_millis(500), callback);
        debouncer.call("gone".to_string());
    }
    sleep(Duration::from_secs(1)).await;

    assert!(lock(&calls).is_empty());
}

#[tokio::test(start_paused = true)]
async fn later_call_does_not_abort_running_callback() {
    let finished = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&finished);
    let debouncer = Debouncer::new(Duration::from_millis(100), move |value: String| {
        let sink = Arc::clone(&sink);
        async move {
            sleep(Duration::from_millis(1000)).await;
            lock(&sink).push(value);
        }
    });

    debouncer.call("slow".to_string());
    sleep(Duration::from_millis(200)).await;
    debouncer.call("next".to_string());
    sleep(Duration::from_secs(3)).await;

    assert_eq!(
        *lock(&finished),
        vec!["slow".to_string(), "next".to_string()]
    );
}
