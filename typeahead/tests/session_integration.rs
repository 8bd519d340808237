//! End-to-end behaviour of a search session against realistic corpora.

use std::sync::Arc;
use std::time::Duration;

use typeahead::{find_best_match, ObservableList, SearchSession, SessionConfig};

#[derive(Debug, Clone)]
struct Track {
    title: String,
}

fn track(title: &str) -> Track {
    Track { title: title.to_string() }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_end_to_end_example() {
    let session = SearchSession::default();
    session.set_corpus(&["Alpha", "Bravo", "Charlie", "Delta"]);

    session.search("a");
    session.wait_idle().await;

    assert_eq!(session.current_index(), Some(0));
}

#[tokio::test]
async fn test_typing_narrows_selection() {
    let session = SearchSession::default();
    session.set_corpus(&["Documents", "Downloads", "Desktop", "Music", "Pictures"]);

    let mut seen = Vec::new();
    for key in ["d", "o", "w"] {
        session.search(key);
        session.wait_idle().await;
        seen.push(session.current_index());
    }

    assert_eq!(seen, vec![Some(0), Some(0), Some(1)]);
    assert_eq!(session.buffer(), "dow");
}

#[tokio::test]
async fn test_large_corpus_forks_and_finds_match() {
    let session = SearchSession::new(SessionConfig::default().with_parallelism(8));
    let mut names: Vec<String> = (0..20_000).map(|i| format!("entry number {:05}", i)).collect();
    names[17_345] = "needle in a haystack".to_string();
    names[3_001] = "a haystack needle".to_string();
    session.set_strings(names);
    assert_eq!(session.workload_threshold(), 2000);

    session.search("needle");
    session.wait_idle().await;

    assert_eq!(session.current_index(), Some(17_345));
}

#[tokio::test]
async fn test_large_corpus_tie_goes_forward_from_start() {
    let session = SearchSession::new(SessionConfig::default().with_parallelism(4));
    let names: Vec<String> = (0..12_000)
        .map(|i| if i % 2500 == 0 { format!("match {}", i) } else { format!("other {}", i) })
        .collect();
    session.set_strings(names.clone());

    session.search_from("match", 6000);
    session.wait_idle().await;
    assert_eq!(session.current_index(), Some(7500));

    let expected = find_best_match(&names[..], "match", 6000, 18_000).and_then(|m| m.index());
    assert_eq!(expected, Some(7500));
}

#[tokio::test]
async fn test_wraparound_from_late_start() {
    let session = SearchSession::default();
    session.set_corpus(&["apple", "banana", "cherry", "date"]);

    session.search_from("an", 2);
    session.wait_idle().await;

    assert_eq!(session.current_index(), Some(1));
}

#[tokio::test]
async fn test_live_list_updates_corpus() {
    let list = ObservableList::new(vec![track("Intro"), track("Outro")]);
    let session = SearchSession::default();
    session.bind_live(&list, |t: &Track| Ok::<_, std::fmt::Error>(t.title.clone()));
    assert_eq!(session.corpus_len(), 2);

    list.push(track("Interlude"));
    assert_eq!(session.corpus_len(), 3);

    session.search("interl");
    session.wait_idle().await;
    assert_eq!(session.current_index(), Some(2));
}

#[test]
fn test_live_list_failed_rebuild_keeps_previous_corpus() {
    let list = ObservableList::new(vec![track("One"), track("Two")]);
    let session = SearchSession::default();
    session.bind_live(&list, |t: &Track| {
        if t.title.is_empty() {
            Err("empty title")
        } else {
            Ok(t.title.clone())
        }
    });

    list.push(track(""));

    assert_eq!(session.corpus_len(), 2);
    assert_eq!(session.corpus().get(1), Some("Two"));
    assert_eq!(list.listener_count(), 1);
}

#[test]
fn test_setting_corpus_detaches_live_list() {
    let list = ObservableList::new(vec![track("One")]);
    let session = SearchSession::default();
    session.bind_live(&list, |t: &Track| Ok::<_, std::fmt::Error>(t.title.clone()));

    session.set_corpus(&["x", "y", "z"]);
    list.push(track("Two"));

    assert_eq!(session.corpus_len(), 3);
    assert_eq!(list.listener_count(), 0);
}

#[test]
fn test_dropped_session_unsubscribes_from_live_list() {
    let list = ObservableList::new(vec![track("One")]);
    let session = SearchSession::default();
    session.bind_live(&list, |t: &Track| Ok::<_, std::fmt::Error>(t.title.clone()));
    assert_eq!(list.listener_count(), 1);

    drop(session);
    list.push(track("Two"));

    assert_eq!(list.listener_count(), 0);
}

#[test]
fn test_session_outside_tokio_runtime() {
    // No runtime here: the session falls back to its own.
    let session = SearchSession::default();
    session.set_corpus(&["red", "green", "blue"]);

    session.search("ee");

    runtime().block_on(session.wait_idle());
    assert_eq!(session.current_index(), Some(1));
}

#[test]
fn test_session_shared_across_threads() {
    let session = Arc::new(SearchSession::default());
    session.set_corpus(&["north", "south", "east", "west"]);

    let worker = {
        let session = Arc::clone(&session);
        std::thread::spawn(move || session.search("we"))
    };
    worker.join().unwrap();

    runtime().block_on(session.wait_idle());
    assert_eq!(session.current_index(), Some(3));
}

#[tokio::test]
async fn test_subscribers_see_latest_index() {
    let session = SearchSession::default();
    session.set_corpus(&["one", "two", "three"]);
    session.set_timeout(Duration::from_millis(30));
    let mut rx = session.subscribe();

    session.search("tw");
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), Some(1));

    tokio::time::sleep(Duration::from_millis(80)).await;
    session.search("thr");
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), Some(2));
}
