/// Room event handler tests
/// Exercise join, search, enqueue, vote and play/pause over the hub channels
mod common;

use common::{drain, Call, Harness};
use jukebox_core::{ConnectionId, DeviceId, PatronId, RoomId, TrackId};
use jukebox_server::realtime::{ClientEvent, ServerEvent};
use jukebox_server::services::{PlaybackAction, QueueSnapshot};

fn room(id: &str) -> RoomId {
    RoomId::new(id)
}

fn last_snapshot(events: &[ServerEvent]) -> Option<&QueueSnapshot> {
    events.iter().rev().find_map(|event| match event {
        ServerEvent::QueueSnapshot(snapshot) => Some(snapshot),
        _ => None,
    })
}

#[tokio::test]
async fn test_guest_joins_searches_and_enqueues() {
    let harness = Harness::new();
    for id in ["abc", "def", "ghi", "jkl", "mno", "pqr"] {
        harness.fake.add_track(id, 180_000);
    }

    let connection = ConnectionId::generate();
    let mut rx = harness.state.hub.connect(connection.clone()).await;
    let events = &harness.state.events;

    events
        .handle(
            &connection,
            ClientEvent::Join {
                room_id: room("7"),
                token: None,
            },
        )
        .await;

    let joined = drain(&mut rx);
    assert_eq!(
        joined[0],
        ServerEvent::Joined {
            room_id: room("7"),
            needs_authorization: true,
        }
    );
    assert!(last_snapshot(&joined).unwrap().entries.is_empty());

    events
        .handle(
            &connection,
            ClientEvent::Search {
                room_id: room("7"),
                query: "song".to_string(),
            },
        )
        .await;

    match drain(&mut rx).as_slice() {
        [ServerEvent::SearchResults { tracks: Some(tracks), .. }] => {
            assert!(!tracks.is_empty());
            assert!(tracks.len() <= 5);
        }
        other => panic!("Expected search results, got {:?}", other),
    }

    events
        .handle(
            &connection,
            ClientEvent::EnqueueRequest {
                token: None,
                room_id: room("7"),
                track_id: TrackId::new("abc"),
            },
        )
        .await;

    let published = drain(&mut rx);
    let snapshot = last_snapshot(&published).unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].track.track_id, TrackId::new("abc"));
    assert_eq!(snapshot.entries[0].agree, 1);
    assert_eq!(snapshot.entries[0].disagree, 0);
}

#[tokio::test]
async fn test_empty_query_returns_null_results() {
    let harness = Harness::new();
    let (connection, mut rx) = harness.listener("7").await;
    drain(&mut rx);

    harness.state.events.search(&connection, &room("7"), "   ").await;

    assert_eq!(
        drain(&mut rx),
        vec![ServerEvent::SearchResults {
            room_id: room("7"),
            tracks: None,
        }]
    );
    assert_eq!(harness.fake.count(|call| matches!(call, Call::Search(_))), 0);
}

#[tokio::test]
async fn test_search_on_unknown_room_returns_empty_list() {
    let harness = Harness::new();
    harness.fake.add_track("abc", 180_000);
    let connection = ConnectionId::generate();
    let mut rx = harness.state.hub.connect(connection.clone()).await;

    harness.state.events.search(&connection, &room("nowhere"), "song").await;

    assert_eq!(
        drain(&mut rx),
        vec![ServerEvent::SearchResults {
            room_id: room("nowhere"),
            tracks: Some(Vec::new()),
        }]
    );
}

#[tokio::test]
async fn test_enqueue_and_vote_on_unknown_room_are_ignored() {
    let harness = Harness::new();
    let events = &harness.state.events;

    events.enqueue(None, &room("ghost"), TrackId::new("abc")).await;
    events.vote(None, &room("ghost"), TrackId::new("abc"), true).await;

    assert!(harness.state.registry.is_empty().await);
    assert!(harness.fake.calls().is_empty());
}

#[tokio::test]
async fn test_duplicate_enqueue_counts_as_agree_vote() {
    let harness = Harness::new();
    harness.fake.add_track("abc", 180_000);
    let (_connection, mut rx) = harness.listener("7").await;
    let alice = harness.patron_token("alice");
    let bob = harness.patron_token("bob");

    let events = &harness.state.events;
    events.enqueue(Some(&alice), &room("7"), TrackId::new("abc")).await;
    events.enqueue(Some(&bob), &room("7"), TrackId::new("abc")).await;

    let snapshot = last_snapshot(&drain(&mut rx)).cloned().unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].agree, 2);
}

#[tokio::test]
async fn test_second_vote_by_same_patron_is_not_published() {
    let harness = Harness::new();
    harness.fake.add_track("abc", 180_000);
    let (_connection, mut rx) = harness.listener("7").await;
    let alice = harness.patron_token("alice");
    let bob = harness.patron_token("bob");

    let events = &harness.state.events;
    events.enqueue(Some(&alice), &room("7"), TrackId::new("abc")).await;
    events.vote(Some(&bob), &room("7"), TrackId::new("abc"), false).await;
    drain(&mut rx);

    events.vote(Some(&bob), &room("7"), TrackId::new("abc"), true).await;
    events.vote(Some(&bob), &room("7"), TrackId::new("missing"), true).await;

    assert!(drain(&mut rx).is_empty());
    let handle = harness.state.registry.get(&room("7")).await.unwrap();
    let guard = handle.lock().await;
    let entry = guard.queue.get(&TrackId::new("abc")).unwrap();
    assert!(entry.disagrees(&PatronId::new("bob")));
    assert_eq!(entry.agree_count(), 1);
}

#[tokio::test]
async fn test_track_without_metadata_is_omitted() {
    let harness = Harness::new();
    harness.fake.add_track("abc", 180_000);
    let (_connection, mut rx) = harness.listener("7").await;

    let handle = harness.state.registry.get(&room("7")).await.unwrap();
    handle
        .lock()
        .await
        .queue
        .add(TrackId::new("gone"), PatronId::new("p1"));
    harness.state.events.enqueue(None, &room("7"), TrackId::new("abc")).await;

    let snapshot = last_snapshot(&drain(&mut rx)).cloned().unwrap();
    let ids: Vec<_> = snapshot.entries.iter().map(|e| e.track.track_id.clone()).collect();
    assert_eq!(ids, vec![TrackId::new("abc")]);
    assert_eq!(handle.lock().await.queue.len(), 2);
}

#[tokio::test]
async fn test_unknown_track_is_not_enqueued() {
    let harness = Harness::new();
    let (_connection, mut rx) = harness.listener("7").await;
    drain(&mut rx);

    harness.state.events.enqueue(None, &room("7"), TrackId::new("gone")).await;

    assert!(last_snapshot(&drain(&mut rx)).is_none());
    let handle = harness.state.registry.get(&room("7")).await.unwrap();
    assert!(handle.lock().await.queue.is_empty());
}

#[tokio::test]
async fn test_join_needs_authorization_until_device_bound() {
    let harness = Harness::new();
    harness.authorized_room("7", None).await;
    harness.authorized_room("8", Some("dev-1")).await;

    let (_a, mut unbound) = harness.listener("7").await;
    let (_b, mut bound) = harness.listener("8").await;

    let needs = |events: Vec<ServerEvent>| {
        events.into_iter().find_map(|event| match event {
            ServerEvent::Joined { needs_authorization, .. } => Some(needs_authorization),
            _ => None,
        })
    };
    assert_eq!(needs(drain(&mut unbound)), Some(true));
    assert_eq!(needs(drain(&mut bound)), Some(false));
}

#[tokio::test]
async fn test_rejected_catalog_token_is_exchanged_once() {
    let harness = Harness::new();
    harness.fake.add_track("abc", 180_000);
    let (connection, mut rx) = harness.listener("7").await;
    drain(&mut rx);
    harness.fake.with(|state| state.catalog_rejections = 1);

    harness.state.events.search(&connection, &room("7"), "song").await;

    assert_eq!(harness.fake.count(|call| *call == Call::ClientToken), 2);
    match drain(&mut rx).as_slice() {
        [ServerEvent::SearchResults { tracks: Some(tracks), .. }] => assert_eq!(tracks.len(), 1),
        other => panic!("Expected search results, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_removes_membership() {
    let harness = Harness::new();
    let (connection, _rx) = harness.listener("7").await;
    assert_eq!(harness.state.registry.members(&room("7")).await, vec![connection.clone()]);

    harness.state.events.disconnect(&connection).await;

    assert!(harness.state.registry.members(&room("7")).await.is_empty());
    assert!(harness.state.registry.room_of(&connection).await.is_none());
    assert!(harness.state.registry.get(&room("7")).await.is_some());
}

#[tokio::test]
async fn test_leave_other_room_is_ignored() {
    let harness = Harness::new();
    let (connection, _rx) = harness.listener("7").await;

    harness.state.events.leave(&connection, &room("8")).await;
    assert_eq!(harness.state.registry.room_of(&connection).await, Some(room("7")));

    harness.state.events.leave(&connection, &room("7")).await;
    assert!(harness.state.registry.room_of(&connection).await.is_none());
}

mod play_pause {
    use super::*;

    #[tokio::test]
    async fn test_patron_cannot_control_playback() {
        let harness = Harness::new();
        let handle = harness.authorized_room("7", Some("dev-1")).await;
        harness.fake.set_playing("current", 200_000, 10_000);
        let patron = harness.patron_token("alice");

        harness
            .state
            .events
            .play_pause(&patron, &room("7"), PlaybackAction::Pause)
            .await;

        assert!(harness.fake.calls().is_empty());
        assert!(!handle.lock().await.paused);
    }

    #[tokio::test]
    async fn test_clerk_of_other_room_cannot_control_playback() {
        let harness = Harness::new();
        harness.authorized_room("7", Some("dev-1")).await;
        let clerk = harness.clerk_token("8");

        harness
            .state
            .events
            .play_pause(&clerk, &room("7"), PlaybackAction::Pause)
            .await;

        assert!(harness.fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clerk_without_device_is_a_no_op() {
        let harness = Harness::new();
        let handle = harness.authorized_room("7", None).await;
        let (_connection, mut rx) = harness.listener("7").await;
        drain(&mut rx);
        let clerk = harness.clerk_token("7");

        harness
            .state
            .events
            .play_pause(&clerk, &room("7"), PlaybackAction::Pause)
            .await;

        assert!(harness.fake.calls().is_empty());
        assert!(!handle.lock().await.paused);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_clerk_pauses_playing_device() {
        let harness = Harness::new();
        let handle = harness.authorized_room("7", Some("dev-1")).await;
        harness.fake.set_playing("current", 200_000, 10_000);
        let (_connection, mut rx) = harness.listener("7").await;
        drain(&mut rx);
        let clerk = harness.clerk_token("7");

        harness
            .state
            .events
            .handle(
                &ConnectionId::generate(),
                ClientEvent::PlayPause {
                    token: clerk,
                    room_id: room("7"),
                    action: PlaybackAction::Pause,
                },
            )
            .await;

        assert_eq!(
            harness.fake.count(|call| *call == Call::Pause(DeviceId::new("dev-1"))),
            1
        );
        assert!(handle.lock().await.paused);
        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::PlayerStateChanged {
                room_id: room("7"),
                action: PlaybackAction::Pause,
            }]
        );
    }

    #[tokio::test]
    async fn test_pause_on_paused_player_sends_nothing() {
        let harness = Harness::new();
        let handle = harness.authorized_room("7", Some("dev-1")).await;
        harness.fake.set_paused("current");
        let clerk = harness.clerk_token("7");

        harness
            .state
            .events
            .play_pause(&clerk, &room("7"), PlaybackAction::Pause)
            .await;

        assert_eq!(harness.fake.count(Call::is_player_command), 0);
        assert!(handle.lock().await.paused);
    }

    #[tokio::test]
    async fn test_clerk_resumes_and_clears_paused_flag() {
        let harness = Harness::new();
        let handle = harness.authorized_room("7", Some("dev-1")).await;
        harness.fake.set_paused("current");
        handle.lock().await.paused = true;
        let clerk = harness.clerk_token("7");

        harness
            .state
            .events
            .play_pause(&clerk, &room("7"), PlaybackAction::Resume)
            .await;

        assert_eq!(
            harness.fake.count(|call| *call == Call::Resume(DeviceId::new("dev-1"))),
            1
        );
        assert!(!handle.lock().await.paused);
    }
}
