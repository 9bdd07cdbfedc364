//! Registry lifecycle: creation, joining, leaving, termination, listing.


use masquerade_server::error::GameError;
use masquerade_server::protocol::{room_codes, Role, RoomStatus, ServerEvent};
use masquerade_server::room::LeaveAction;
use std::collections::HashSet;
use test_helpers::{drain, quiet_server};

#[tokio::test]
async fn create_validates_room_sizes() {
    let (registry, _provider) = quiet_server();

    assert!(matches!(
        registry.create(None, 0, Some(5)),
        Err(GameError::InvalidArgument(_))
    ));
    assert!(matches!(
        registry.create(None, 5, Some(8)),
        Err(GameError::InvalidArgument(_))
    ));
    assert!(matches!(
        registry.create(None, 2, Some(13)),
        Err(GameError::InvalidArgument(_))
    ));
    assert!(matches!(
        registry.create(None, 3, Some(2)),
        Err(GameError::InvalidArgument(_))
    ));

    assert!(registry.create(None, 1, Some(5)).is_ok());
    assert!(registry.create(None, 4, Some(4)).is_ok());
}

#[tokio::test]
async fn create_seats_agents_on_shuffled_numbers() {
    let (registry, _provider) = quiet_server();
    let room = registry.create(Some("Solo".into()), 1, Some(5)).unwrap();

    assert!(room_codes::is_valid_room_code(&room.code));
    assert_eq!(room.name, "Solo");

    let st = room.lock().await;
    assert_eq!(st.status, RoomStatus::Waiting);

    // Four agents seated, one number left in the pool.
    let agents: Vec<u8> = st.players.iter().map(|p| p.id.number()).collect();
    assert_eq!(agents.len(), 4);
    assert!(st.players.iter().all(|p| p.role == Role::Ai));
    assert!(st
        .players
        .iter()
        .all(|p| p.personality.as_deref().is_some_and(|s| !s.is_empty())));
    assert_eq!(st.slots.remaining(), 1);

    // Agent numbers plus the pool partition 1..=5.
    let mut all: Vec<u8> = agents;
    all.extend(st.slots.iter());
    all.sort_unstable();
    assert_eq!(all, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn join_assigns_unique_ids_and_tracks_creator() {
    let (registry, _provider) = quiet_server();
    let room = registry.create(None, 3, Some(6)).unwrap();
    let code = room.code.clone();

    let first = registry.join(&code).await.unwrap();
    assert!(!first.can_start);
    assert_eq!(first.current_humans, vec![first.player_id]);

    let second = registry.join(&code).await.unwrap();
    assert_ne!(first.player_id, second.player_id);
    assert!(!second.can_start);

    let st = room.lock().await;
    assert_eq!(st.creator, Some(first.player_id));
    assert_eq!(st.human_count(), 2);

    // Every id in the room is distinct.
    let ids: HashSet<_> = st.players.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), st.players.len());
}

#[tokio::test]
async fn join_after_start_is_refused() {
    let (registry, _provider) = quiet_server();
    let room = registry.create(None, 1, Some(4)).unwrap();
    let code = room.code.clone();

    let result = registry.join(&code).await.unwrap();
    assert!(result.can_start);
    assert_eq!(room.lock().await.status, RoomStatus::InProgress);

    assert_eq!(
        registry.join(&code).await.unwrap_err(),
        GameError::RoomInProgress
    );
}

#[tokio::test]
async fn join_unknown_room_is_not_found() {
    let (registry, _provider) = quiet_server();
    assert_eq!(
        registry.join("ZZZZZZ").await.unwrap_err(),
        GameError::NotFound
    );
}

#[tokio::test]
async fn leave_returns_slot_and_is_idempotent() {
    let (registry, _provider) = quiet_server();
    let room = registry.create(None, 3, Some(6)).unwrap();
    let code = room.code.clone();

    let creator = registry.join(&code).await.unwrap();
    let second = registry.join(&code).await.unwrap();

    assert_eq!(
        registry.leave(&code, second.player_id).await.unwrap(),
        LeaveAction::Removed
    );

    {
        let st = room.lock().await;
        assert_eq!(st.human_count(), 1);
        assert!(st.slots.contains(second.player_id.number()));

        // Partition invariant holds through the leave.
        let mut all: Vec<u8> = st.players.iter().map(|p| p.id.number()).collect();
        all.extend(st.slots.iter());
        all.sort_unstable();
        assert_eq!(all, (1..=6).collect::<Vec<u8>>());
    }

    // Second leave is a no-op.
    assert_eq!(
        registry.leave(&code, second.player_id).await.unwrap(),
        LeaveAction::Removed
    );
    assert_eq!(room.lock().await.human_count(), 1);

    // Rejoin reuses a pooled number without producing duplicates.
    let rejoined = registry.join(&code).await.unwrap();
    let st = room.lock().await;
    let ids: HashSet<_> = st.players.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), st.players.len());
    assert!(ids.contains(&rejoined.player_id));
    assert_eq!(st.creator, Some(creator.player_id));
}

#[tokio::test]
async fn creator_leaving_while_waiting_terminates_room() {
    let (registry, _provider) = quiet_server();
    let room = registry.create(None, 2, Some(5)).unwrap();
    let code = room.code.clone();

    let creator = registry.join(&code).await.unwrap();
    let (_conn, mut rx) = room.hub.attach(None);

    assert_eq!(
        registry.leave(&code, creator.player_id).await.unwrap(),
        LeaveAction::Terminated
    );

    // Exactly one terminal event, then the channel closes.
    let events = drain(&mut rx);
    let terminations = events
        .iter()
        .filter(|e| matches!(e, ServerEvent::RoomTerminated { .. }))
        .count();
    assert_eq!(terminations, 1);
    assert!(rx.recv().await.is_none());

    assert!(registry.info(&code).await.is_none());
    assert_eq!(
        registry.join(&code).await.unwrap_err(),
        GameError::NotFound
    );
}

#[tokio::test]
async fn room_emptied_of_humans_is_destroyed() {
    let (registry, _provider) = quiet_server();
    let room = registry.create(None, 2, Some(5)).unwrap();
    let code = room.code.clone();

    let creator = registry.join(&code).await.unwrap();
    let second = registry.join(&code).await.unwrap();
    assert!(second.can_start);

    let (_conn, mut rx) = room.hub.attach(None);

    // In progress, so the creator leaving is an ordinary removal.
    assert_eq!(
        registry.leave(&code, creator.player_id).await.unwrap(),
        LeaveAction::Removed
    );
    // The last human leaving destroys the room.
    assert_eq!(
        registry.leave(&code, second.player_id).await.unwrap(),
        LeaveAction::Removed
    );

    test_helpers::eventually(
        async || registry.info(&code).await.is_none(),
        "room destroyed after last human left",
    )
    .await;

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::RoomTerminated { .. })));
}

#[tokio::test]
async fn listing_shows_waiting_rooms_newest_first() {
    let (registry, _provider) = quiet_server();

    let a = registry.create(Some("a".into()), 2, Some(5)).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let b = registry.create(Some("b".into()), 2, Some(5)).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let c = registry.create(Some("c".into()), 1, Some(5)).unwrap();

    // Fill room c so it starts and drops out of the listing.
    registry.join(&c.code).await.unwrap();

    let (rooms, total_pages) = registry.list_waiting(1, None).await;
    assert_eq!(total_pages, 1);
    let codes: Vec<&str> = rooms.iter().map(|r| r.room_code.as_str()).collect();
    assert_eq!(codes, vec![b.code.as_str(), a.code.as_str()]);

    // Pagination.
    let (page_one, pages) = registry.list_waiting(1, Some(1)).await;
    assert_eq!(pages, 2);
    assert_eq!(page_one.len(), 1);
    assert_eq!(page_one[0].room_code, b.code);
    let (page_two, _) = registry.list_waiting(2, Some(1)).await;
    assert_eq!(page_two[0].room_code, a.code);
}

#[tokio::test]
async fn room_codes_are_unique_in_registry() {
    let (registry, _provider) = quiet_server();
    let mut codes = HashSet::new();
    for _ in 0..50 {
        let room = registry.create(None, 1, Some(3)).unwrap();
        assert!(codes.insert(room.code.clone()), "duplicate code issued");
    }
    assert_eq!(registry.room_count(), 50);
}
