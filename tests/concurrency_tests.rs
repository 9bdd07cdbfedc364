//! The concurrency gate under fire: single-flight generation, phase
//! re-validation around every suspension point, and clean teardown with
//! tasks in flight.


use masquerade_server::error::GameError;
use masquerade_server::llm::CannedProvider;
use masquerade_server::protocol::{Phase, PlayerId, Role, ServerEvent, TypingState};
use std::time::Duration;
use test_helpers::{drain, eventually, fast_settings, phase_of, server_with};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn agents_never_generate_concurrently_with_themselves() {
    // Slow generations, eager speakers, and overlapping triggers: the
    // idle ticker fires every 50ms while generations take ~100ms, so
    // without the processing-set gate the same agent would be launched
    // twice. The provider's overlap detector must stay at zero.
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_millis(700);
    settings.message_cooldown = Duration::from_millis(1);
    settings.max_concurrent_agent_responses = 4;
    let (registry, provider) = server_with(
        CannedProvider::new().with_latency(Duration::from_millis(100)),
        settings,
    );

    let room = registry.create(None, 1, Some(6)).unwrap();
    let code = room.code.clone();
    let joined = registry.join(&code).await.unwrap();

    eventually(
        async || phase_of(&room).await == Phase::Discussion,
        "discussion to open",
    )
    .await;
    // A human message adds a second trigger source on top of the ticker.
    let _ = registry
        .post_message(&code, joined.player_id, "hello everyone".into())
        .await;

    eventually(
        async || phase_of(&room).await != Phase::Discussion,
        "discussion to end",
    )
    .await;

    assert_eq!(
        provider.overlaps(),
        0,
        "two generation tasks ran concurrently for one agent"
    );

    // The gate drains completely once the dust settles.
    eventually(
        async || room.lock().await.processing.is_empty(),
        "processing set to drain",
    )
    .await;

    // No two consecutive history entries share a sender.
    let st = room.lock().await;
    for pair in st.history.windows(2) {
        assert_ne!(pair[0].sender, pair[1].sender, "back-to-back speaker");
    }
}

#[tokio::test]
async fn generation_finishing_after_discussion_is_discarded() {
    // The model call itself outlives the discussion window (layer 2):
    // no typing, no message, history untouched.
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_millis(250);
    settings.voting_time = Duration::from_millis(100);
    let (registry, _provider) = server_with(
        CannedProvider::new().with_message_latency(Duration::from_millis(400)),
        settings,
    );

    let room = registry.create(None, 1, Some(2)).unwrap();
    let code = room.code.clone();
    let _joined = registry.join(&code).await.unwrap();
    let (_conn, mut rx) = room.hub.attach(None);

    eventually(
        async || phase_of(&room).await == Phase::GameOver,
        "game to finish",
    )
    .await;
    // Give the dangling generation time to land and be dropped.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let st = room.lock().await;
    let agent = st
        .players
        .iter()
        .find(|p| p.role == Role::Ai)
        .map(|p| p.id)
        .unwrap();
    assert!(
        st.history.iter().all(|m| m.sender != agent),
        "late generation was committed"
    );
    assert!(st.processing.is_empty());
    drop(st);

    let events = drain(&mut rx);
    assert!(
        !events.iter().any(
            |e| matches!(e, ServerEvent::Message { sender, .. } if *sender == agent)
        ),
        "late agent message was broadcast"
    );
}

#[tokio::test]
async fn typing_delay_crossing_the_boundary_stops_cleanly() {
    // Generation is instant but the typing delay straddles the
    // transition (layer 3): at most typing(start) then typing(stop), and
    // no message.
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_millis(200);
    settings.typing_delay = Duration::from_millis(400);
    settings.voting_time = Duration::from_millis(100);
    let (registry, _provider) = server_with(CannedProvider::new(), settings);

    let room = registry.create(None, 1, Some(2)).unwrap();
    let code = room.code.clone();
    let _joined = registry.join(&code).await.unwrap();
    let (_conn, mut rx) = room.hub.attach(None);

    eventually(
        async || phase_of(&room).await == Phase::GameOver,
        "game to finish",
    )
    .await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let st = room.lock().await;
    let agent = st
        .players
        .iter()
        .find(|p| p.role == Role::Ai)
        .map(|p| p.id)
        .unwrap();
    assert!(st.history.iter().all(|m| m.sender != agent));
    drop(st);

    let events = drain(&mut rx);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ServerEvent::Message { sender, .. } if *sender == agent)));

    // Typing indicators pair up: every start is eventually stopped.
    let starts = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ServerEvent::Typing { player, state: TypingState::Start } if *player == agent
            )
        })
        .count();
    let stops = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ServerEvent::Typing { player, state: TypingState::Stop } if *player == agent
            )
        })
        .count();
    assert!(stops >= starts, "dangling typing indicator: {starts} starts, {stops} stops");
}

#[tokio::test]
async fn votes_and_messages_are_rejected_outside_their_phase() {
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_secs(5);
    let (registry, _provider) = server_with(CannedProvider::quiet(), settings);

    // Still waiting: no phase accepts actions.
    let room = registry.create(None, 2, Some(5)).unwrap();
    let code = room.code.clone();
    let joined = registry.join(&code).await.unwrap();
    assert!(matches!(
        registry
            .post_message(&code, joined.player_id, "anyone here?".into())
            .await
            .unwrap_err(),
        GameError::PhaseViolation(_)
    ));

    // Start the game; discussion accepts messages but not votes.
    let second = registry.join(&code).await.unwrap();
    eventually(
        async || phase_of(&room).await == Phase::Discussion,
        "discussion to open",
    )
    .await;

    registry
        .post_message(&code, joined.player_id, "hello".into())
        .await
        .unwrap();
    assert!(matches!(
        registry
            .cast_vote(&code, joined.player_id, second.player_id)
            .await
            .unwrap_err(),
        GameError::PhaseViolation(_)
    ));
}

#[tokio::test]
async fn duplicate_and_self_votes_are_rejected() {
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_millis(100);
    settings.voting_time = Duration::from_secs(5);
    let (registry, _provider) = server_with(CannedProvider::quiet(), settings);

    // Two humans; the second never votes, so the voting window stays
    // open and the state assertions cannot race the next round.
    let room = registry.create(None, 2, Some(5)).unwrap();
    let code = room.code.clone();
    let joined = registry.join(&code).await.unwrap();
    let human = joined.player_id;
    let _second = registry.join(&code).await.unwrap();

    eventually(
        async || phase_of(&room).await == Phase::Voting,
        "voting to open",
    )
    .await;

    let (first_agent, second_agent) = {
        let st = room.lock().await;
        let mut agents = st.players.iter().filter(|p| p.role == Role::Ai);
        (
            agents.next().unwrap().id,
            agents.next().unwrap().id,
        )
    };

    // Self-vote refused, state unchanged.
    assert!(matches!(
        registry.cast_vote(&code, human, human).await.unwrap_err(),
        GameError::PhaseViolation(_)
    ));

    registry.cast_vote(&code, human, first_agent).await.unwrap();

    // Second ballot refused with "already voted"; the first one stands.
    let err = registry
        .cast_vote(&code, human, second_agent)
        .await
        .unwrap_err();
    assert_eq!(err, GameError::PhaseViolation("already voted".into()));
    assert_eq!(room.lock().await.votes[&human], first_agent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ballots_from_one_voter_commit_exactly_once() {
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_millis(100);
    settings.voting_time = Duration::from_secs(5);
    let (registry, _provider) = server_with(CannedProvider::quiet(), settings);

    // Second human never votes, keeping the window open.
    let room = registry.create(None, 2, Some(6)).unwrap();
    let code = room.code.clone();
    let joined = registry.join(&code).await.unwrap();
    let human = joined.player_id;
    let _second = registry.join(&code).await.unwrap();

    eventually(
        async || phase_of(&room).await == Phase::Voting,
        "voting to open",
    )
    .await;

    let targets: Vec<PlayerId> = {
        let st = room.lock().await;
        st.players
            .iter()
            .filter(|p| p.role == Role::Ai)
            .map(|p| p.id)
            .collect()
    };

    // Race one ballot per target from the same voter.
    let handles: Vec<_> = targets
        .iter()
        .map(|target| {
            let registry = std::sync::Arc::clone(&registry);
            let code = code.clone();
            let target = *target;
            tokio::spawn(async move { registry.cast_vote(&code, human, target).await })
        })
        .collect();
    let results = futures::future::join_all(handles).await;

    let successes = results
        .iter()
        .filter(|r| r.as_ref().unwrap().is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one concurrent ballot must land");

    let st = room.lock().await;
    let committed = st.votes[&human];
    assert!(targets.contains(&committed));
}

#[tokio::test]
async fn termination_with_tasks_in_flight_is_clean() {
    let mut settings = fast_settings();
    settings.discussion_time = Duration::from_secs(5);
    let (registry, _provider) = server_with(
        CannedProvider::new().with_latency(Duration::from_millis(150)),
        settings,
    );

    let room = registry.create(None, 1, Some(5)).unwrap();
    let code = room.code.clone();
    let joined = registry.join(&code).await.unwrap();
    let (_conn, mut rx) = room.hub.attach(None);

    eventually(
        async || phase_of(&room).await == Phase::Discussion,
        "discussion to open",
    )
    .await;
    let _ = registry
        .post_message(&code, joined.player_id, "kicking things off".into())
        .await;

    // Tear the room down while decisions and generations are mid-flight.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(registry.terminate(&code, "test teardown").await);
    assert!(registry.get(&code).is_err());

    // Everything in flight observes cancellation; the terminal event is
    // the last thing any connection sees.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let events = drain(&mut rx);
    let last = events.last().expect("connection saw events");
    assert!(
        matches!(last, ServerEvent::RoomTerminated { .. }),
        "expected terminal event last, got {last:?}"
    );
    assert!(rx.recv().await.is_none());

    // REST verbs against the dead room all surface not-found.
    assert_eq!(
        registry
            .post_message(&code, joined.player_id, "anyone?".into())
            .await
            .unwrap_err(),
        GameError::NotFound
    );
    assert_eq!(
        registry.join(&code).await.unwrap_err(),
        GameError::NotFound
    );
}
