//! The per-room driver.
//!
//! One long-lived task per room walks the round loop: discussion window
//! (with proactive idle checks), voting window, elimination, then the
//! next round or game over. Transient agent tasks are spawned through the
//! single-flight gate: an agent enters the room's `processing` set under
//! the lock before its task exists and leaves it in the task's guaranteed
//! cleanup path.
//!
//! Every suspension point (model call, typing delay, timer wait) yields
//! a window in which the phase timer may fire, so agent tasks re-validate
//! the phase after each one. Checking once is insufficient; the four
//! layers in the message task map to its four suspension points. Output
//! that arrives after a phase change is not an error: it is silently
//! discarded with a diagnostic log.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::{decision, roster, speaker, voter};
use crate::game::tally;
use crate::llm::{AgentProfile, TableView};
use crate::protocol::{Phase, PlayerId, ServerEvent, TypingState};
use crate::room::Room;

/// Start the room's driver task. Called once, when the last human seat
/// fills.
pub fn spawn(room: Arc<Room>) {
    tokio::spawn(run(room));
}

async fn run(room: Arc<Room>) {
    tracing::info!(room_code = %room.code, "Game starting");
    loop {
        if room.is_cancelled() {
            return;
        }
        start_round(&room).await;
        if !discussion_window(&room).await {
            return;
        }
        if !begin_voting(&room).await {
            return;
        }
        if !voting_window(&room).await {
            return;
        }
        match resolve_elimination(&room).await {
            Some(RoundOutcome::Continue) => {}
            Some(RoundOutcome::Finished) | None => return,
        }
    }
}

enum RoundOutcome {
    Continue,
    Finished,
}

async fn start_round(room: &Arc<Room>) {
    let topic = roster::pick_topic();
    let (round, players) = {
        let mut st = room.lock().await;
        let now = room.clock.now();
        st.begin_round(topic.clone(), now);
        (st.round, st.public_players())
    };

    if round > 1 {
        room.hub.broadcast(ServerEvent::NewRound { round });
    }
    room.hub.broadcast(ServerEvent::PlayerList { players });
    room.hub.broadcast(ServerEvent::Topic {
        topic: topic.clone(),
        round,
    });
    room.hub.broadcast(ServerEvent::Phase {
        phase: Phase::Discussion,
    });
    tracing::info!(room_code = %room.code, round, %topic, "Round started");
}

/// Run the discussion window to its deadline, firing a proactive decision
/// pass whenever the table has been quiet for the idle interval. Returns
/// false if the room was torn down.
async fn discussion_window(room: &Arc<Room>) -> bool {
    let deadline = room.clock.now() + room.settings.discussion_time;
    loop {
        let now = room.clock.now();
        if now >= deadline {
            return true;
        }
        let tick = room.settings.idle_check_interval.min(deadline - now);
        tokio::select! {
            () = room.cancel_token().cancelled() => return false,
            () = room.clock.sleep(tick) => {}
        }

        let idle = {
            let st = room.lock().await;
            if st.phase != Phase::Discussion {
                return true;
            }
            let anchor = st.last_message_at.or(st.round_started_at);
            anchor.map_or(Duration::ZERO, |at| {
                room.clock.now().saturating_duration_since(at)
            })
        };
        if idle >= room.settings.idle_check_interval {
            // Fire-and-forget: a slow decision call must never delay the
            // phase deadline.
            trigger_decision_pass(Arc::clone(room), None);
        }
    }
}

/// Fire-and-forget decision pass, used by the human-message trigger and
/// the post-commit cascade.
pub fn trigger_decision_pass(room: Arc<Room>, exclude: Option<PlayerId>) {
    tokio::spawn(async move {
        run_decision_pass(&room, exclude).await;
    });
}

/// One decision pass: snapshot under the lock, ask the model about every
/// eligible agent concurrently outside it, then re-acquire the lock to
/// launch generation tasks for the chosen agents under the single-flight
/// gate.
async fn run_decision_pass(room: &Arc<Room>, exclude: Option<PlayerId>) {
    if room.is_cancelled() {
        return;
    }

    let (candidates, view) = {
        let st = room.lock().await;
        if st.phase != Phase::Discussion {
            return;
        }
        let now = room.clock.now();
        let candidates = st.eligible_agents(now, room.settings.message_cooldown, exclude);
        if candidates.is_empty() {
            return;
        }
        let view = TableView {
            topic: st.topic.clone(),
            history: st.history.clone(),
            visible_names: st.visible_names(),
        };
        (candidates, view)
    };

    let decisions = join_all(candidates.into_iter().map(|(id, personality)| {
        let provider = Arc::clone(&room.provider);
        let view = view.clone();
        async move {
            let profile = AgentProfile { id, personality };
            let speak = decision::should_speak(&provider, &profile, &view).await;
            (profile, speak)
        }
    }))
    .await;

    let mut chosen: Vec<AgentProfile> = decisions
        .into_iter()
        .filter_map(|(profile, speak)| speak.then_some(profile))
        .collect();
    chosen.truncate(room.settings.max_concurrent_agent_responses);
    if chosen.is_empty() {
        return;
    }

    let mut st = room.lock().await;
    if st.phase != Phase::Discussion {
        return;
    }
    for profile in chosen {
        if st.processing.contains(&profile.id) || st.pending_ai_messages.contains(&profile.id) {
            continue;
        }
        st.pending_ai_messages.push(profile.id);
        st.processing.insert(profile.id);
        tokio::spawn(agent_message_task(Arc::clone(room), profile));
    }
}

/// The agent message task. The inner body can bail at any of its four
/// layers; this wrapper owns the guaranteed release of the agent's
/// processing slot on every path, plus the post-commit cascade.
async fn agent_message_task(room: Arc<Room>, profile: AgentProfile) {
    let agent = profile.id;
    let committed = message_task_inner(&room, profile).await;

    let vote_phase_started = {
        let mut st = room.lock().await;
        st.processing.remove(&agent);
        st.pending_ai_messages.retain(|id| *id != agent);
        st.phase == Phase::Voting
    };
    // This task may have been holding the agent's processing slot across
    // the discussion→voting transition; its vote task launches now.
    if vote_phase_started {
        launch_vote_tasks(&room).await;
        return;
    }

    // Layer 4, the cascade gate: only re-trigger while discussion still
    // holds, and never for the agent that just spoke.
    if committed {
        let still_discussing = { room.lock().await.phase == Phase::Discussion };
        if still_discussing {
            trigger_decision_pass(Arc::clone(&room), Some(agent));
        }
    }
}

async fn message_task_inner(room: &Arc<Room>, profile: AgentProfile) -> bool {
    let agent = profile.id;

    // Layer 1: before any visible action.
    let view = {
        let st = room.lock().await;
        if st.phase != Phase::Discussion {
            tracing::debug!(
                room_code = %room.code,
                %agent,
                phase = %st.phase,
                "Agent message dropped before generation: phase moved on"
            );
            return false;
        }
        TableView {
            topic: st.topic.clone(),
            history: st.history.clone(),
            visible_names: st.visible_names(),
        }
    };

    // Model call, outside the lock.
    let text = tokio::select! {
        () = room.cancel_token().cancelled() => return false,
        text = speaker::compose(&room.provider, &profile, &view) => text,
    };

    // Layer 2: the phase may have flipped during the model call.
    {
        let st = room.lock().await;
        if st.phase != Phase::Discussion {
            tracing::debug!(
                room_code = %room.code,
                %agent,
                phase = %st.phase,
                "Agent message dropped after generation: phase moved on"
            );
            return false;
        }
    }

    room.hub.broadcast(ServerEvent::Typing {
        player: agent,
        state: TypingState::Start,
    });

    tokio::select! {
        () = room.cancel_token().cancelled() => {
            room.hub.broadcast(ServerEvent::Typing { player: agent, state: TypingState::Stop });
            return false;
        }
        () = room.clock.sleep(room.settings.typing_delay) => {}
    }

    // Layer 3: last re-check, then commit under the same lock hold.
    let message = {
        let mut st = room.lock().await;
        let blocked = if st.phase != Phase::Discussion {
            tracing::debug!(
                room_code = %room.code,
                %agent,
                phase = %st.phase,
                "Agent message dropped after typing delay: phase moved on"
            );
            true
        } else {
            // The table may have moved while we were typing; consecutive
            // messages from one sender are never allowed.
            st.last_sender() == Some(agent)
        };
        if blocked {
            drop(st);
            room.hub.broadcast(ServerEvent::Typing {
                player: agent,
                state: TypingState::Stop,
            });
            return false;
        }
        let now = room.clock.now();
        st.commit_message(agent, text, now)
    };

    room.hub.broadcast(ServerEvent::Message {
        sender: message.sender,
        text: message.text,
        timestamp: message.timestamp,
    });
    room.hub.broadcast(ServerEvent::Typing {
        player: agent,
        state: TypingState::Stop,
    });
    true
}

/// Transition to voting. Phase is saved under the lock before any event
/// goes out, so a late layer check on any in-flight message task reads
/// `voting`. Returns false if the room was torn down.
async fn begin_voting(room: &Arc<Room>) -> bool {
    if room.is_cancelled() {
        return false;
    }
    let agents = {
        let mut st = room.lock().await;
        st.begin_voting()
    };

    // Proactively cancel dangling indicators from interrupted tasks.
    for agent in &agents {
        room.hub.broadcast(ServerEvent::Typing {
            player: *agent,
            state: TypingState::Stop,
        });
    }
    room.hub.broadcast(ServerEvent::Phase {
        phase: Phase::Voting,
    });
    tracing::info!(room_code = %room.code, voters = agents.len(), "Voting started");

    launch_vote_tasks(room).await;
    true
}

/// Spawn a vote task for every queued agent not currently occupied by
/// another task. Re-invoked from message-task cleanup for agents whose
/// processing slot was still held at the transition, so every agent ends
/// up with exactly one vote task.
async fn launch_vote_tasks(room: &Arc<Room>) {
    let mut st = room.lock().await;
    if st.phase != Phase::Voting {
        return;
    }
    let ready: Vec<AgentProfile> = st
        .pending_ai_votes
        .iter()
        .filter(|id| !st.processing.contains(id))
        .filter_map(|id| {
            st.player(*id).map(|p| AgentProfile {
                id: *id,
                personality: p.personality.clone().unwrap_or_default(),
            })
        })
        .collect();
    for profile in ready {
        st.processing.insert(profile.id);
        tokio::spawn(agent_vote_task(Arc::clone(room), profile));
    }
}

async fn agent_vote_task(room: Arc<Room>, profile: AgentProfile) {
    let agent = profile.id;
    let committed = vote_task_inner(&room, &profile).await;

    {
        let mut st = room.lock().await;
        st.processing.remove(&agent);
        st.pending_ai_votes.retain(|id| *id != agent);
    }

    if committed {
        room.hub.broadcast(ServerEvent::Voted { voter: agent });
        room.votes_changed.notify_waiters();
    }
}

async fn vote_task_inner(room: &Arc<Room>, profile: &AgentProfile) -> bool {
    let agent = profile.id;

    let (view, candidates) = {
        let st = room.lock().await;
        if st.phase != Phase::Voting {
            return false;
        }
        let candidates: Vec<PlayerId> = st
            .active_players()
            .filter(|p| p.id != agent)
            .map(|p| p.id)
            .collect();
        let view = TableView {
            topic: st.topic.clone(),
            history: st.history.clone(),
            visible_names: st.visible_names(),
        };
        (view, candidates)
    };

    let choice = tokio::select! {
        () = room.cancel_token().cancelled() => return false,
        choice = voter::cast(&room.provider, profile, &view, &candidates) => choice,
    };
    let Some(target) = choice else {
        return false;
    };

    let mut st = room.lock().await;
    if st.phase != Phase::Voting {
        tracing::debug!(
            room_code = %room.code,
            %agent,
            phase = %st.phase,
            "Agent vote dropped: phase moved on"
        );
        return false;
    }
    match st.record_vote(agent, target) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(room_code = %room.code, %agent, error = %err, "Agent vote rejected");
            false
        }
    }
}

/// Wait until every active player has voted or the voting timer expires;
/// missing votes at the deadline are abstentions. Returns false if the
/// room was torn down.
async fn voting_window(room: &Arc<Room>) -> bool {
    let deadline = room.clock.now() + room.settings.voting_time;
    loop {
        // Register for vote notifications before inspecting state, so a
        // ballot landing between the check and the select cannot be
        // missed.
        let notified = room.votes_changed.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        {
            let st = room.lock().await;
            if st.all_active_voted() {
                return true;
            }
        }
        let now = room.clock.now();
        if now >= deadline {
            return true;
        }
        let remaining = deadline - now;
        tokio::select! {
            () = room.cancel_token().cancelled() => return false,
            () = &mut notified => {}
            () = room.clock.sleep(remaining) => {}
        }
    }
}

/// Tally, eliminate, and decide the game. Returns `None` if the room was
/// torn down.
async fn resolve_elimination(room: &Arc<Room>) -> Option<RoundOutcome> {
    if room.is_cancelled() {
        return None;
    }

    let (counts, suspect, suspect_role, winner, players) = {
        let mut st = room.lock().await;
        st.phase = Phase::Elimination;
        let counts = tally::count_votes(&st.votes);
        let suspect = tally::select_suspect(&st.votes);
        let mut suspect_role = None;
        if let Some(s) = suspect {
            if let Some(p) = st.player_mut(s) {
                p.eliminated = true;
                suspect_role = Some(p.role);
            }
            st.selected_suspect = Some(s);
            st.suspect_role = suspect_role;
        }
        let winner = tally::decide_outcome(suspect_role, st.round, room.settings.rounds_to_win);
        if let Some(w) = winner {
            let now = room.clock.now();
            st.finish(w, now);
        }
        (counts, suspect, suspect_role, winner, st.public_players())
    };

    room.hub.broadcast(ServerEvent::Phase {
        phase: Phase::Elimination,
    });
    room.hub.broadcast(ServerEvent::VotingResult {
        counts,
        suspect,
        suspect_role,
    });
    if let Some(s) = suspect {
        room.hub.broadcast(ServerEvent::Elimination { player: s });
        tracing::info!(room_code = %room.code, suspect = %s, role = ?suspect_role, "Player eliminated");
    } else {
        tracing::info!(room_code = %room.code, "No votes cast; nobody eliminated");
    }
    room.hub.broadcast(ServerEvent::PlayerList { players });

    match winner {
        Some(w) => {
            room.hub.broadcast(ServerEvent::GameOver {
                winner: w,
                suspect,
                suspect_role,
            });
            tracing::info!(room_code = %room.code, winner = ?w, "Game over");
            Some(RoundOutcome::Finished)
        }
        None => Some(RoundOutcome::Continue),
    }
}
