//! Prompt assembly for the three agent actions.
//!
//! Two rules hold everywhere: the agent refers to other players by their
//! visible names exactly as spelled in chat (`Player 3`), and nothing in
//! any prompt or output may hint that the agent is not human.

use std::fmt::Write as _;

use super::provider::{AgentProfile, TableView};

/// Most recent chat lines included in a prompt.
const HISTORY_WINDOW: usize = 30;

fn render_history(view: &TableView, out: &mut String) {
    let start = view.history.len().saturating_sub(HISTORY_WINDOW);
    // SAFETY: `start` is clamped to the history length above.
    #[allow(clippy::indexing_slicing)]
    for msg in &view.history[start..] {
        let _ = writeln!(out, "{}: {}", msg.sender, msg.text);
    }
}

fn render_names(names: &[String]) -> String {
    names.join(", ")
}

/// System prompt shared by every action: who the agent is pretending to
/// be and how it must refer to others.
pub fn persona_system_prompt(agent: &AgentProfile, view: &TableView) -> String {
    format!(
        "You are {id}, a participant in a casual group chat game. \
         Your personality: {personality}. \
         Stay fully in character as an ordinary person. Never reveal or \
         imply that you are an AI. Refer to other participants only by \
         their visible names exactly as they appear in chat (for example \
         \"Player 3\"), never by any other label. \
         The participants are: {names}.",
        id = agent.id,
        personality = agent.personality,
        names = render_names(&view.visible_names),
    )
}

/// User prompt for the "should I speak now?" decision.
pub fn decision_prompt(agent: &AgentProfile, view: &TableView) -> String {
    let mut p = format!(
        "The discussion topic is: {topic}\n\nRecent chat:\n",
        topic = view.topic
    );
    if view.history.is_empty() {
        p.push_str("(no messages yet)\n");
    } else {
        render_history(view, &mut p);
    }
    let _ = write!(
        p,
        "\nDecide whether {id} would naturally say something right now. \
         Speak when you have something to add, but do not dominate the \
         conversation. Respond with ONLY a JSON object of the form \
         {{\"should_respond\": true|false, \"reason\": \"...\"}}.",
        id = agent.id
    );
    p
}

/// User prompt for producing the agent's next utterance.
pub fn message_prompt(agent: &AgentProfile, view: &TableView) -> String {
    let mut p = format!(
        "The discussion topic is: {topic}\n\nRecent chat:\n",
        topic = view.topic
    );
    if view.history.is_empty() {
        let _ = write!(
            p,
            "(no messages yet; open the conversation with a short remark \
             about the topic)\n"
        );
    } else {
        render_history(view, &mut p);
    }
    let _ = write!(
        p,
        "\nWrite {id}'s next chat message: one or two short, casual \
         sentences in your personality's voice. React to what was said if \
         there is anything to react to, otherwise talk about the topic. \
         Output only the message text, with no quotes and no name prefix.",
        id = agent.id
    );
    p
}

/// User prompt for casting a vote.
pub fn vote_prompt(agent: &AgentProfile, view: &TableView, candidates: &[String]) -> String {
    let mut p = format!(
        "The round's discussion just ended. Topic was: {topic}\n\nChat:\n",
        topic = view.topic
    );
    render_history(view, &mut p);
    let _ = write!(
        p,
        "\nIt is time to vote someone out. You are {id}. You may vote for \
         exactly one of: {candidates}. \
         Pick the participant whose messages felt most off, stilted, or \
         evasive. Respond with ONLY a JSON object of the form \
         {{\"vote\": \"<name>\", \"reason\": \"...\"}} where <name> is \
         copied exactly from the list above.",
        id = agent.id,
        candidates = render_names(candidates),
    );
    p
}

/// Extract the first JSON object from raw model output, tolerating code
/// fences and prose around it.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    raw.get(start..=end)
}
