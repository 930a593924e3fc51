//! Runtime interpreter for compiled stories
//!
//! The interpreter owns no loop and no timers. The presentation layer reveals
//! the segment named in [`Output::segment`], hands the ticket back with
//! [`Event::Revealed`] once the segment and its timeout are done, and sends
//! [`Event::Select`] when the player picks an action. Every call is a pure
//! transition `State -> (State, Output)`.

use crate::error::RuntimeError;
use crate::types::{
    condition::resolve_branch,
    effect::{Effect, apply_all},
    event::Event,
    ids::{ActionId, NodeId},
    output::{Output, VisibleAction},
    state::{RevealTicket, State},
    story::{Story, StoryAction, StoryNode},
    value::Context,
};

pub mod debug;

#[cfg(test)]
mod tests;

use debug::{DebugCategory, DebugConfig, LogLevel};

/// Upper bound on text-less nodes crossed in one transition
pub const MAX_ROUTING_STEPS: usize = 10_000;

/// Enter the root node
pub fn start(story: &Story, context: Context) -> Result<(State, Output), RuntimeError> {
    start_with_debug(story, context, &DebugConfig::default())
}

pub fn start_with_debug(
    story: &Story,
    context: Context,
    debug_config: &DebugConfig,
) -> Result<(State, Output), RuntimeError> {
    let mut state = State::at(story.root_id.clone(), context);
    let mut output = Output::new();

    debug::log(
        debug_config,
        DebugCategory::Engine,
        LogLevel::Info,
        &format!("[Engine] Starting at '{}'", story.root_id),
    );

    advance(&mut state, story, story.root_id.clone(), &mut output, debug_config)?;
    describe(&state, story, &mut output);
    Ok((state, output))
}

/// Execute a single step of the story
pub fn step(state: State, story: &Story, event: Event) -> Result<(State, Output), RuntimeError> {
    step_with_debug(state, story, event, &DebugConfig::default())
}

/// Execute a single step with debug configuration
pub fn step_with_debug(
    mut state: State,
    story: &Story,
    event: Event,
    debug_config: &DebugConfig,
) -> Result<(State, Output), RuntimeError> {
    let mut output = Output::new();

    match event {
        Event::Revealed(ticket) => revealed(&mut state, story, &ticket, &mut output, debug_config)?,
        Event::Select { action_id } => {
            select(&mut state, story, &action_id, &mut output, debug_config)?
        }
    }

    describe(&state, story, &mut output);
    Ok((state, output))
}

/// Actions of the current node whose predicate holds
pub fn visible_actions(story: &Story, state: &State) -> Vec<VisibleAction> {
    story
        .node(&state.node_id)
        .map(|node| {
            node.actions
                .iter()
                .filter(|action| is_visible(action, &state.context))
                .map(|action| VisibleAction {
                    id: action.id.clone(),
                    label: action.label.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Segments `0..=reveal_index` of the current node, concatenated
pub fn revealed_text(story: &Story, state: &State) -> String {
    story
        .node(&state.node_id)
        .map(|node| {
            node.texts
                .iter()
                .take(state.reveal_index + 1)
                .map(|segment| segment.text.as_str())
                .collect()
        })
        .unwrap_or_default()
}

fn is_visible(action: &StoryAction, context: &Context) -> bool {
    action
        .predicate
        .as_ref()
        .is_none_or(|predicate| predicate.is_satisfied(context))
}

fn lookup<'a>(story: &'a Story, id: &NodeId) -> Result<&'a StoryNode, RuntimeError> {
    story
        .node(id)
        .ok_or_else(|| RuntimeError::UnknownNode { id: id.clone() })
}

fn revealed(
    state: &mut State,
    story: &Story,
    ticket: &RevealTicket,
    output: &mut Output,
    debug_config: &DebugConfig,
) -> Result<(), RuntimeError> {
    if state.finished || state.awaiting_choice || *ticket != state.ticket() {
        debug::log(
            debug_config,
            DebugCategory::Reveal,
            LogLevel::Debug,
            &format!(
                "[Reveal] Ignoring stale signal for '{}' segment {} visit {}",
                ticket.node_id, ticket.segment, ticket.visit
            ),
        );
        output.stale = true;
        return Ok(());
    }

    let node = lookup(story, &state.node_id)?;
    if state.reveal_index + 1 < node.texts.len() {
        state.reveal_index += 1;
        debug::log(
            debug_config,
            DebugCategory::Reveal,
            LogLevel::Trace,
            &format!("[Reveal] '{}' segment {}", node.id, state.reveal_index),
        );
        return Ok(());
    }

    settle(state, story, node, output, debug_config)
}

fn select(
    state: &mut State,
    story: &Story,
    action_id: &ActionId,
    output: &mut Output,
    debug_config: &DebugConfig,
) -> Result<(), RuntimeError> {
    if !state.awaiting_choice {
        return Err(RuntimeError::NotAwaitingChoice {
            node: state.node_id.clone(),
        });
    }

    let node = lookup(story, &state.node_id)?;
    let action = node.action(action_id).ok_or_else(|| RuntimeError::UnknownAction {
        node: node.id.clone(),
        action: action_id.clone(),
    })?;
    if !is_visible(action, &state.context) {
        return Err(RuntimeError::ActionNotVisible {
            node: node.id.clone(),
            action: action_id.clone(),
        });
    }

    debug::log(
        debug_config,
        DebugCategory::Flow,
        LogLevel::Debug,
        &format!("[Choice] '{}' ({}) selected on '{}'", action.label, action.id, node.id),
    );
    apply_effects(state, &action.effects, debug_config);
    state.awaiting_choice = false;

    match &action.next_id {
        Some(next) => advance(state, story, next.clone(), output, debug_config),
        None => settle(state, story, node, output, debug_config),
    }
}

fn apply_effects(state: &mut State, effects: &[Effect], debug_config: &DebugConfig) {
    if effects.is_empty() {
        return;
    }
    apply_all(effects, &mut state.context);
    debug::log(
        debug_config,
        DebugCategory::Context,
        LogLevel::Debug,
        &format!("[Context] After {} effects: {:?}", effects.len(), state.context),
    );
}

/// The current node is fully revealed: offer actions, move on or finish
fn settle(
    state: &mut State,
    story: &Story,
    node: &StoryNode,
    output: &mut Output,
    debug_config: &DebugConfig,
) -> Result<(), RuntimeError> {
    match conclude(state, node, debug_config) {
        Some(next) => advance(state, story, next, output, debug_config),
        None => Ok(()),
    }
}

fn conclude(state: &mut State, node: &StoryNode, debug_config: &DebugConfig) -> Option<NodeId> {
    if node.actions.iter().any(|action| is_visible(action, &state.context)) {
        state.awaiting_choice = true;
        debug::log(
            debug_config,
            DebugCategory::Flow,
            LogLevel::Debug,
            &format!("[Flow] '{}' awaits a choice", node.id),
        );
        return None;
    }

    match &state.next_id {
        Some(next) => Some(next.clone()),
        None => {
            state.finished = true;
            debug::log(
                debug_config,
                DebugCategory::Engine,
                LogLevel::Info,
                &format!("[Engine] Finished at '{}'", node.id),
            );
            None
        }
    }
}

/// Enter `target`, then keep routing through nodes that have no text
fn advance(
    state: &mut State,
    story: &Story,
    target: NodeId,
    output: &mut Output,
    debug_config: &DebugConfig,
) -> Result<(), RuntimeError> {
    let mut routed: Vec<(NodeId, Context)> = Vec::new();
    let mut target = target;

    loop {
        let node = enter(state, story, &target, output, debug_config)?;
        if !node.is_routing() {
            return Ok(());
        }

        let Some(next) = conclude(state, node, debug_config) else {
            return Ok(());
        };

        let visit = (target, state.context.clone());
        if routed.contains(&visit) || routed.len() >= MAX_ROUTING_STEPS {
            return Err(RuntimeError::RoutingLoop { node: visit.0 });
        }
        routed.push(visit);
        target = next;
    }
}

fn enter<'a>(
    state: &mut State,
    story: &'a Story,
    target: &NodeId,
    output: &mut Output,
    debug_config: &DebugConfig,
) -> Result<&'a StoryNode, RuntimeError> {
    let node = lookup(story, target)?;

    state.node_id = node.id.clone();
    state.visit += 1;
    state.reveal_index = 0;
    state.awaiting_choice = false;
    state.finished = false;
    output.entered.push(node.id.clone());

    debug::log(
        debug_config,
        DebugCategory::Engine,
        LogLevel::Debug,
        &format!("[Engine] Entered '{}' (visit {})", node.id, state.visit),
    );

    apply_effects(state, &node.effects, debug_config);

    state.next_id = match resolve_branch(&node.rules, &state.context) {
        Some(target) => {
            debug::log(
                debug_config,
                DebugCategory::Flow,
                LogLevel::Debug,
                &format!("[Branch] '{}' continues to '{}'", node.id, target),
            );
            Some(target.clone())
        }
        None => node.next_id.clone(),
    };

    Ok(node)
}

/// Fill in what the presentation layer shows for `state`
fn describe(state: &State, story: &Story, output: &mut Output) {
    output.text = revealed_text(story, state);
    output.finished = state.finished;

    if state.awaiting_choice {
        output.actions = visible_actions(story, state);
    } else if !state.finished {
        output.segment = story
            .node(&state.node_id)
            .and_then(|node| node.texts.get(state.reveal_index))
            .cloned();
    }
}
