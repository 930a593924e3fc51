//! Tests for the runtime module

use super::*;
use crate::builder::StoryFactory;
use crate::types::condition::{BranchRule, Condition, Operator};
use crate::types::story::StoryNode;
use crate::types::text::TextSegment;
use serde_json::json;
use std::collections::BTreeMap;

fn finish_reveal(state: State, story: &Story) -> (State, Output) {
    let ticket = state.ticket();
    step(state, story, Event::Revealed(ticket)).unwrap()
}

fn routing_node(id: &str, next: Option<&str>) -> StoryNode {
    StoryNode {
        id: NodeId::from(id),
        texts: Vec::new(),
        next_id: next.map(NodeId::from),
        rules: Vec::new(),
        effects: Vec::new(),
        actions: Vec::new(),
    }
}

#[test]
fn start_shows_first_segment() {
    let f = StoryFactory::new();
    let root = f.node().append_text(["Hello", "World"]).unwrap();
    let story = f.build(&root).unwrap();

    let (state, output) = start(&story, Context::new()).unwrap();

    assert_eq!(output.entered, vec![root.id()]);
    assert_eq!(output.segment, Some(TextSegment::new("Hello", 250, 500)));
    assert_eq!(output.text, "Hello");
    assert_eq!(state.reveal_index, 0);
    assert!(!output.finished);
}

#[test]
fn reveal_walks_segments_then_finishes() {
    let f = StoryFactory::new();
    let root = f.node().append_text(["A", "B"]).unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let (state, output) = finish_reveal(state, &story);
    assert_eq!(state.reveal_index, 1);
    assert_eq!(output.text, "AB");

    let (state, output) = finish_reveal(state, &story);
    assert!(state.finished);
    assert!(output.finished);
    assert_eq!(output.segment, None);
}

#[test]
fn stale_ticket_is_ignored() {
    let f = StoryFactory::new();
    let root = f.node().append_text(["one", "two"]).unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let old = state.ticket();
    let (state, _) = step(state, &story, Event::Revealed(old.clone())).unwrap();

    let (after, output) = step(state.clone(), &story, Event::Revealed(old)).unwrap();
    assert!(output.stale);
    assert_eq!(after, state);
}

#[test]
fn reveal_while_awaiting_is_stale() {
    let f = StoryFactory::new();
    let choice = f.action("Go");
    let root = f.node().append_text(["Hi"]).unwrap().attach_action(&choice).unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let (state, output) = finish_reveal(state, &story);
    assert!(state.awaiting_choice);
    assert_eq!(output.actions.len(), 1);

    let (_, output) = finish_reveal(state, &story);
    assert!(output.stale);
}

#[test]
fn entry_effects_apply_once_per_visit() {
    let f = StoryFactory::new();
    let root = f.node().append_text(["x"]).unwrap().add_effect("visits", 1).unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    assert_eq!(state.get("visits"), Some(&json!(1)));
    let (state, _) = finish_reveal(state, &story);
    assert_eq!(state.get("visits"), Some(&json!(1)));
}

#[test]
fn branch_rule_overrides_successor() {
    let f = StoryFactory::new();
    let rich = f.node().append_text(["rich"]).unwrap();
    let poor = f.node().append_text(["poor"]).unwrap();
    let root = f
        .node()
        .append_text(["count"])
        .unwrap()
        .branch_on("gold", ">", 10, &rich)
        .unwrap()
        .link_to(&poor)
        .unwrap();
    let story = f.build(&root).unwrap();

    let mut context = Context::new();
    context.insert("gold".to_string(), json!(20));
    let (state, _) = start(&story, context).unwrap();
    assert_eq!(state.next_id, Some(rich.id()));
    let (state, _) = finish_reveal(state, &story);
    assert_eq!(state.node_id, rich.id());

    let (state, _) = start(&story, Context::new()).unwrap();
    let (state, _) = finish_reveal(state, &story);
    assert_eq!(state.node_id, poor.id());
}

#[test]
fn effects_are_applied_before_rules() {
    let f = StoryFactory::new();
    let flagged = f.node().append_text(["flagged"]).unwrap();
    let root = f
        .node()
        .append_text(["x"])
        .unwrap()
        .set_effect("flag", true)
        .unwrap()
        .branch_on("flag", "eq", true, &flagged)
        .unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    assert_eq!(state.next_id, Some(flagged.id()));
}

#[test]
fn text_less_nodes_route_immediately() {
    let f = StoryFactory::new();
    let root = f.node();
    let hop = root.join().unwrap();
    let end = hop.join().unwrap().append_text(["end"]).unwrap();
    let story = f.build(&root).unwrap();

    let (state, output) = start(&story, Context::new()).unwrap();
    assert_eq!(state.node_id, end.id());
    assert_eq!(output.entered, vec![root.id(), hop.id(), end.id()]);
}

#[test]
fn routing_loop_is_detected() {
    let mut nodes = BTreeMap::new();
    nodes.insert(NodeId::from("a"), routing_node("a", Some("b")));
    nodes.insert(NodeId::from("b"), routing_node("b", Some("a")));
    let story = Story {
        root_id: NodeId::from("a"),
        nodes,
    };

    let err = start(&story, Context::new()).unwrap_err();
    assert!(matches!(err, RuntimeError::RoutingLoop { .. }));
}

#[test]
fn routing_cycle_with_exit_terminates() {
    let mut a = routing_node("a", Some("b"));
    a.effects.push(crate::types::effect::Effect::add("n", 1));
    a.rules.push(BranchRule::new(
        Condition::new("n", Operator::GreaterThan, 2),
        NodeId::from("out"),
    ));
    let mut out = routing_node("out", None);
    out.texts.push(TextSegment::new("done", 1, 1));

    let mut nodes = BTreeMap::new();
    nodes.insert(NodeId::from("a"), a);
    nodes.insert(NodeId::from("b"), routing_node("b", Some("a")));
    nodes.insert(NodeId::from("out"), out);
    let story = Story {
        root_id: NodeId::from("a"),
        nodes,
    };

    let (state, _) = start(&story, Context::new()).unwrap();
    assert_eq!(state.node_id, NodeId::from("out"));
    assert_eq!(state.get("n"), Some(&json!(3)));
}

#[test]
fn selecting_action_applies_effects_and_moves_on() {
    let f = StoryFactory::new();
    let choice = f.action("Take").add_effect("coins", 5).unwrap();
    let next = choice.join().unwrap().append_text(["Taken"]).unwrap();
    let root = f.node().append_text(["Coins"]).unwrap().attach_action(&choice).unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let (state, _) = finish_reveal(state, &story);
    let (state, output) = step(state, &story, Event::Select { action_id: choice.id() }).unwrap();

    assert_eq!(state.node_id, next.id());
    assert_eq!(state.get("coins"), Some(&json!(5)));
    assert!(!state.awaiting_choice);
    assert_eq!(output.entered, vec![next.id()]);
}

#[test]
fn action_without_successor_resettles() {
    let f = StoryFactory::new();
    let repeat = f.action("Again").add_effect("n", 1).unwrap();
    let done = f.action("Done").and("n", ">", 1).unwrap();
    let root = f
        .node()
        .append_text(["?"])
        .unwrap()
        .attach_action(&repeat)
        .unwrap()
        .attach_action(&done)
        .unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let (state, output) = finish_reveal(state, &story);
    assert_eq!(output.actions.len(), 1);

    let (state, _) = step(state, &story, Event::Select { action_id: repeat.id() }).unwrap();
    let (state, output) = step(state, &story, Event::Select { action_id: repeat.id() }).unwrap();
    assert!(state.awaiting_choice);
    assert_eq!(output.actions.len(), 2);
}

#[test]
fn select_errors() {
    let f = StoryFactory::new();
    let hidden = f.action("Secret").and("key", "eq", true).unwrap();
    let shown = f.action("Open");
    let root = f
        .node()
        .append_text(["Door"])
        .unwrap()
        .attach_action(&hidden)
        .unwrap()
        .attach_action(&shown)
        .unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let err = step(state.clone(), &story, Event::Select { action_id: shown.id() }).unwrap_err();
    assert_eq!(err, RuntimeError::NotAwaitingChoice { node: root.id() });

    let (state, _) = finish_reveal(state, &story);
    let err = step(state.clone(), &story, Event::Select { action_id: hidden.id() }).unwrap_err();
    assert!(matches!(err, RuntimeError::ActionNotVisible { .. }));

    let err = step(
        state,
        &story,
        Event::Select {
            action_id: ActionId::from("choice_9999"),
        },
    )
    .unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownAction { .. }));
}

#[test]
fn unknown_root_is_an_error() {
    let story = Story {
        root_id: NodeId::from("nowhere"),
        nodes: BTreeMap::new(),
    };
    let err = start(&story, Context::new()).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::UnknownNode {
            id: NodeId::from("nowhere")
        }
    );
}

#[test]
fn revisiting_a_node_issues_new_tickets() {
    let f = StoryFactory::new();
    let stay = f.action("Stay");
    let root = f.named("room").append_text(["Room"]).unwrap().attach_action(&stay).unwrap();
    stay.link_to("room").unwrap();
    let story = f.build(&root).unwrap();

    let (state, _) = start(&story, Context::new()).unwrap();
    let first = state.ticket();
    let (state, _) = finish_reveal(state, &story);
    let (state, _) = step(state, &story, Event::Select { action_id: stay.id() }).unwrap();

    assert_eq!(state.node_id, root.id());
    assert_ne!(state.ticket(), first);
    let (_, output) = step(state, &story, Event::Revealed(first)).unwrap();
    assert!(output.stale);
}
