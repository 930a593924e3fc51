//! End-to-end tests: author -> build -> step
//!
//! These tests drive the runtime the way a presentation layer would, handing
//! reveal tickets back and selecting actions.

use serde_json::json;
use tsuzuri::{
    Context, Session, StoryFactory, runtime,
    types::{
        BranchRule, Condition, Effect, Event, NodeId, Operator, Predicate, TextSegment,
        condition::{Check, resolve_branch},
        effect::apply_all,
    },
};

fn context(pairs: &[(&str, serde_json::Value)]) -> Context {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn single_text_node_advances_to_successor() {
    let f = StoryFactory::new();
    let root = f.node().append_text([TextSegment::new("Hi", 4, 0)]).unwrap();
    let n2 = f.node().append_text(["next"]).unwrap();
    root.link_to(&n2).unwrap();
    let story = f.build(&root).unwrap();

    let (state, output) = runtime::start(&story, Context::new()).unwrap();
    assert_eq!(output.segment, Some(TextSegment::new("Hi", 4, 0)));

    let ticket = state.ticket();
    let (state, _) = runtime::step(state, &story, Event::Revealed(ticket)).unwrap();
    assert_eq!(state.node_id, n2.id());
    assert!(!state.awaiting_choice);
}

#[test]
fn gated_action_appears_after_last_segment() {
    let f = StoryFactory::new();
    let enter = f.action("Enter").and("visited", "eq", true).unwrap();
    let root = f
        .node()
        .append_text(["one", "two"])
        .unwrap()
        .attach_action(&enter)
        .unwrap();
    let story = f.build(&root).unwrap();

    let mut session = Session::with_context(story, context(&[("visited", json!(true))])).unwrap();
    assert!(!session.output().has_actions());

    session.complete_segment().unwrap();
    assert!(!session.state().awaiting_choice);

    let output = session.complete_segment().unwrap().clone();
    assert!(session.state().awaiting_choice);
    assert_eq!(output.actions.len(), 1);
    assert_eq!(output.actions[0].id, enter.id());
}

#[test]
fn empty_node_auto_advances_without_signal() {
    let f = StoryFactory::new();
    let root = f.node().set_effect("passed", true).unwrap();
    let shown = root.join().unwrap().append_text(["shown"]).unwrap();
    let story = f.build(&root).unwrap();

    let (state, output) = runtime::start(&story, Context::new()).unwrap();
    assert_eq!(state.node_id, shown.id());
    assert_eq!(state.get("passed"), Some(&json!(true)));
    assert_eq!(output.entered, vec![root.id(), shown.id()]);
}

#[test]
fn empty_action_list_auto_advances() {
    let f = StoryFactory::new();
    let hidden = f.action("Hidden").and("never", "eq", true).unwrap();
    let root = f
        .node()
        .append_text(["x"])
        .unwrap()
        .attach_action(&hidden)
        .unwrap();
    let next = root.join().unwrap().append_text(["y"]).unwrap();
    let story = f.build(&root).unwrap();

    let mut session = Session::new(story).unwrap();
    session.complete_segment().unwrap();
    assert_eq!(session.state().node_id, next.id());
}

#[test]
fn add_effect_arithmetic() {
    let mut ctx = Context::new();
    apply_all(&[Effect::add("v", 3)], &mut ctx);
    assert_eq!(ctx["v"], json!(3));

    let mut ctx = Context::new();
    apply_all(&[Effect::add("v", 3), Effect::add("v", 3)], &mut ctx);
    assert_eq!(ctx["v"], json!(6));

    let mut ctx = Context::new();
    apply_all(&[Effect::set("v", 10), Effect::add("v", 3)], &mut ctx);
    assert_eq!(ctx["v"], json!(13));
}

#[test]
fn first_matching_rule_wins() {
    let rules = vec![
        BranchRule::new(Condition::new("score", Operator::GreaterThan, 5), NodeId::from("A")),
        BranchRule::new(Condition::new("score", Operator::GreaterThan, 0), NodeId::from("B")),
    ];
    let ctx = context(&[("score", json!(10))]);
    assert_eq!(resolve_branch(&rules, &ctx), Some(&NodeId::from("A")));

    let ctx = context(&[("score", json!(3))]);
    assert_eq!(resolve_branch(&rules, &ctx), Some(&NodeId::from("B")));
}

#[test]
fn or_and_visibility() {
    let check = |op, value| Check { op, value };
    let ctx = context(&[("flag", json!(false)), ("other", json!(true))]);

    let mut single_or = Predicate::default();
    single_or.or.insert("flag".into(), check(Operator::Equals, json!(true)));
    let mut single_and = Predicate::default();
    single_and.and.insert("flag".into(), check(Operator::Equals, json!(true)));
    assert!(!single_or.is_satisfied(&ctx));
    assert!(!single_and.is_satisfied(&ctx));

    let mut multi_or = single_or.clone();
    multi_or.or.insert("other".into(), check(Operator::Equals, json!(true)));
    let mut multi_and = single_and.clone();
    multi_and.and.insert("other".into(), check(Operator::Equals, json!(true)));
    assert!(multi_or.is_satisfied(&ctx));
    assert!(!multi_and.is_satisfied(&ctx));
}

#[test]
fn clone_text_edit_keeps_template_text() {
    let f = StoryFactory::new();
    let template = f.node().append_text(["template"]).unwrap().freeze();
    let copy = template.clone_template();
    copy.replace_text(["changed"]).unwrap();

    assert_eq!(template.texts()[0].text, "template");
    assert_eq!(copy.texts()[0].text, "changed");
}

#[test]
fn full_walk_through_choices() {
    let f = StoryFactory::new();
    let start = f.named("start").append_text(["You wake up."]).unwrap();
    let look = f.action("Look around").add_effect("looked", 1).unwrap();
    let sleep = f.action("Sleep");
    start.attach_action(&look).unwrap().attach_action(&sleep).unwrap();
    look.append_text(["A small room."]).unwrap();
    look.link_to("start").unwrap();
    sleep
        .join()
        .unwrap()
        .append_text(["You sleep."])
        .unwrap()
        .branch_on("looked", ">", 0, "start")
        .unwrap();
    let story = f.build(&start).unwrap();

    let mut session = Session::new(story).unwrap();
    session.complete_segment().unwrap();
    session.select(&look.id()).unwrap();
    assert_eq!(session.output().text, "A small room.");

    session.complete_segment().unwrap();
    assert_eq!(session.state().node_id, start.id());
    session.complete_segment().unwrap();
    session.select(&sleep.id()).unwrap();
    session.complete_segment().unwrap();
    assert_eq!(session.state().node_id, start.id());
    assert_eq!(session.state().get("looked"), Some(&json!(1)));
    assert!(!session.is_finished());
}
