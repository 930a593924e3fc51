//! Built-in sample story for `tsuzuri demo`

use crate::builder::{StoryFactory, defer};
use crate::error::StoryError;
use crate::script;
use crate::text::{ms, wait};
use crate::types::Story;

/// A short walk through a lighthouse
///
/// Uses named nodes, deferred links, a frozen template, gated actions and a
/// branch back into an earlier node.
pub fn demo_story() -> Result<Story, StoryError> {
    let f = StoryFactory::new();

    let shore = f
        .named("shore")
        .append_text(script![
            "The tide is out. ",
            wait(1200),
            "A lighthouse stands at the end of the causeway."
        ])?
        .set_effect("lamp", false)?;

    // Shown after every visit to the lamp room
    let gull = f
        .node()
        .append_text(script![ms(80), "A gull shrieks somewhere below."])?
        .freeze();

    let door = f
        .named("door")
        .append_text(["The door is heavy and salt-stained."])?
        .add_effect("knocks", 1)?;
    shore.link_to(&door)?;

    let knock = f.action("Knock again").append_text(["You knock. Nobody answers."])?;
    knock.link_to(defer(|door| Ok(door)))?;
    let push = f.action("Push the door").or("knocks", ">", 1)?;
    door.attach_action(&knock)?.attach_action(&push)?;

    let stairs = push.join_named("stairs")?.append_text(["Stairs wind upward into the dark."])?;
    let lamp_room = stairs
        .join_named("lamp_room")?
        .append_text(["The lamp room. The great lens is cold."])?;

    let light = f
        .action("Light the lamp")
        .and("lamp", "eq", false)?
        .set_effect("lamp", true)?;
    let leave = f.action("Go back down");
    lamp_room.attach_action(&light)?.attach_action(&leave)?;

    light
        .join()?
        .append_text(script![wait(2000), "The beam sweeps across the water."])?
        .link_to(&gull)?
        .tail()
        .link_to("lamp_room")?;
    leave.link_to(defer(|room| room.get("ending")))?;

    let ending = f
        .named("ending")
        .append_text(["You walk back along the causeway."])?
        .branch_on("lamp", "eq", true, defer(|ending| ending.get("lit_ending")))?;
    f.named("lit_ending")
        .append_text(["Behind you, the light keeps turning."])?;
    ending.join()?.append_text(["Behind you, the tower stays dark."])?;

    f.build(&shore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime;
    use crate::types::{Context, Event};

    #[test]
    fn demo_story_compiles_closed() {
        let story = demo_story().unwrap();
        assert!(story.validate().is_ok());
        assert!(story.len() >= 8);
    }

    #[test]
    fn demo_story_is_deterministic() {
        let a = demo_story().unwrap().digest().unwrap();
        let b = demo_story().unwrap().digest().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn push_needs_two_knocks() {
        let story = demo_story().unwrap();
        let (mut state, _) = runtime::start(&story, Context::new()).unwrap();

        // Reveal through the shore and onto the door
        let mut output;
        loop {
            let ticket = state.ticket();
            (state, output) = runtime::step(state, &story, Event::Revealed(ticket)).unwrap();
            if output.has_actions() {
                break;
            }
        }
        assert_eq!(output.actions.len(), 1);
        assert_eq!(output.actions[0].label, "Knock again");
    }
}
