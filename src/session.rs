//! Session facade bundling a compiled story with its running state

use crate::error::RuntimeError;
use crate::runtime::{self, debug::DebugConfig};
use crate::storage;
use crate::types::{Context, Event, Output, State, Story};
use crate::types::ids::ActionId;
use crate::types::state::RevealTicket;

/// A story being played
///
/// Keeps the last [`Output`] so a presentation layer can redraw at any time.
#[derive(Debug)]
pub struct Session {
    story: Story,
    state: State,
    output: Output,
    debug_config: DebugConfig,
}

impl Session {
    /// Start a session at the story root with an empty context
    pub fn new(story: Story) -> Result<Self, RuntimeError> {
        Self::with_context(story, Context::new())
    }

    pub fn with_context(story: Story, context: Context) -> Result<Self, RuntimeError> {
        Self::with_debug(story, context, DebugConfig::default())
    }

    pub fn with_debug(
        story: Story,
        context: Context,
        debug_config: DebugConfig,
    ) -> Result<Self, RuntimeError> {
        let (state, output) = runtime::start_with_debug(&story, context, &debug_config)?;
        Ok(Self {
            story,
            state,
            output,
            debug_config,
        })
    }

    /// Load a saved story and start it
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let story = storage::load(bytes)?;
        Ok(Self::new(story)?)
    }

    fn apply(&mut self, event: Event) -> Result<&Output, RuntimeError> {
        let (state, output) =
            runtime::step_with_debug(self.state.clone(), &self.story, event, &self.debug_config)?;
        self.state = state;
        self.output = output;
        Ok(&self.output)
    }

    /// Report that the segment currently on screen is done
    pub fn complete_segment(&mut self) -> Result<&Output, RuntimeError> {
        let ticket = self.state.ticket();
        self.apply(Event::Revealed(ticket))
    }

    /// Report a finished reveal; tickets from earlier visits are ignored
    pub fn reveal_complete(&mut self, ticket: RevealTicket) -> Result<&Output, RuntimeError> {
        self.apply(Event::Revealed(ticket))
    }

    pub fn select(&mut self, action_id: &ActionId) -> Result<&Output, RuntimeError> {
        self.apply(Event::Select {
            action_id: action_id.clone(),
        })
    }

    pub fn ticket(&self) -> RevealTicket {
        self.state.ticket()
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }
}
