//! # tsuzuri
//!
//! A Rust library for authoring branching dialogue stories with a builder DSL,
//! compiling them into a flat node table and stepping through that table one
//! signal at a time.
//!
//! Authoring goes through [`StoryFactory`]: nodes carry paced text segments,
//! effects on a shared context, conditional branch rules and player actions.
//! Links to nodes that do not exist yet are deferred and resolved by the build
//! pass, newest first.
//!
//! ## Quick Start
//!
//! ```rust
//! use tsuzuri::{Context, Event, StoryFactory, script};
//! use tsuzuri::text::wait;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let f = StoryFactory::new();
//! let root = f.named("start").append_text(script!["Hello. ", wait(1000), "Who are you?"])?;
//! let friend = f.action("A friend").set_effect("trust", 1)?;
//! root.attach_action(&friend)?;
//! friend.join()?.append_text(["Welcome, friend."])?;
//!
//! let story = f.build(&root)?;
//! let (mut state, mut output) = tsuzuri::start(&story, Context::new())?;
//!
//! // The presentation layer reveals each segment, then hands its ticket back
//! while !output.has_actions() {
//!     let ticket = state.ticket();
//!     (state, output) = tsuzuri::step(state, &story, Event::Revealed(ticket))?;
//! }
//!
//! let (state, output) = tsuzuri::step(state, &story, Event::Select { action_id: friend.id() })?;
//! assert_eq!(output.text, "Welcome, friend.");
//! assert_eq!(state.get("trust"), Some(&serde_json::json!(1)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Session facade
//!
//! ```rust
//! use tsuzuri::{Session, StoryFactory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let f = StoryFactory::new();
//! let root = f.node().append_text(["Just one line."])?;
//! let mut session = Session::new(f.build(&root)?)?;
//!
//! session.complete_segment()?;
//! assert!(session.is_finished());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod text;
pub mod types;

pub use builder::{Action, Link, Node, StoryFactory, defer};
pub use compiler::compile;
pub use config::{FreezePolicy, StoryConfig, TextDefaults};
pub use error::{AuthoringError, CompileError, RuntimeError, StoryError};
pub use runtime::{revealed_text, start, step, visible_actions};
pub use session::Session;
pub use storage::{load, save};
pub use types::{Context, Event, Output, State, Story};
