//! External stimuli that drive the runtime

use crate::types::ids::ActionId;
use crate::types::state::RevealTicket;
use serde::{Deserialize, Serialize};

/// The two signals a presentation layer sends to the runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    /// A segment finished revealing and its timeout elapsed
    Revealed(RevealTicket),
    /// The player picked a visible action
    Select { action_id: ActionId },
}
