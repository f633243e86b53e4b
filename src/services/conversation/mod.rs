//! Turn-by-turn movie conversation
//!
//! A message is classified into an [`Intent`] relative to the current phase, the
//! transition table maps (phase, intent) to a preference update, a step and the next
//! phase, and the engine carries the step out against the store and the recommender.

mod engine;
mod intent;
mod replies;

pub use engine::{
    transition, ChatReply, ChatTurn, ConversationEngine, PreferenceUpdate, Step, Transition,
};
pub use intent::{classify, Intent};
pub use replies::suggestion_chips;
