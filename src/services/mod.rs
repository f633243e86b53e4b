pub mod conversation;
pub mod fusion;
pub mod preferences;
pub mod providers;
pub mod questions;
pub mod random;
pub mod recommendations;

pub use conversation::{ChatReply, ChatTurn, ConversationEngine};
pub use providers::{CandidateSource, TmdbProvider};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use recommendations::Recommender;
