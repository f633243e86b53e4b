mod conversation;
mod emotion;
pub mod genres;
mod movie;
mod preferences;

pub use conversation::{ConversationPhase, ConversationState, QuestionCategory};
pub use emotion::{EmotionLabel, EmotionSignal};
pub use genres::{genre_name, genre_names_joined, GenreId, GENRE_NAMES};
pub use movie::{DiscoverQuery, MovieId, RawMovie, ScoredCandidate, SortOrder, TmdbPage};
pub use preferences::{PreferenceFacts, PreferenceKind};
