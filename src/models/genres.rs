//! Static genre tables shared by the extractor, fusion and presentation layers.
//!
//! Identifiers are TMDB movie genre ids.

/// TMDB movie genre identifier
pub type GenreId = u32;

pub const ACTION: GenreId = 28;
pub const ADVENTURE: GenreId = 12;
pub const ANIMATION: GenreId = 16;
pub const COMEDY: GenreId = 35;
pub const CRIME: GenreId = 80;
pub const DOCUMENTARY: GenreId = 99;
pub const DRAMA: GenreId = 18;
pub const FAMILY: GenreId = 10751;
pub const FANTASY: GenreId = 14;
pub const HISTORY: GenreId = 36;
pub const HORROR: GenreId = 27;
pub const MUSIC: GenreId = 10402;
pub const MYSTERY: GenreId = 9648;
pub const ROMANCE: GenreId = 10749;
pub const SCIENCE_FICTION: GenreId = 878;
pub const TV_MOVIE: GenreId = 10770;
pub const THRILLER: GenreId = 53;
pub const WAR: GenreId = 10752;
pub const WESTERN: GenreId = 37;

/// Display names for every genre the catalog knows about
pub const GENRE_NAMES: &[(GenreId, &str)] = &[
    (ACTION, "Action"),
    (ADVENTURE, "Adventure"),
    (ANIMATION, "Animation"),
    (COMEDY, "Comedy"),
    (CRIME, "Crime"),
    (DOCUMENTARY, "Documentary"),
    (DRAMA, "Drama"),
    (FAMILY, "Family"),
    (FANTASY, "Fantasy"),
    (HISTORY, "History"),
    (HORROR, "Horror"),
    (MUSIC, "Music"),
    (MYSTERY, "Mystery"),
    (ROMANCE, "Romance"),
    (SCIENCE_FICTION, "Science Fiction"),
    (TV_MOVIE, "TV Movie"),
    (THRILLER, "Thriller"),
    (WAR, "War"),
    (WESTERN, "Western"),
];

pub fn genre_name(id: GenreId) -> Option<&'static str> {
    GENRE_NAMES
        .iter()
        .find(|(genre, _)| *genre == id)
        .map(|(_, name)| *name)
}

/// Joins the known display names of `ids`, silently skipping unknown ids
pub fn genre_names_joined(ids: &[GenreId]) -> String {
    ids.iter()
        .filter_map(|id| genre_name(*id))
        .collect::<Vec<_>>()
        .join(", ")
}
