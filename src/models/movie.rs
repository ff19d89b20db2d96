use serde::{Deserialize, Serialize};

/// TMDB movie identifier
pub type MovieId = i64;

/// Top-billed cast members kept from a credits response
const MAX_CAST: usize = 10;

/// Movie metadata as returned by the catalog. Read-only for the scoring code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieRecord {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl MovieRecord {
    /// Year component of `release_date` (`YYYY-MM-DD`). TMDB sends `""` for unknown dates.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(0..4))
            .and_then(|year| year.parse().ok())
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbGenre {
    pub id: u32,
    pub name: String,
}

/// Response from GET /genre/movie/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbGenreList {
    pub genres: Vec<TmdbGenre>,
}

/// Response from GET /movie/{id}?append_to_response=credits,keywords
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub keywords: Option<TmdbKeywords>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbKeywords {
    #[serde(default)]
    pub keywords: Vec<TmdbKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbKeyword {
    pub name: String,
}

impl From<TmdbMovieDetails> for MovieRecord {
    fn from(details: TmdbMovieDetails) -> Self {
        let credits = details.credits.unwrap_or_default();

        let mut cast = credits.cast;
        cast.sort_by_key(|member| member.order.unwrap_or(u32::MAX));
        let cast = cast
            .into_iter()
            .take(MAX_CAST)
            .map(|member| member.name)
            .collect();

        let directors = credits
            .crew
            .into_iter()
            .filter(|member| member.job == "Director")
            .map(|member| member.name)
            .collect();

        let release_date = details.release_date.filter(|date| !date.is_empty());

        MovieRecord {
            id: details.id,
            title: details.title,
            genre_ids: details.genres.iter().map(|genre| genre.id).collect(),
            popularity: details.popularity,
            vote_average: details.vote_average,
            release_date,
            original_language: details.original_language,
            directors,
            cast,
            keywords: details
                .keywords
                .unwrap_or_default()
                .keywords
                .into_iter()
                .map(|keyword| keyword.name)
                .collect(),
        }
    }
}
