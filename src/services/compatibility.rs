//! Compatibility between two users' curated movie lists.
//!
//! Unlike the taste match this works on explicit picks only and is recomputed
//! on every request; there is no session or persisted result.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::{
    db::Store,
    error::AppResult,
    models::{CuratedMovie, CuratedMovieList, MovieId, UserId},
};

const DIRECT_WEIGHT: f64 = 0.40;
const SIMILAR_WEIGHT: f64 = 0.35;
const GENRE_WEIGHT: f64 = 0.15;
const LANGUAGE_WEIGHT: f64 = 0.10;

const SHARED_GENRE_POINTS: f64 = 0.5;
const SAME_LANGUAGE_POINTS: f64 = 1.0;

pub const MAX_COMMON_MOVIES: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Curated picks and declared languages of one user
#[derive(Debug, Clone, Copy)]
pub struct CuratedSide<'a> {
    pub movies: &'a [CuratedMovie],
    pub languages: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityBreakdown {
    pub direct_overlap: f64,
    pub similar_overlap: f64,
    pub genre_overlap: f64,
    pub language_overlap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compatibility {
    pub score: u32,
    pub breakdown: CompatibilityBreakdown,
    pub common_movies: Vec<CuratedMovie>,
    pub recommendations: Vec<CuratedMovie>,
}

pub fn calculate(a: CuratedSide<'_>, b: CuratedSide<'_>) -> Compatibility {
    let breakdown = CompatibilityBreakdown {
        direct_overlap: direct_overlap(a.movies, b.movies),
        similar_overlap: similar_overlap(a.movies, b.movies),
        genre_overlap: genre_overlap(a.movies, b.movies),
        language_overlap: language_overlap(a.languages, b.languages),
    };

    let score = DIRECT_WEIGHT * breakdown.direct_overlap
        + SIMILAR_WEIGHT * breakdown.similar_overlap
        + GENRE_WEIGHT * breakdown.genre_overlap
        + LANGUAGE_WEIGHT * breakdown.language_overlap;

    let common_ids = common_ids(a.movies, b.movies);
    let common_movies = a
        .movies
        .iter()
        .filter(|movie| common_ids.contains(&movie.tmdb_id))
        .take(MAX_COMMON_MOVIES)
        .cloned()
        .collect();

    Compatibility {
        score: score.round().clamp(0.0, 100.0) as u32,
        breakdown,
        common_movies,
        recommendations: blended_recommendations(a, b, &common_ids),
    }
}

fn common_ids(a: &[CuratedMovie], b: &[CuratedMovie]) -> HashSet<MovieId> {
    let a: HashSet<MovieId> = a.iter().map(|movie| movie.tmdb_id).collect();
    b.iter()
        .map(|movie| movie.tmdb_id)
        .filter(|id| a.contains(id))
        .collect()
}

/// Shared movies over the longer list
pub fn direct_overlap(a: &[CuratedMovie], b: &[CuratedMovie]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    common_ids(a, b).len() as f64 / longest as f64 * 100.0
}

/// Loose pairwise heuristic: each cross pair scores up to 1.5, capped at 100 overall
pub fn similar_overlap(a: &[CuratedMovie], b: &[CuratedMovie]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut points = 0.0;
    for left in a {
        for right in b {
            if left.genres.iter().any(|genre| right.genres.contains(genre)) {
                points += SHARED_GENRE_POINTS;
            }
            if left.language.is_some() && left.language == right.language {
                points += SAME_LANGUAGE_POINTS;
            }
        }
    }

    (points / (a.len() * b.len()) as f64 * 100.0).min(100.0)
}

/// Genres present in both lists over all genres in either
pub fn genre_overlap(a: &[CuratedMovie], b: &[CuratedMovie]) -> f64 {
    let genres = |movies: &[CuratedMovie]| -> BTreeSet<String> {
        movies
            .iter()
            .flat_map(|movie| movie.genres.iter().cloned())
            .collect()
    };
    let a = genres(a);
    let b = genres(b);

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64 * 100.0
}

/// Shared declared languages over the larger declared set; 0 if either is empty
pub fn language_overlap(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<&String> = a.iter().collect();
    let b: HashSet<&String> = b.iter().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / a.len().max(b.len()) as f64 * 100.0
}

/// Movies from either list that are not common, shared-language picks first
fn blended_recommendations(
    a: CuratedSide<'_>,
    b: CuratedSide<'_>,
    common: &HashSet<MovieId>,
) -> Vec<CuratedMovie> {
    let shared_languages: HashSet<&String> = a
        .languages
        .iter()
        .filter(|language| b.languages.contains(language))
        .collect();

    let mut seen = HashSet::new();
    let mut candidates: Vec<&CuratedMovie> = a
        .movies
        .iter()
        .chain(b.movies)
        .filter(|movie| !common.contains(&movie.tmdb_id))
        .filter(|movie| seen.insert(movie.tmdb_id))
        .collect();

    let in_shared_language = |movie: &CuratedMovie| {
        movie
            .language
            .as_ref()
            .is_some_and(|language| shared_languages.contains(language))
    };
    // stable sort keeps list order within each group
    candidates.sort_by_key(|movie| !in_shared_language(movie));

    candidates
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .cloned()
        .collect()
}

/// Result of a compatibility request; missing lists are an expected state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompatibilityOutcome {
    MissingList { missing: Vec<UserId> },
    Success(Compatibility),
}

#[derive(Clone)]
pub struct CompatibilityService {
    store: Arc<dyn Store>,
}

impl CompatibilityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn calculate_compatibility(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<CompatibilityOutcome> {
        let (user_list, friend_list) = tokio::try_join!(
            self.store.curated_list(user_id),
            self.store.curated_list(friend_id)
        )?;

        let (user_list, friend_list): (CuratedMovieList, CuratedMovieList) =
            match (user_list, friend_list) {
                (Some(user_list), Some(friend_list)) => (user_list, friend_list),
                (user_list, friend_list) => {
                    let missing = [(user_id, user_list.is_none()), (friend_id, friend_list.is_none())]
                        .into_iter()
                        .filter_map(|(id, absent)| absent.then_some(id))
                        .collect();
                    return Ok(CompatibilityOutcome::MissingList { missing });
                }
            };

        let (user_languages, friend_languages) = tokio::try_join!(
            self.store.preferred_languages(user_id),
            self.store.preferred_languages(friend_id)
        )?;

        let result = calculate(
            CuratedSide {
                movies: &user_list.movies,
                languages: &user_languages,
            },
            CuratedSide {
                movies: &friend_list.movies,
                languages: &friend_languages,
            },
        );

        tracing::info!(
            user_id,
            friend_id,
            score = result.score,
            common = result.common_movies.len(),
            "Compatibility calculated"
        );

        Ok(CompatibilityOutcome::Success(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn movie(id: MovieId, genres: &[&str], language: &str) -> CuratedMovie {
        CuratedMovie {
            tmdb_id: id,
            title: format!("Movie {}", id),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            language: Some(language.to_string()),
        }
    }

    fn languages(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn five(offset: MovieId) -> Vec<CuratedMovie> {
        (1..=5)
            .map(|i| movie(offset + i, &["Drama"], "en"))
            .collect()
    }

    #[test]
    fn test_identical_lists() {
        let movies = five(0);
        let langs = languages(&["en"]);
        let side = CuratedSide {
            movies: &movies,
            languages: &langs,
        };

        let result = calculate(side, side);

        assert_eq!(result.breakdown.direct_overlap, 100.0);
        assert_eq!(result.breakdown.genre_overlap, 100.0);
        assert_eq!(result.breakdown.language_overlap, 100.0);
        assert!(result.score >= 40);
        assert_eq!(result.common_movies.len(), 5);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_direct_and_genre_overlap_are_symmetric() {
        let a = vec![
            movie(1, &["Drama", "Crime"], "en"),
            movie(2, &["Comedy"], "fr"),
            movie(3, &["Horror"], "en"),
        ];
        let b = vec![movie(1, &["Drama", "Crime"], "en"), movie(9, &["Comedy", "Romance"], "ko")];

        assert_eq!(direct_overlap(&a, &b), direct_overlap(&b, &a));
        assert_eq!(genre_overlap(&a, &b), genre_overlap(&b, &a));
        assert!((direct_overlap(&a, &b) - 100.0 / 3.0).abs() < 1e-9);
        // Drama, Crime, Comedy shared out of five
        assert!((genre_overlap(&a, &b) - 60.0).abs() < 1e-9);

        let la = languages(&["en", "fr"]);
        let lb = languages(&["ko"]);
        let forward = calculate(
            CuratedSide { movies: &a, languages: &la },
            CuratedSide { movies: &b, languages: &lb },
        );
        let backward = calculate(
            CuratedSide { movies: &b, languages: &lb },
            CuratedSide { movies: &a, languages: &la },
        );
        assert_eq!(forward.score, backward.score);
    }

    #[test]
    fn test_similar_overlap_counts_pairs_and_caps() {
        let a = vec![movie(1, &["Drama"], "en")];
        let b = vec![movie(2, &["Drama"], "en"), movie(3, &["Western"], "de")];
        // (0.5 + 1.0) + 0 over two pairs
        assert!((similar_overlap(&a, &b) - 75.0).abs() < 1e-9);

        let c = vec![movie(4, &["Drama"], "en")];
        assert_eq!(similar_overlap(&a, &c), 100.0);
        assert_eq!(similar_overlap(&a, &[]), 0.0);
    }

    #[test]
    fn test_language_overlap_requires_both_sets() {
        assert_eq!(language_overlap(&languages(&["en"]), &[]), 0.0);
        assert_eq!(
            language_overlap(&languages(&["en", "es"]), &languages(&["en"])),
            50.0
        );
    }

    #[test]
    fn test_common_movies_capped() {
        let movies: Vec<CuratedMovie> = (1..=12).map(|i| movie(i, &["Drama"], "en")).collect();
        let side = CuratedSide {
            movies: &movies,
            languages: &[],
        };
        let result = calculate(side, side);
        assert_eq!(result.common_movies.len(), MAX_COMMON_MOVIES);
    }

    #[test]
    fn test_recommendations_prefer_shared_languages() {
        let a = vec![
            movie(1, &["Drama"], "en"),
            movie(2, &["Drama"], "de"),
            movie(3, &["Drama"], "ja"),
        ];
        let b = vec![
            movie(1, &["Drama"], "en"),
            movie(4, &["Drama"], "ko"),
            movie(5, &["Drama"], "ja"),
        ];
        let la = languages(&["ja", "en"]);
        let lb = languages(&["ja"]);

        let result = calculate(
            CuratedSide { movies: &a, languages: &la },
            CuratedSide { movies: &b, languages: &lb },
        );

        let ids: Vec<MovieId> = result.recommendations.iter().map(|m| m.tmdb_id).collect();
        assert_eq!(ids, vec![3, 5, 2, 4]);
    }

    #[tokio::test]
    async fn test_service_reports_missing_lists() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_curated_list(&CuratedMovieList::new(1, five(0)).unwrap())
            .await
            .unwrap();

        let service = CompatibilityService::new(store);
        let outcome = tokio_test::assert_ok!(service.calculate_compatibility(1, 2).await);

        assert_eq!(outcome, CompatibilityOutcome::MissingList { missing: vec![2] });
    }

    #[tokio::test]
    async fn test_service_uses_stored_languages() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_curated_list(&CuratedMovieList::new(1, five(0)).unwrap())
            .await
            .unwrap();
        store
            .save_curated_list(&CuratedMovieList::new(2, five(100)).unwrap())
            .await
            .unwrap();
        store
            .save_preferred_languages(1, &languages(&["en"]))
            .await
            .unwrap();
        store
            .save_preferred_languages(2, &languages(&["en"]))
            .await
            .unwrap();

        let service = CompatibilityService::new(store);
        let CompatibilityOutcome::Success(result) =
            service.calculate_compatibility(1, 2).await.unwrap()
        else {
            panic!("expected a score");
        };

        assert_eq!(result.breakdown.direct_overlap, 0.0);
        assert_eq!(result.breakdown.similar_overlap, 100.0);
        assert_eq!(result.breakdown.language_overlap, 100.0);
        // 0.35 * 100 + 0.15 * 100 + 0.10 * 100
        assert_eq!(result.score, 60);
        assert_eq!(result.recommendations.len(), MAX_RECOMMENDATIONS);
    }
}
