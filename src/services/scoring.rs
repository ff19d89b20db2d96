//! Candidate scoring.
//!
//! The two strategies answer different questions:
//! - [`ScoringStrategy::UserFit`]: how well does this movie fit this user's history?
//! - [`ScoringStrategy::ItemSimilarity`]: how much is this movie like that one?

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::Hash;

use crate::{
    models::{MovieId, MovieRecord},
    services::{
        features::{FeatureSpace, MovieFeatureVector},
        similarity::cosine_similarity_dense,
    },
};

const USER_FIT_COSINE_WEIGHT: f64 = 0.4;
const USER_FIT_GENRE_WEIGHT: f64 = 0.2;
const USER_FIT_RATING_WEIGHT: f64 = 0.15;
const USER_FIT_POPULARITY_WEIGHT: f64 = 0.15;
const USER_FIT_YEAR_WEIGHT: f64 = 0.1;

/// Years apart at which year proximity reaches 0
const YEAR_PROXIMITY_SPAN: f64 = 50.0;

const SIMILAR_GENRE_WEIGHT: f64 = 0.5;
const SIMILAR_KEYWORD_WEIGHT: f64 = 0.2;
const SIMILAR_DIRECTOR_WEIGHT: f64 = 0.15;
const SIMILAR_CAST_WEIGHT: f64 = 0.1;
const SIMILAR_RATING_WEIGHT: f64 = 0.05;

const POINTS_PER_SHARED_DIRECTOR: f64 = 50.0;
const POINTS_PER_SHARED_ACTOR: f64 = 20.0;

const DIVERSE_ENTROPY: f64 = 0.6;
const MODERATE_ENTROPY: f64 = 0.3;

/// How spread out a user's genre history is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diversity {
    Diverse,
    Moderate,
    Niche,
}

/// Aggregate of the movies a user liked, in feature space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTasteProfile {
    /// Mean feature vector
    pub centroid: Vec<f64>,
    /// Mean normalised rating
    pub average_rating: f64,
    /// Mean normalised popularity
    pub average_popularity: f64,
    pub average_release_year: Option<f64>,
    pub genre_frequency: BTreeMap<u32, usize>,
    /// Mean blockbuster score
    pub blockbuster_bias: f64,
    /// Genre entropy divided by the maximum possible for the feature space
    pub genre_entropy: f64,
    pub diversity: Diversity,
    pub movie_count: usize,
}

impl UserTasteProfile {
    pub fn from_history(space: &FeatureSpace, history: &[MovieFeatureVector]) -> Self {
        let count = history.len();
        let mean = |f: fn(&MovieFeatureVector) -> f64| -> f64 {
            if count == 0 {
                0.0
            } else {
                history.iter().map(f).sum::<f64>() / count as f64
            }
        };

        let mut centroid = vec![0.0; space.dimensions()];
        for movie in history {
            for (slot, value) in centroid.iter_mut().zip(&movie.values) {
                *slot += value / count as f64;
            }
        }

        let years: Vec<f64> = history
            .iter()
            .filter_map(|movie| movie.release_year.map(f64::from))
            .collect();
        let average_release_year =
            (!years.is_empty()).then(|| years.iter().sum::<f64>() / years.len() as f64);

        let mut genre_frequency = BTreeMap::new();
        for movie in history {
            for genre in &movie.genre_ids {
                *genre_frequency.entry(*genre).or_insert(0) += 1;
            }
        }

        let genre_entropy = normalized_entropy(&genre_frequency, space.genre_ids().len());
        let diversity = if genre_entropy > DIVERSE_ENTROPY {
            Diversity::Diverse
        } else if genre_entropy > MODERATE_ENTROPY {
            Diversity::Moderate
        } else {
            Diversity::Niche
        };

        Self {
            centroid,
            average_rating: mean(|movie| movie.rating),
            average_popularity: mean(|movie| movie.popularity),
            average_release_year,
            genre_frequency,
            blockbuster_bias: mean(|movie| movie.blockbuster),
            genre_entropy,
            diversity,
            movie_count: count,
        }
    }

    pub fn genre_set(&self) -> BTreeSet<u32> {
        self.genre_frequency.keys().copied().collect()
    }
}

/// Shannon entropy of the genre distribution over ln(number of genres)
fn normalized_entropy(frequency: &BTreeMap<u32, usize>, genre_count: usize) -> f64 {
    let total: usize = frequency.values().sum();
    if total == 0 || genre_count < 2 {
        return 0.0;
    }

    let entropy: f64 = frequency
        .values()
        .filter(|count| **count > 0)
        .map(|count| {
            let p = *count as f64 / total as f64;
            -p * p.ln()
        })
        .sum();

    (entropy / (genre_count as f64).ln()).clamp(0.0, 1.0)
}

/// One weighted term of a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    /// 0..=100 before weighting
    pub value: f64,
    pub weight: f64,
    pub weighted: f64,
}

impl ScoreComponent {
    fn new(name: &'static str, value: f64, weight: f64) -> Self {
        Self {
            name,
            value,
            weight,
            weighted: value * weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub score: u32,
    pub components: Vec<ScoreComponent>,
}

impl ScoredMovie {
    fn from_components(movie: &MovieRecord, components: Vec<ScoreComponent>) -> Self {
        let total: f64 = components.iter().map(|c| c.weighted).sum();
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            score: total.round().max(0.0) as u32,
            components,
        }
    }

    pub fn component(&self, name: &str) -> Option<&ScoreComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Which question a ranking answers; chosen explicitly by each call site
pub enum ScoringStrategy<'a> {
    /// Fit of a candidate to a user's liked-movie profile
    UserFit {
        space: &'a FeatureSpace,
        profile: &'a UserTasteProfile,
    },
    /// Likeness of a candidate to one target movie
    ItemSimilarity { target: &'a MovieRecord },
}

impl ScoringStrategy<'_> {
    pub fn score(&self, candidate: &MovieRecord) -> ScoredMovie {
        let components = match self {
            ScoringStrategy::UserFit { space, profile } => {
                user_fit_components(&space.vectorize(candidate), profile)
            }
            ScoringStrategy::ItemSimilarity { target } => {
                item_similarity_components(target, candidate)
            }
        };
        ScoredMovie::from_components(candidate, components)
    }

    /// Scores every candidate and sorts best first (ties keep input order)
    pub fn rank(&self, candidates: &[MovieRecord]) -> Vec<ScoredMovie> {
        let mut scored: Vec<ScoredMovie> = candidates.iter().map(|c| self.score(c)).collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }
}

fn user_fit_components(
    candidate: &MovieFeatureVector,
    profile: &UserTasteProfile,
) -> Vec<ScoreComponent> {
    let cosine = cosine_similarity_dense(&candidate.values, &profile.centroid).max(0.0) * 100.0;

    let genre_overlap = jaccard_percentage(&candidate.genre_ids, &profile.genre_set());

    let rating_similarity =
        (100.0 * (1.0 - (candidate.rating - profile.average_rating).abs())).max(0.0);

    let bias = profile.blockbuster_bias;
    let popularity_alignment = candidate.popularity * bias * 100.0
        + (1.0 - candidate.popularity) * (1.0 - bias) * 100.0;

    let year_proximity = match (candidate.release_year, profile.average_release_year) {
        (Some(year), Some(average)) => {
            (100.0 * (1.0 - (f64::from(year) - average).abs() / YEAR_PROXIMITY_SPAN)).max(0.0)
        }
        _ => 0.0,
    };

    vec![
        ScoreComponent::new("cosine_similarity", cosine, USER_FIT_COSINE_WEIGHT),
        ScoreComponent::new("genre_overlap", genre_overlap, USER_FIT_GENRE_WEIGHT),
        ScoreComponent::new("rating_similarity", rating_similarity, USER_FIT_RATING_WEIGHT),
        ScoreComponent::new(
            "popularity_alignment",
            popularity_alignment,
            USER_FIT_POPULARITY_WEIGHT,
        ),
        ScoreComponent::new("year_proximity", year_proximity, USER_FIT_YEAR_WEIGHT),
    ]
}

fn item_similarity_components(target: &MovieRecord, candidate: &MovieRecord) -> Vec<ScoreComponent> {
    let target_genres: BTreeSet<u32> = target.genre_ids.iter().copied().collect();
    let candidate_genres: BTreeSet<u32> = candidate.genre_ids.iter().copied().collect();
    let genre_overlap = jaccard_percentage(&target_genres, &candidate_genres);

    let keyword_overlap = jaccard_percentage(
        &lowercase_set(&target.keywords),
        &lowercase_set(&candidate.keywords),
    );

    let shared_directors = shared_count(&target.directors, &candidate.directors);
    let director_overlap = (shared_directors as f64 * POINTS_PER_SHARED_DIRECTOR).min(100.0);

    let shared_cast = shared_count(&target.cast, &candidate.cast);
    let cast_overlap = (shared_cast as f64 * POINTS_PER_SHARED_ACTOR).min(100.0);

    let rating_closeness = match (target.vote_average, candidate.vote_average) {
        (Some(a), Some(b)) => (100.0 * (1.0 - (a - b).abs() / 10.0)).max(0.0),
        _ => 0.0,
    };

    vec![
        ScoreComponent::new("genre_overlap", genre_overlap, SIMILAR_GENRE_WEIGHT),
        ScoreComponent::new("keyword_overlap", keyword_overlap, SIMILAR_KEYWORD_WEIGHT),
        ScoreComponent::new("director_overlap", director_overlap, SIMILAR_DIRECTOR_WEIGHT),
        ScoreComponent::new("cast_overlap", cast_overlap, SIMILAR_CAST_WEIGHT),
        ScoreComponent::new("rating_closeness", rating_closeness, SIMILAR_RATING_WEIGHT),
    ]
}

/// |A ∩ B| / |A ∪ B| × 100, 0 when both are empty
pub fn jaccard_percentage<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64 * 100.0
}

fn lowercase_set(values: &[String]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_lowercase()).collect()
}

fn shared_count<T: Eq + Hash>(a: &[T], b: &[T]) -> usize {
    let a: HashSet<&T> = a.iter().collect();
    let b: HashSet<&T> = b.iter().collect();
    a.intersection(&b).count()
}
