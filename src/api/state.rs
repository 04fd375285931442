use std::sync::Arc;

use crate::{
    config::Config,
    db::QueryStore,
    services::{
        CatalogSearch, CommonFilmsFinder, DirectorFilms, FilmAggregator, FilmCatalog,
        PopularityRanker, RecommendationEngine, ReferenceData,
    },
};

/// Shared application state
///
/// Every service is stateless over the shared store handle, so cloning the
/// state per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub catalog: FilmCatalog,
    pub popularity: PopularityRanker,
    pub recommendations: RecommendationEngine,
    pub common_films: CommonFilmsFinder,
    pub search: CatalogSearch,
    pub director_films: DirectorFilms,
    pub reference: ReferenceData,
    pub popular_default_count: i64,
}

impl AppState {
    /// Wires every service over one store
    pub fn new(store: Arc<dyn QueryStore>, config: &Config) -> Self {
        let aggregator = FilmAggregator::new(store.clone());

        Self {
            catalog: FilmCatalog::new(aggregator.clone()),
            popularity: PopularityRanker::new(aggregator.clone()),
            recommendations: RecommendationEngine::new(aggregator.clone())
                .with_neighbor_limit(config.recommendation_neighbors)
                .with_result_limit(config.recommendation_limit),
            common_films: CommonFilmsFinder::new(aggregator.clone()),
            search: CatalogSearch::new(aggregator.clone()),
            director_films: DirectorFilms::new(aggregator),
            reference: ReferenceData::new(store),
            popular_default_count: config.popular_default_count,
        }
    }
}
