pub mod aggregator;
pub mod associations;
pub mod catalog;
pub mod common_films;
pub mod director_films;
pub mod popularity;
pub mod recommendations;
pub mod reference;
pub mod search;

pub use aggregator::FilmAggregator;
pub use associations::{AssociationLoader, FilmAssociations};
pub use catalog::FilmCatalog;
pub use common_films::CommonFilmsFinder;
pub use director_films::DirectorFilms;
pub use popularity::PopularityRanker;
pub use recommendations::RecommendationEngine;
pub use reference::ReferenceData;
pub use search::CatalogSearch;
