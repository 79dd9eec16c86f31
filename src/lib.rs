pub mod carryover;
pub mod catalogue;
pub mod config;
pub mod db;
pub mod engine;
pub mod goals;
pub mod intake;
pub mod models;
pub mod ranker;
pub mod service;

use tracing_subscriber::EnvFilter;

pub use catalogue::{load_catalogue, CatalogueIndex};
pub use goals::GoalTaxonomy;
pub use models::{Catalogue, Decision, DecisionQuery, Recommendation, UserProfile};
pub use service::DecisionService;

/// Initialize tracing. RUST_LOG wins; otherwise the crate default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Herbora decision engine v{}", config::APP_VERSION);
}
