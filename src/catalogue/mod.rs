//! Catalogue-side building blocks: token normalization, the immutable
//! fact index, and the JSON data-directory loader.

pub mod index;
pub mod loader;
pub mod normalize;

pub use index::{CatalogueIndex, TOKEN_BREASTFEEDING, TOKEN_PREGNANCY};
pub use loader::{load_catalogue, CatalogueError};
pub use normalize::{fold_text, normalize_token};
