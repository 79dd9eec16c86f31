//! Catalogue ingestion: reads a data directory of JSON sheet files into the
//! in-memory [`Catalogue`]. This is the boundary with the content pipeline;
//! everything past this point works on typed records only.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{
    Catalogue, Sheet, CATEGORY_DIETS, CATEGORY_PRACTICES, CATEGORY_SUPPLEMENTS,
};

/// Data-dir subfolder → catalogue category.
const FOLDER_MAPPING: &[(&str, &str)] = &[
    ("supplements", CATEGORY_SUPPLEMENTS),
    ("other", CATEGORY_PRACTICES),
    ("diets", CATEGORY_DIETS),
];

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid sheet JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load the full catalogue from `data_dir`. Missing subfolders are empty
/// categories; an unreadable or malformed file is an error naming the file.
pub fn load_catalogue(data_dir: &Path) -> Result<Catalogue, CatalogueError> {
    let mut catalogue = Catalogue::default();

    for (folder, category) in FOLDER_MAPPING {
        let sheets = load_folder(&data_dir.join(folder))?;
        tracing::debug!(category, count = sheets.len(), "Catalogue category loaded");
        catalogue.categories.insert((*category).to_string(), sheets);
    }

    tracing::info!(
        sheets = catalogue.sheets().count(),
        "Catalogue loaded from {}",
        data_dir.display()
    );
    Ok(catalogue)
}

fn load_folder(folder: &Path) -> Result<Vec<Sheet>, CatalogueError> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(folder).map_err(|source| CatalogueError::Io {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    // Deterministic load order, case-insensitive on file name.
    paths.sort_by_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });

    let mut sheets = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read_to_string(&path).map_err(|source| CatalogueError::Io {
            path: path.clone(),
            source,
        })?;
        let sheet: Sheet =
            serde_json::from_str(&raw).map_err(|source| CatalogueError::Parse { path, source })?;
        sheets.push(sheet);
    }
    Ok(sheets)
}
