//! Batch processing of a directory of manuals.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::ManualImages;
use crate::parser::{ErrorMode, ExtractOptions};

/// Every PDF below `dir`, recursively, in path order.
pub fn find_manuals<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let pattern = dir.as_ref().join("**").join("*.pdf");
    let pattern = pattern.to_string_lossy();

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Attribute images for every PDF manual below `dir`.
///
/// Documents are independent and, with `options.parallel`, processed on the
/// rayon pool. In lenient mode a failing document is logged and left out of
/// the result; in strict mode the first failure (in path order) is returned.
pub fn extract_directory<P: AsRef<Path>>(
    dir: P,
    options: &ExtractOptions,
) -> Result<BTreeMap<PathBuf, ManualImages>> {
    options.validate()?;
    let paths = find_manuals(&dir)?;
    log::info!(
        "Processing {} manuals under {}",
        paths.len(),
        dir.as_ref().display()
    );

    let process = |path: &PathBuf| (path.clone(), crate::process_manual(path, options));
    let outcomes: Vec<(PathBuf, Result<ManualImages>)> = if options.parallel {
        paths.par_iter().map(process).collect()
    } else {
        paths.iter().map(process).collect()
    };

    let mut manuals = BTreeMap::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(manual) => {
                manuals.insert(path, manual);
            }
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping {}: {}", path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(manuals)
}

/// The main image of every manual, keyed by manual path; `""` when absent.
pub fn main_images<'a>(
    manuals: impl IntoIterator<Item = (&'a PathBuf, &'a ManualImages)>,
) -> BTreeMap<PathBuf, String> {
    manuals
        .into_iter()
        .map(|(path, manual)| (path.clone(), manual.main_image_link()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_manuals_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("packs/model-a")).unwrap();
        fs::write(dir.path().join("top.pdf"), b"%PDF-1.7").unwrap();
        fs::write(dir.path().join("packs/model-a/teardown.pdf"), b"%PDF-1.7").unwrap();
        fs::write(dir.path().join("packs/notes.csv"), b"Step,Text").unwrap();

        let found = find_manuals(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() == "pdf"));
    }

    #[test]
    fn test_broken_manual_by_mode() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.7\nnot a document").unwrap();

        let options = ExtractOptions::new()
            .with_output_dir(dir.path().join("images"))
            .sequential();
        let manuals = extract_directory(dir.path(), &options).unwrap();
        assert!(manuals.is_empty());

        assert!(extract_directory(dir.path(), &options.clone().strict()).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manuals = extract_directory(dir.path(), &ExtractOptions::default()).unwrap();
        assert!(manuals.is_empty());
    }
}
