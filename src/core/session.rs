use crate::config::SamplerConfig;
use crate::core::catalog::{CatalogError, CatalogStore};
use crate::core::discovery::{DiscoveryError, discover_media, extension_set};
use crate::core::exif::MetadataExtractor;
use crate::core::resolver::{self, NameSource, ResolveOutcome};
use crate::core::sampler::{SampleReport, Sampler};
use indicatif::ProgressBar;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Scan failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to read device name: {0}")]
    Prompt(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The source tree held no candidate files; nothing was sampled or saved.
    NoFiles,
    Sampled {
        report: SampleReport,
        resolved: ResolveOutcome,
    },
}

/// Progress bars for the scan and sampling phases.
pub struct SessionProgress {
    pub scan: ProgressBar,
    pub sample: ProgressBar,
}

impl SessionProgress {
    pub fn hidden() -> Self {
        Self {
            scan: ProgressBar::hidden(),
            sample: ProgressBar::hidden(),
        }
    }
}

/// One full run: load the catalog, scan and shuffle the source tree, sample it,
/// ask for names of new signatures and save the catalog if any were given.
pub fn run_session<E, N, R>(
    config: &SamplerConfig,
    extractor: E,
    names: &mut N,
    rng: &mut R,
    progress: SessionProgress,
) -> Result<SessionOutcome, SessionError>
where
    E: MetadataExtractor,
    N: NameSource + ?Sized,
    R: Rng + ?Sized,
{
    let store = CatalogStore::new(&config.catalog_file);
    let mut catalog = store.load();
    info!(
        "Loaded {} known device(s) from {}",
        catalog.len(),
        store.path().display()
    );

    let candidates = discover_media(
        &config.source_path,
        &extension_set(&config.extensions),
        rng,
        &progress.scan,
    );
    progress.scan.finish_and_clear();
    let candidates = candidates?;

    if candidates.is_empty() {
        warn!("No media files found in {}", config.source_path.display());
        return Ok(SessionOutcome::NoFiles);
    }
    info!("Sampling from {} candidate file(s)", candidates.len());

    let report = Sampler::new(extractor, &catalog, config.targets())
        .with_progress(progress.sample)
        .run(candidates);

    if report.is_empty() {
        return Ok(SessionOutcome::Sampled {
            report,
            resolved: ResolveOutcome::Unchanged,
        });
    }

    names.begin(&report)?;
    let prompts = resolver::prompts(&report);
    let assignments = resolver::collect_names(&prompts, names)?;
    let resolved = resolver::apply(&mut catalog, &store, assignments)?;

    Ok(SessionOutcome::Sampled { report, resolved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exif::ExifService;
    use crate::core::exif::tests::{bare_jpeg, tiff_with_make};
    use crate::core::resolver::DiscoveryPrompt;
    use crate::core::signature::Signature;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct CannedNames {
        answers: VecDeque<&'static str>,
        asked: Vec<Signature>,
        began: usize,
    }

    impl CannedNames {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
                began: 0,
            }
        }
    }

    impl NameSource for CannedNames {
        fn begin(&mut self, _report: &SampleReport) -> std::io::Result<()> {
            self.began += 1;
            Ok(())
        }

        fn ask(&mut self, prompt: &DiscoveryPrompt) -> std::io::Result<String> {
            self.asked.push(prompt.signature.clone());
            Ok(self.answers.pop_front().unwrap_or("").to_string())
        }
    }

    fn config(source: &Path, catalog: PathBuf) -> SamplerConfig {
        SamplerConfig {
            source_path: source.to_path_buf(),
            catalog_file: catalog,
            extensions: vec![".tif".to_string(), ".jpg".to_string()],
            target_file_count: 500,
            target_vendor_count: 5,
        }
    }

    fn run(config: &SamplerConfig, names: &mut CannedNames) -> Result<SessionOutcome, SessionError> {
        let mut rng = StdRng::seed_from_u64(3);
        run_session(config, ExifService::new(), names, &mut rng, SessionProgress::hidden())
    }

    fn canon() -> Signature {
        Signature::from_parts("Canon", "Unknown", "None")
    }

    #[test]
    fn test_empty_tree_asks_nothing_and_saves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("media");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("readme.md"), b"x").unwrap();
        let catalog_path = temp_dir.path().join("catalog.json");

        let mut names = CannedNames::new(&["Should not be used"]);
        let outcome = run(&config(&source, catalog_path.clone()), &mut names).unwrap();

        assert_eq!(outcome, SessionOutcome::NoFiles);
        assert_eq!(names.began, 0);
        assert!(names.asked.is_empty());
        assert!(!catalog_path.exists());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(
            &temp_dir.path().join("unplugged"),
            temp_dir.path().join("catalog.json"),
        );

        let result = run(&config, &mut CannedNames::new(&[]));
        assert!(matches!(result, Err(SessionError::Discovery(_))));
    }

    #[test]
    fn test_corrupt_catalog_is_replaced_after_naming() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("media");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("camera.tif"), tiff_with_make()).unwrap();
        let catalog_path = temp_dir.path().join("catalog.json");
        fs::write(&catalog_path, "{ \"half\": ").unwrap();

        let mut names = CannedNames::new(&["  Canon body "]);
        let outcome = run(&config(&source, catalog_path.clone()), &mut names).unwrap();

        match outcome {
            SessionOutcome::Sampled { report, resolved } => {
                assert_eq!(report.new_vendors_found, 1);
                assert_eq!(resolved, ResolveOutcome::Saved { added: 1 });
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(names.began, 1);
        assert_eq!(names.asked, vec![canon()]);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&catalog_path).unwrap()).unwrap();
        assert_eq!(raw[canon().as_str()], "Canon body");
    }

    #[test]
    fn test_declining_leaves_catalog_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("media");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("camera.tif"), tiff_with_make()).unwrap();
        fs::write(source.join("stripped.jpg"), bare_jpeg()).unwrap();
        let catalog_path = temp_dir.path().join("catalog.json");
        fs::write(&catalog_path, "{ not json").unwrap();

        let mut names = CannedNames::new(&["", "   "]);
        let outcome = run(&config(&source, catalog_path.clone()), &mut names).unwrap();

        match outcome {
            SessionOutcome::Sampled { report, resolved } => {
                assert_eq!(report.new_vendors_found, 2);
                assert_eq!(resolved, ResolveOutcome::Unchanged);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(names.asked.len(), 2);
        assert_eq!(fs::read_to_string(&catalog_path).unwrap(), "{ not json");
    }

    #[test]
    fn test_second_run_finds_nothing_new() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("media");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("camera.tif"), tiff_with_make()).unwrap();
        fs::write(source.join("stripped.jpg"), bare_jpeg()).unwrap();
        let catalog_path = temp_dir.path().join("catalog.json");
        let config = config(&source, catalog_path.clone());

        run(&config, &mut CannedNames::new(&["First", "Second"])).unwrap();
        let saved = CatalogStore::new(&catalog_path).load();
        assert_eq!(saved.len(), 2);

        let mut names = CannedNames::new(&["Unused"]);
        let outcome = run(&config, &mut names).unwrap();

        match outcome {
            SessionOutcome::Sampled { report, resolved } => {
                assert!(report.is_empty());
                assert_eq!(report.known_skipped, 2);
                assert_eq!(resolved, ResolveOutcome::Unchanged);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(names.began, 0);
        assert!(names.asked.is_empty());
        assert_eq!(CatalogStore::new(&catalog_path).load(), saved);
    }
}
