use crate::core::catalog::Catalog;
use crate::core::exif::MetadataExtractor;
use crate::core::signature::Signature;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Independent stopping thresholds; reaching either one ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub files: usize,
    pub vendors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    FileTarget,
    VendorTarget,
    Exhausted,
}

/// A signature first seen during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub signature: Signature,
    pub count: usize,
    pub example: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    /// Files that yielded a signature missing from the catalog.
    pub files_processed: usize,
    /// Distinct signatures first seen this run.
    pub new_vendors_found: usize,
    pub files_examined: usize,
    pub known_skipped: usize,
    pub unreadable_skipped: usize,
    /// In order of first discovery.
    pub discoveries: Vec<DiscoveryRecord>,
    pub halt: HaltReason,
}

impl SampleReport {
    pub fn is_empty(&self) -> bool {
        self.discoveries.is_empty()
    }
}

/// Insertion-ordered discoveries with a lookup index.
#[derive(Default)]
struct DiscoveryMap {
    records: Vec<DiscoveryRecord>,
    index: HashMap<Signature, usize>,
}

impl DiscoveryMap {
    /// Count one occurrence; returns true if the signature is new to the map.
    fn observe(&mut self, signature: Signature, path: PathBuf) -> bool {
        if let Some(&i) = self.index.get(&signature) {
            self.records[i].count += 1;
            return false;
        }

        self.index.insert(signature.clone(), self.records.len());
        self.records.push(DiscoveryRecord {
            signature,
            count: 1,
            example: path,
        });
        true
    }
}

/// Bounded random sampling of candidate files against a loaded catalog.
pub struct Sampler<'a, E> {
    extractor: E,
    catalog: &'a Catalog,
    targets: Targets,
    progress: ProgressBar,
}

impl<'a, E: MetadataExtractor> Sampler<'a, E> {
    pub fn new(extractor: E, catalog: &'a Catalog, targets: Targets) -> Self {
        Self {
            extractor,
            catalog,
            targets,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Walk `candidates` in order until a target is met or the list runs out.
    ///
    /// Files whose metadata cannot be read, or whose signature is already named in
    /// the catalog, do not count toward either target.
    pub fn run<I>(&mut self, candidates: I) -> SampleReport
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut tally = Tally::default();

        self.progress.set_length(self.targets.files as u64);
        self.progress.set_position(0);

        for path in candidates {
            if tally.halt_reason(self.targets).is_some() {
                break;
            }
            self.step(&mut tally, path);
        }

        self.progress.finish_and_clear();
        tally.into_report(self.targets)
    }

    /// Examine one candidate and fold the result into `tally`.
    fn step(&mut self, tally: &mut Tally, path: PathBuf) {
        tally.files_examined += 1;
        let metadata = match self.extractor.extract(&path) {
            Ok(records) => match records.into_iter().next() {
                Some(first) => first,
                None => {
                    debug!("No metadata in {}", path.display());
                    tally.unreadable_skipped += 1;
                    return;
                }
            },
            Err(e) => {
                debug!("Could not process {}: {}", path.display(), e);
                tally.unreadable_skipped += 1;
                return;
            }
        };

        let signature = Signature::from_metadata(&metadata);
        if self.catalog.contains(&signature) {
            tally.known_skipped += 1;
            return;
        }

        if tally.discoveries.observe(signature.clone(), path) {
            tally.new_vendors_found += 1;
            info!("Found new signature: {}", signature);
        }
        tally.files_processed += 1;

        self.progress.set_position(tally.files_processed as u64);
        self.progress
            .set_message(format!("{} new signature(s)", tally.new_vendors_found));
    }
}

/// Running counters for one sampling pass.
#[derive(Default)]
struct Tally {
    files_processed: usize,
    new_vendors_found: usize,
    files_examined: usize,
    known_skipped: usize,
    unreadable_skipped: usize,
    discoveries: DiscoveryMap,
}

impl Tally {
    fn halt_reason(&self, targets: Targets) -> Option<HaltReason> {
        if self.files_processed >= targets.files {
            Some(HaltReason::FileTarget)
        } else if self.new_vendors_found >= targets.vendors {
            Some(HaltReason::VendorTarget)
        } else {
            None
        }
    }

    fn into_report(self, targets: Targets) -> SampleReport {
        SampleReport {
            halt: self.halt_reason(targets).unwrap_or(HaltReason::Exhausted),
            files_processed: self.files_processed,
            new_vendors_found: self.new_vendors_found,
            files_examined: self.files_examined,
            known_skipped: self.known_skipped,
            unreadable_skipped: self.unreadable_skipped,
            discoveries: self.discoveries.records,
        }
    }
}
