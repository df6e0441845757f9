use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use modula_plugin_db::PluginCatalog;
use modula_plugin_host::PluginFormat;

use crate::probe::{probe_candidate, probe_with_helper};

const MAX_SCAN_DEPTH: usize = 4;

/// One candidate that failed to yield a valid plugin. Failures are data, not
/// errors; the scan always runs to exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Stateful, step-wise prober that walks search locations for one format
/// backend and merges discovered descriptions into the catalog.
///
/// The candidate queue is built up front: directories among the locations are
/// walked (one level deep unless `recursive`), everything else — plain files
/// and virtual URIs such as `builtin:` — becomes a single candidate.
///
/// The dead-man's-pedal file is the crash-recovery contract: the scanner
/// writes a candidate's path into the file before probing it and clears the
/// marker once the probe returns. A path still listed at construction time
/// therefore crashed a previous scan and is skipped permanently.
///
/// Cancellation is the caller's job: stop calling [`scan_next_file`] and drop
/// the scanner.
///
/// [`scan_next_file`]: DirectoryScanner::scan_next_file
pub struct DirectoryScanner<'f> {
    catalog: Arc<PluginCatalog>,
    format: &'f dyn PluginFormat,
    queue: VecDeque<PathBuf>,
    blacklist: HashSet<PathBuf>,
    failures: Vec<ScanFailure>,
    pedal_file: Option<PathBuf>,
    helper: Option<PathBuf>,
}

impl<'f> DirectoryScanner<'f> {
    pub fn new(
        catalog: Arc<PluginCatalog>,
        format: &'f dyn PluginFormat,
        locations: &[PathBuf],
        recursive: bool,
        pedal_file: Option<PathBuf>,
    ) -> Self {
        let mut queue = VecDeque::new();
        for location in locations {
            if location.is_dir() {
                let depth = if recursive { MAX_SCAN_DEPTH } else { 1 };
                let walker = WalkDir::new(location).min_depth(1).max_depth(depth);
                for entry in walker {
                    match entry {
                        Ok(entry) => queue.push_back(entry.into_path()),
                        Err(err) => {
                            debug!("skipping entry under {}: {err}", location.display());
                        }
                    }
                }
            } else {
                queue.push_back(location.clone());
            }
        }

        let blacklist = pedal_file
            .as_deref()
            .map(read_pedal_file)
            .unwrap_or_default();

        Self {
            catalog,
            format,
            queue,
            blacklist,
            failures: Vec::new(),
            pedal_file,
            helper: None,
        }
    }

    /// Sets the helper executable used when a step requests separate-process
    /// probing. Without one, probing happens in-process.
    pub fn with_probe_helper(mut self, helper: impl Into<PathBuf>) -> Self {
        self.helper = Some(helper.into());
        self
    }

    /// Advances the scan by exactly one candidate. Returns the display name
    /// of the candidate just processed, or `None` once the queue is
    /// exhausted. A candidate that fails to probe is recorded in
    /// [`failures`](Self::failures) and never aborts the scan.
    pub fn scan_next_file(&mut self, probe_separately: bool) -> Option<String> {
        let candidate = self.queue.pop_front()?;
        let name = candidate.display().to_string();

        if self.blacklist.contains(&candidate) {
            debug!("skipping {name}: crashed during a previous scan");
            self.failures.push(ScanFailure {
                path: candidate,
                reason: "crashed during a previous scan".into(),
            });
            return Some(name);
        }

        self.mark_pedal(&candidate);
        let result = match (probe_separately, self.helper.as_deref()) {
            (true, Some(helper)) => probe_with_helper(helper, self.format.name(), &candidate),
            _ => probe_candidate(self.format, &candidate),
        };
        self.clear_pedal();

        match result {
            Ok(descriptions) => {
                for description in descriptions {
                    self.catalog.add(description);
                }
            }
            Err(reason) => {
                warn!("failed to probe {name}: {reason}");
                self.failures.push(ScanFailure {
                    path: candidate,
                    reason,
                });
            }
        }
        Some(name)
    }

    pub fn has_more(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn failures(&self) -> &[ScanFailure] {
        &self.failures
    }

    fn mark_pedal(&self, candidate: &Path) {
        let Some(pedal) = self.pedal_file.as_deref() else {
            return;
        };
        let mut lines: Vec<String> = self
            .blacklist
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        lines.sort();
        lines.push(candidate.display().to_string());
        if let Err(err) = fs::write(pedal, lines.join("\n")) {
            warn!("could not update pedal file {}: {err}", pedal.display());
        }
    }

    fn clear_pedal(&self) {
        let Some(pedal) = self.pedal_file.as_deref() else {
            return;
        };
        let mut lines: Vec<String> = self
            .blacklist
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        lines.sort();
        if let Err(err) = fs::write(pedal, lines.join("\n")) {
            warn!("could not clear pedal file {}: {err}", pedal.display());
        }
    }
}

fn read_pedal_file(pedal: &Path) -> HashSet<PathBuf> {
    match fs::read_to_string(pedal) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
        Err(_) => HashSet::new(),
    }
}
