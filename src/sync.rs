use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::{self, ExtractOptions, ProfileRecord, Skip};
use crate::sections::SectionTable;
use crate::store::{EntryStore, UpsertError};

/// Why a page produced no record.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("could not read: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error(transparent)]
    Skipped(#[from] Skip),
}

#[derive(Debug)]
pub enum Outcome {
    Upserted(ProfileRecord),
    Skipped(PageError),
    Failed(ProfileRecord, UpsertError),
}

/// Counts for one run. `scanned` counts every page iterated, whatever its outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub scanned: usize,
    pub upserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        self.scanned += 1;
        match outcome {
            Outcome::Upserted(_) => self.upserted += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed(..) => self.failed += 1,
        }
    }

    pub fn print(&self) {
        println!(
            "\nSync Complete! Processed {} profiles ({} upserted, {} skipped, {} failed).",
            self.scanned, self.upserted, self.skipped, self.failed
        );
    }
}

/// Read one page and turn it into a record.
pub fn load_record(
    path: &Path,
    table: &SectionTable,
    options: ExtractOptions,
) -> Result<ProfileRecord, PageError> {
    let content = fs::read_to_string(path)?;
    let record = extract::extract_record(&file_name(path), &content, table, options)?;
    Ok(record)
}

pub fn process_page<S: EntryStore + ?Sized>(
    path: &Path,
    table: &SectionTable,
    options: ExtractOptions,
    store: &S,
) -> Outcome {
    let record = match load_record(path, table, options) {
        Ok(r) => r,
        Err(e) => return Outcome::Skipped(e),
    };
    match store.upsert(&record) {
        Ok(()) => Outcome::Upserted(record),
        Err(e) => Outcome::Failed(record, e),
    }
}

/// Extract, classify and upsert every page in order. Failures never stop the run.
pub fn run<S: EntryStore + ?Sized, P: AsRef<Path>>(
    pages: &[P],
    table: &SectionTable,
    options: ExtractOptions,
    store: &S,
) -> Summary {
    let mut summary = Summary::default();
    for page in pages {
        let path = page.as_ref();
        let outcome = process_page(path, table, options, store);
        report(path, &outcome);
        summary.record(&outcome);
    }
    info!(
        scanned = summary.scanned,
        upserted = summary.upserted,
        skipped = summary.skipped,
        failed = summary.failed,
        "sync finished"
    );
    summary
}

fn report(path: &Path, outcome: &Outcome) {
    match outcome {
        Outcome::Upserted(r) => {
            println!("   Processing: {} ({}) - {} [OK]", r.roll, r.section, r.name);
        }
        Outcome::Failed(r, e) => {
            println!("   Processing: {} ({}) - {} [FAIL] {}", r.roll, r.section, r.name, e);
            warn!(page = %path.display(), error = %e, "upsert failed");
        }
        Outcome::Skipped(PageError::Unreadable(e)) => {
            println!("   Could not read {}: {}", file_name(path), e);
            warn!(page = %path.display(), error = %e, "unreadable page");
        }
        Outcome::Skipped(PageError::Skipped(reason)) => {
            println!("   Skipping {}: {}", file_name(path), reason);
            debug!(page = %path.display(), %reason, "skipped");
        }
    }
}

/// Records that a sync would send, plus the pages it would skip.
#[derive(Debug, Default)]
pub struct Preview {
    pub records: Vec<ProfileRecord>,
    pub skipped: Vec<(String, PageError)>,
}

pub fn preview<P: AsRef<Path>>(
    pages: &[P],
    table: &SectionTable,
    options: ExtractOptions,
) -> Preview {
    let mut out = Preview::default();
    for page in pages {
        let path = page.as_ref();
        match load_record(path, table, options) {
            Ok(r) => out.records.push(r),
            Err(e) => out.skipped.push((file_name(path), e)),
        }
    }
    out
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
