//! Reading candidate records handed over by the fetch/parse process
//!
//! Input is JSON Lines, one [`CandidateItem`] per line.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::item::CandidateItem;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Cannot read input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Candidates parsed from one input, plus how many lines were unusable
#[derive(Debug, Default)]
pub struct CandidateBatch {
    pub candidates: Vec<CandidateItem>,
    pub malformed: usize,
}

/// Read candidates from a file, or from stdin when `path` is `-`
pub fn read_candidates(path: &Path) -> Result<CandidateBatch, IngestError> {
    let display = path.display().to_string();
    let input_err = |source| IngestError::Input {
        path: display.clone(),
        source,
    };

    if path.as_os_str() == "-" {
        parse_lines(std::io::stdin().lock()).map_err(input_err)
    } else {
        let file = std::fs::File::open(path).map_err(input_err)?;
        parse_lines(file).map_err(input_err)
    }
}

/// Parse JSON Lines; blank lines are skipped, malformed ones counted
pub fn parse_lines<R: Read>(reader: R) -> std::io::Result<CandidateBatch> {
    let mut batch = CandidateBatch::default();

    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<CandidateItem>(trimmed) {
            Ok(candidate) => batch.candidates.push(candidate),
            Err(e) => {
                warn!(line = number + 1, error = %e, "Skipping malformed candidate");
                batch.malformed += 1;
            }
        }
    }

    Ok(batch)
}

/// Upstream popularity filter; a threshold of 0 lets everything through
///
/// With a threshold set, candidates without a count are filtered out.
pub fn passes_threshold(candidate: &CandidateItem, min_download_count: u64) -> bool {
    if min_download_count == 0 {
        return true;
    }
    let passes = candidate
        .download_count
        .is_some_and(|count| count >= min_download_count);
    if !passes {
        debug!(
            source_url = %candidate.source_url,
            download_count = ?candidate.download_count,
            min_download_count,
            "Candidate below download threshold"
        );
    }
    passes
}
