//! The preprocessing pipeline: load, normalize, featurize, persist.
//!
//! ```text
//!  .csv / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Dataset  │  smiles + label per example
//!   └──────────┘
//!        │ normalize
//!        ▼
//!   ┌───────────────────┐
//!   │ NormalizedDataset │  standardized labels + Statistics
//!   └───────────────────┘
//!        │ featurize_all
//!        ▼
//!   Vec<MolGraph> + Vec<Skipped>
//!        │ persist
//!        ▼
//!     output.json
//! ```

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::{Config, FeaturizerKind},
    dataset::Dataset,
    error::{Error, Result},
    featurize::{Featurizer, SmilesFeaturizer},
    graph::MolGraph,
    normalize::{normalize, NormalizedDataset, Statistics},
};

/// how many skipped indices to spell out in the summary log line
const SKIP_PREVIEW: usize = 10;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// An example dropped because its SMILES could not be featurized.
#[derive(Clone, Debug, PartialEq)]
pub struct Skipped {
    pub index: usize,
    pub smiles: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Featurized {
    /// graphs in input order, skipped examples left out
    pub graphs: Vec<MolGraph>,
    pub skipped: Vec<Skipped>,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub statistics: Statistics,
    pub processed: usize,
    pub skipped: Vec<Skipped>,
    pub output: PathBuf,
}

impl Report {
    pub fn skipped_indices(&self) -> Vec<usize> {
        self.skipped.iter().map(|s| s.index).collect()
    }
}

pub struct Preprocessor<F> {
    featurizer: F,
    progress: bool,
}

impl<F: Featurizer> Preprocessor<F> {
    pub fn new(featurizer: F) -> Self {
        Self {
            featurizer,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// a bar over `len` examples, or a hidden one if progress is off. The
    /// stderr target draws nothing when stderr is not a terminal
    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        ProgressBar::new(len as u64).with_style(style)
    }

    pub fn normalize(&self, dataset: &Dataset) -> Result<NormalizedDataset> {
        normalize(dataset)
    }

    /// Featurize every example in order. A failure only skips that example,
    /// it never aborts the pass.
    pub fn featurize_all(&self, dataset: &NormalizedDataset) -> Featurized {
        let pb = self.progress_bar(dataset.len());
        let mut ret = Featurized::default();
        for (index, example) in dataset.examples().iter().enumerate() {
            match self.featurizer.featurize(&example.smiles) {
                Ok(graph) => {
                    ret.graphs.push(graph.with_label(example.label.clone()))
                }
                Err(e) => {
                    log::debug!("skipping example {index} ({}): {e}", example.smiles);
                    ret.skipped.push(Skipped {
                        index,
                        smiles: example.smiles.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        ret
    }

    /// Normalize and featurize `dataset` and write the graphs to `output`.
    pub fn process(&self, dataset: &Dataset, output: &Path) -> Result<Report> {
        let normalized = self.normalize(dataset)?;
        let Featurized { graphs, skipped } = self.featurize_all(&normalized);
        persist(output, &graphs)?;

        log::info!(
            "wrote {} graphs to {}",
            graphs.len(),
            output.display()
        );
        if !skipped.is_empty() {
            let preview: Vec<_> =
                skipped.iter().take(SKIP_PREVIEW).map(|s| s.index).collect();
            let more = if skipped.len() > SKIP_PREVIEW { ", ..." } else { "" };
            log::warn!(
                "skipped {} of {} examples: {preview:?}{more}",
                skipped.len(),
                dataset.len()
            );
        }

        Ok(Report {
            statistics: normalized.stats,
            processed: graphs.len(),
            skipped,
            output: output.to_owned(),
        })
    }
}

/// Write `graphs` to `path` as a single JSON array, replacing whatever was
/// there before.
pub fn persist(path: impl AsRef<Path>, graphs: &[MolGraph]) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, graphs)?;
    w.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Read back a file written by [persist].
pub fn load_processed(path: impl AsRef<Path>) -> Result<Vec<MolGraph>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let r = serde_json::from_reader(BufReader::new(f))?;
    Ok(r)
}

fn featurizer(kind: FeaturizerKind) -> Result<Box<dyn Featurizer>> {
    match kind {
        FeaturizerKind::Native => Ok(Box::new(SmilesFeaturizer)),
        #[cfg(feature = "rdkit")]
        FeaturizerKind::Rdkit => Ok(Box::new(crate::rdkit::RdkitFeaturizer::new()?)),
        #[cfg(not(feature = "rdkit"))]
        FeaturizerKind::Rdkit => Err(Error::FeaturizerUnavailable("rdkit".to_owned())),
    }
}

/// Run the whole pipeline described by `config`.
pub fn run(config: &Config) -> Result<Report> {
    log::info!("loading {}", config.input.display());
    let dataset = Dataset::load(&config.input, config.label_columns.as_deref())?;
    log::info!(
        "loaded {} examples with {} label dimensions",
        dataset.len(),
        dataset.label_dim()
    );
    Preprocessor::new(featurizer(config.featurizer)?)
        .with_progress(config.progress)
        .process(&dataset, &config.output)
}
