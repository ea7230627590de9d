//! Raw molecular datasets: one SMILES string and one label vector per example

use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Name of the column holding the SMILES strings in CSV input.
pub const SMILES_COLUMN: &str = "smiles";

/// Identifier columns that are never treated as labels.
const ID_COLUMNS: &[&str] = &["mol_id"];

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawExample {
    pub smiles: String,
    #[serde(alias = "y")]
    pub label: Vec<f64>,
}

impl RawExample {
    pub fn new(smiles: impl Into<String>, label: Vec<f64>) -> Self {
        Self {
            smiles: smiles.into(),
            label,
        }
    }
}

/// An ordered sequence of examples whose labels all share one dimension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    examples: Vec<RawExample>,
    dim: usize,
}

impl Dataset {
    /// Validate `examples` and wrap them. Every SMILES must be non-empty and
    /// every label must have the same length as the first one.
    pub fn new(examples: Vec<RawExample>) -> Result<Self> {
        let dim = examples.first().map_or(0, |e| e.label.len());
        for (index, ex) in examples.iter().enumerate() {
            if ex.smiles.trim().is_empty() {
                return Err(Error::InvalidExample {
                    index,
                    reason: "empty SMILES string".to_owned(),
                });
            }
            if ex.label.len() != dim {
                return Err(Error::LabelDimension {
                    index,
                    expected: dim,
                    found: ex.label.len(),
                });
            }
        }
        Ok(Self { examples, dim })
    }

    /// Load a dataset from `path`, dispatching on the file extension.
    ///
    /// `label_columns` selects the label columns of a CSV file. When it is
    /// `None` every column other than the SMILES and id columns is a label.
    /// It is ignored for JSON input.
    pub fn load(
        path: impl AsRef<Path>,
        label_columns: Option<&[String]>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let examples = match ext.as_str() {
            "json" => load_json(path)?,
            "csv" => load_csv(path, label_columns)?,
            _ => return Err(Error::UnsupportedFormat(path.to_owned())),
        };
        Self::new(examples)
    }

    pub fn examples(&self) -> &[RawExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Dimension of every label vector, 0 for an empty dataset
    pub fn label_dim(&self) -> usize {
        self.dim
    }

    /// The stacked label matrix, one row per example
    pub fn labels(&self) -> impl Iterator<Item = &[f64]> {
        self.examples.iter().map(|e| e.label.as_slice())
    }
}

fn load_json(path: &Path) -> Result<Vec<RawExample>> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut r: Vec<RawExample> = serde_json::from_reader(BufReader::new(f))?;
    for ex in &mut r {
        ex.smiles = ex.smiles.trim().to_owned();
    }
    Ok(r)
}

fn load_csv(
    path: &Path,
    label_columns: Option<&[String]>,
) -> Result<Vec<RawExample>> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = csv::Reader::from_reader(f);
    let headers: Vec<String> =
        reader.headers()?.iter().map(|h| h.trim().to_owned()).collect();

    let smiles_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(SMILES_COLUMN))
        .ok_or_else(|| Error::MissingColumn(SMILES_COLUMN.to_owned()))?;

    let label_idx: Vec<usize> = match label_columns {
        Some(cols) => cols
            .iter()
            .map(|c| {
                headers
                    .iter()
                    .position(|h| h == c)
                    .ok_or_else(|| Error::MissingColumn(c.clone()))
            })
            .collect::<Result<_>>()?,
        None => (0..headers.len())
            .filter(|&i| {
                i != smiles_idx && !ID_COLUMNS.contains(&headers[i].as_str())
            })
            .collect(),
    };

    let mut examples = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let smiles = record.get(smiles_idx).unwrap_or("").trim().to_owned();
        let label = label_idx
            .iter()
            .map(|&i| {
                let cell = record.get(i).unwrap_or("").trim();
                cell.parse::<f64>().map_err(|_| Error::InvalidExample {
                    index,
                    reason: format!(
                        "column '{}': '{cell}' is not a number",
                        headers[i]
                    ),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        examples.push(RawExample { smiles, label });
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_csv_default_columns() {
        let ds = Dataset::load("testfiles/small.csv", None).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.label_dim(), 2);
        assert_eq!(ds.examples()[0], RawExample::new("CC", vec![1.0, 10.0]));
        assert_eq!(ds.examples()[2].smiles, "CCO");
    }

    #[test]
    fn load_csv_selected_columns() {
        let cols = vec!["gap".to_owned()];
        let ds = Dataset::load("testfiles/small.csv", Some(cols.as_slice())).unwrap();
        assert_eq!(ds.label_dim(), 1);
        let labels: Vec<_> = ds.labels().map(|l| l[0]).collect();
        assert_eq!(labels, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn load_csv_missing_column() {
        let cols = vec!["lumo".to_owned()];
        let err = Dataset::load("testfiles/small.csv", Some(cols.as_slice()))
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "lumo"));
    }

    #[test]
    fn load_json() {
        let ds = Dataset::load("testfiles/small.json", None).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.examples()[1].smiles, "invalid!!");
        assert_eq!(ds.examples()[2].label, vec![3.0]);
    }

    #[test]
    fn load_json_trims_smiles() {
        let ds = Dataset::load("testfiles/padded.json", None).unwrap();
        let smiles: Vec<_> = ds.examples().iter().map(|e| e.smiles.as_str()).collect();
        assert_eq!(smiles, vec!["CC", "CCO"]);
    }

    #[test]
    fn missing_files() {
        for path in ["testfiles/nope.csv", "testfiles/nope.json"] {
            let err = Dataset::load(path, None).unwrap_err();
            assert!(matches!(err, Error::Io { .. }), "{path}: {err}");
        }
    }

    #[test]
    fn unsupported_extension() {
        let err = Dataset::load("testfiles/small.txt", None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_ragged_labels() {
        let err = Dataset::new(vec![
            RawExample::new("C", vec![1.0, 2.0]),
            RawExample::new("N", vec![1.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::LabelDimension {
                index: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn rejects_empty_smiles() {
        let err =
            Dataset::new(vec![RawExample::new(" ", vec![1.0])]).unwrap_err();
        assert!(matches!(err, Error::InvalidExample { index: 0, .. }));
    }
}
