//! Plain CSV matrices: one sample per line, comma separated. Whether the
//! first line is a header is always stated by the caller.

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use faer::{Mat, MatRef};

use crate::error::{LayerError, LayerResult};

pub fn write_csv(path: impl AsRef<Path>, header: &[String], rows: MatRef<'_, f64>) -> LayerResult<()> {
    let path = path.as_ref();
    let mut w = WriterBuilder::new()
        .from_path(path)
        .map_err(|err| csv_error(path, err))?;
    if !header.is_empty() {
        w.write_record(header).map_err(|err| csv_error(path, err))?;
    }
    for i in 0..rows.nrows() {
        w.write_record((0..rows.ncols()).map(|j| rows.read(i, j).to_string()))
            .map_err(|err| csv_error(path, err))?;
    }
    w.flush()?;
    Ok(())
}

/// Column names for an embedding matrix: `n_0 … n_{N−1}` then `c_i_j`.
pub fn embedding_header(n_atoms: usize, dim: usize) -> Vec<String> {
    let mut out: Vec<String> = (0..n_atoms.min(dim)).map(|i| format!("n_{}", i)).collect();
    'pairs: for i in 0..n_atoms {
        for j in i + 1..n_atoms {
            if out.len() == dim {
                break 'pairs;
            }
            out.push(format!("c_{}_{}", i, j));
        }
    }
    out
}

/// Read a numeric CSV into a samples × features matrix.
///
/// With `has_headers` the first record is skipped whatever it contains,
/// numeric column names included. Every row must have the same width.
pub fn read_csv(path: impl AsRef<Path>, has_headers: bool) -> LayerResult<Mat<f64>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|err| csv_error(path, err))?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| csv_error(path, err))?;
        rows.push(parse_record(path, &record)?);
    }

    let ncols = rows.first().map_or(0, Vec::len);
    Ok(Mat::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

fn parse_record(path: &Path, record: &StringRecord) -> LayerResult<Vec<f64>> {
    record
        .iter()
        .enumerate()
        .map(|(col, field)| {
            field.parse::<f64>().map_err(|err| LayerError::Csv {
                path: path.display().to_string(),
                line: record.position().map_or(0, |p| p.line() as usize),
                message: format!("column {}: {:?} is not a number ({})", col + 1, field, err),
            })
        })
        .collect()
}

fn csv_error(path: &Path, err: csv::Error) -> LayerError {
    if err.is_io_error() {
        return LayerError::Io(io::Error::from(err));
    }
    LayerError::Csv {
        path: path.display().to_string(),
        line: err.position().map_or(0, |p| p.line() as usize),
        message: err.to_string(),
    }
}
