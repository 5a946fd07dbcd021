//! X3D vector attribute parsing (MFVec2f / MFVec3f / MFInt32)

use crate::error::ExportError;

/// Parse a whitespace/comma separated number list into `N`-tuples.
///
/// The token count must be a multiple of `N`.
pub fn parse_vector<const N: usize>(text: &str) -> Result<Vec<[f64; N]>, ExportError> {
    let values = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<f64>().map_err(|_| ExportError::Parse {
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() % N != 0 {
        return Err(ExportError::Shape {
            count: values.len(),
            dimension: N,
        });
    }

    Ok(values
        .chunks_exact(N)
        .map(|chunk| {
            let mut tuple = [0.0; N];
            tuple.copy_from_slice(chunk);
            tuple
        })
        .collect())
}

pub fn parse_mfvec2f(text: &str) -> Result<Vec<[f64; 2]>, ExportError> {
    parse_vector::<2>(text)
}

pub fn parse_mfvec3f(text: &str) -> Result<Vec<[f64; 3]>, ExportError> {
    parse_vector::<3>(text)
}

/// Parse a whitespace separated list of non-negative integers
pub fn parse_index_list(text: &str) -> Result<Vec<u32>, ExportError> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<u32>().map_err(|_| ExportError::Parse {
                token: token.to_string(),
            })
        })
        .collect()
}
