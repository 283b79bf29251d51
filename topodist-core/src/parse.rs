//! Decoding of textual distance descriptions.
//!
//! A description lists raw indexes, a colon, then either every value of the
//! row-major matrix or a grouping shorthand:
//!
//! - `0,1,2,3:10,20,40,40,20,10,40,40,40,40,10,20,40,40,20,10`
//! - `0,1,2,3:2*2` (2 groups of 2)
//! - `0,1,2,3,4,5,6,7:2*2*2` (2 groups of 2 groups of 2)
//!
//! For `X*Y*Z` the synthesized matrix holds 1 on the diagonal, 2 inside an
//! innermost group of `Z` objects, 4 inside a middle group of `Y*Z` objects
//! and 8 elsewhere. `Z` defaults to 1.

use tracing::{debug, instrument, warn};

use crate::{
    DistanceError, DistanceStore, ObjType, config::DistancesConfig, error::Diagnostic,
};

/// Index list and row-major matrix decoded from a description.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedDistances {
    /// Raw indexes in matrix order.
    pub indexes: Vec<u32>,
    /// Row-major `indexes.len()²` distances.
    pub distances: Vec<f32>,
}

/// Decodes a distance description.
///
/// # Errors
/// Returns [`DistanceError::MissingColon`], [`DistanceError::InvalidIndex`],
/// [`DistanceError::InvalidGrouping`], [`DistanceError::NotEnoughValues`] or
/// [`DistanceError::InvalidValue`] when the description is malformed.
///
/// # Examples
/// ```
/// use topodist_core::parse_distances;
///
/// let parsed = parse_distances("0,1,2,3:2*2")?;
/// assert_eq!(parsed.indexes, vec![0, 1, 2, 3]);
/// assert_eq!(&parsed.distances[..4], &[1.0, 4.0, 8.0, 8.0]);
/// # Ok::<(), topodist_core::DistanceError>(())
/// ```
pub fn parse_distances(description: &str) -> Result<ParsedDistances, DistanceError> {
    let (index_list, body) = description
        .split_once(':')
        .ok_or(DistanceError::MissingColon)?;
    let indexes = parse_indexes(index_list)?;
    let distances = match parse_grouping(body) {
        Some(grouping) => grouping_matrix(indexes.len(), grouping?)?,
        None => parse_values(indexes.len(), body)?,
    };
    Ok(ParsedDistances { indexes, distances })
}

fn parse_indexes(list: &str) -> Result<Vec<u32>, DistanceError> {
    list.split(',')
        .map(|token| {
            parse_index(token.trim()).ok_or_else(|| DistanceError::InvalidIndex {
                token: token.to_owned(),
            })
        })
        .collect()
}

/// Reads a decimal, `0x`-prefixed hexadecimal or `0`-prefixed octal index.
fn parse_index(token: &str) -> Option<u32> {
    let (digits, radix) = if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(octal) = token.strip_prefix('0').filter(|rest| !rest.is_empty()) {
        (octal, 8)
    } else {
        (token, 10)
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

/// `(x, y, z)` factors of a grouping shorthand.
type Grouping = (u32, u32, u32);

/// Recognises `X*Y` and `X*Y*Z`. Returns `None` when `body` is a value list.
fn parse_grouping(body: &str) -> Option<Result<Grouping, DistanceError>> {
    if !body.contains('*') {
        return None;
    }
    let factors: Result<Vec<u32>, _> = body
        .split('*')
        .map(|token| {
            token
                .trim()
                .parse::<u32>()
                .map_err(|_| DistanceError::InvalidValue {
                    position: 0,
                    token: token.to_owned(),
                })
        })
        .collect();
    Some(factors.and_then(|factors| match factors[..] {
        [x, y] => Ok((x, y, 1)),
        [x, y, z] => Ok((x, y, z)),
        _ => Err(DistanceError::InvalidValue {
            position: 0,
            token: body.to_owned(),
        }),
    }))
}

fn grouping_matrix(nbobjs: usize, (x, y, z): Grouping) -> Result<Vec<f32>, DistanceError> {
    let product = u64::from(x)
        .saturating_mul(u64::from(y))
        .saturating_mul(u64::from(z));
    if usize::try_from(product).ok() != Some(nbobjs) {
        return Err(DistanceError::InvalidGrouping {
            x,
            y,
            z,
            product,
            expected: nbobjs,
        });
    }
    let inner = z as usize;
    let middle = inner * y as usize;
    let mut distances = Vec::with_capacity(nbobjs * nbobjs);
    for i in 0..nbobjs {
        for j in 0..nbobjs {
            let value = if i == j {
                1.0
            } else if i / inner == j / inner {
                2.0
            } else if i / middle == j / middle {
                4.0
            } else {
                8.0
            };
            distances.push(value);
        }
    }
    Ok(distances)
}

fn parse_values(nbobjs: usize, body: &str) -> Result<Vec<f32>, DistanceError> {
    let expected = nbobjs * nbobjs;
    let tokens: Vec<&str> = body.split(',').collect();
    if tokens.len() < expected {
        return Err(DistanceError::NotEnoughValues {
            found: tokens.len(),
            expected,
        });
    }
    if tokens.len() > expected {
        debug!(
            surplus = tokens.len() - expected,
            "ignoring values beyond the matrix size"
        );
    }
    tokens
        .iter()
        .take(expected)
        .enumerate()
        .map(|(position, token)| match token.trim().parse::<f32>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
            _ => Err(DistanceError::InvalidValue {
                position,
                token: (*token).to_owned(),
            }),
        })
        .collect()
}

/// Parses the description of `obj_type` and stores the result.
///
/// # Errors
/// Returns any parse failure, or the [`DistanceError`] raised by
/// [`DistanceStore::set_matrix_owned`]. The store is unchanged on failure.
pub fn store_distances_from_string(
    store: &mut DistanceStore,
    obj_type: ObjType,
    description: &str,
) -> Result<(), DistanceError> {
    let ParsedDistances { indexes, distances } = parse_distances(description)?;
    store.set_matrix_owned(obj_type, indexes, distances)
}

/// Stores every description held by `config`, in type order.
///
/// Each malformed description is skipped with a warning and returned as a
/// [`Diagnostic`]; the others are still stored.
#[instrument(name = "distances.store_from_config", skip_all, fields(types = config.descriptions().count()))]
pub fn store_from_config(store: &mut DistanceStore, config: &DistancesConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (obj_type, description) in config.descriptions() {
        if let Err(error) = store_distances_from_string(store, obj_type, description) {
            warn!(obj_type = %obj_type, code = %error.code(), %error, "ignoring distances from configuration");
            diagnostics.push(Diagnostic::new(obj_type, error));
        }
    }
    diagnostics
}
