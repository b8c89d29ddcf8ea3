use thiserror::Error;

use crate::field::{parse_int, parse_text, parse_value, DefaultPolicy, FieldType, MetricValue};
use crate::raw_row::{RawRow, NAME_COLUMN, POSITION_COLUMN, SEASON_COLUMN, TEAM_COLUMN};
use crate::{PlayerCandidate, StatRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowMappingError {
    #[error("required column {column} is missing")]
    MissingField { column: &'static str },

    #[error("column {column} holds {found}, expected {expected:?}")]
    Malformed {
        column: &'static str,
        expected: FieldType,
        found: String,
    },
}

/// A typed record with player_id still unset, plus the identity fields it
/// needs resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow<R> {
    pub record: R,
    pub identity: PlayerCandidate,
}

/// Maps one raw row into `R` by walking `R::FIELDS`.
///
/// `Season` and `Name` are mandatory. Every mapped field follows its declared
/// policy: absent values become `None` or, for `Required` fields, fail the
/// row. Present but unreadable values always fail the row.
pub fn normalize<R: StatRecord>(row: &RawRow) -> Result<NormalizedRow<R>, RowMappingError> {
    let year = read_season(row)?;
    let name = read_text(row, NAME_COLUMN)?.ok_or(RowMappingError::MissingField {
        column: NAME_COLUMN,
    })?;
    let identity = PlayerCandidate {
        name,
        team: read_text(row, TEAM_COLUMN)?,
        position: read_text(row, POSITION_COLUMN)?,
    };

    let mut record = R::new(0, year);
    for spec in R::FIELDS {
        let value = match row.get(spec.column) {
            Some(raw) => parse_value(spec.ty, raw).map_err(|failure| RowMappingError::Malformed {
                column: spec.column,
                expected: failure.expected,
                found: failure.found,
            })?,
            None => MetricValue::null(spec.ty),
        };
        if value.is_null() && spec.policy == DefaultPolicy::Required {
            return Err(RowMappingError::MissingField {
                column: spec.column,
            });
        }
        record.set_metric(spec.field, value);
    }

    Ok(NormalizedRow { record, identity })
}

fn read_season(row: &RawRow) -> Result<i32, RowMappingError> {
    let raw = row.get(SEASON_COLUMN).ok_or(RowMappingError::MissingField {
        column: SEASON_COLUMN,
    })?;
    let malformed = || RowMappingError::Malformed {
        column: SEASON_COLUMN,
        expected: FieldType::Int,
        found: raw.to_string(),
    };
    let season = parse_int(raw)
        .map_err(|_| malformed())?
        .ok_or(RowMappingError::MissingField {
            column: SEASON_COLUMN,
        })?;
    i32::try_from(season).map_err(|_| malformed())
}

fn read_text(row: &RawRow, column: &'static str) -> Result<Option<String>, RowMappingError> {
    match row.get(column) {
        Some(raw) => parse_text(raw).map_err(|failure| RowMappingError::Malformed {
            column,
            expected: failure.expected,
            found: failure.found,
        }),
        None => Ok(None),
    }
}
