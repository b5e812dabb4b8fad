//! # Stepper Motor Demands
//!
//! Step demands are the only thing the transport needs from arm control: one
//! signed step count per motor axis, relative to the previously accepted
//! demand. On the line a demand is rendered as one token per axis, lettered
//! from `A`, so `[50, 100, -25]` becomes `A50,B100,C-25`. Demands in a batch
//! are separated by `;`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Separator between demands in a batch.
pub const BATCH_SEPARATOR: char = ';';

/// Separator between axis tokens in a single demand.
pub const AXIS_SEPARATOR: char = ',';

/// Maximum number of axes a demand can address, one per letter.
pub const MAX_AXES: usize = 26;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Incremental step demands for each motor axis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StepDems {
    /// Signed steps per axis, in axis order. The sign gives the direction.
    pub steps: Vec<i64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when parsing step demands from their line format.
#[derive(Debug, Error, PartialEq)]
pub enum StepDemsParseError {
    #[error("Demand is empty")]
    Empty,

    #[error("Token {0:?} is not a letter followed by a step count")]
    InvalidToken(String),

    #[error("Expected axis {expected} but found axis {found}")]
    OutOfOrder { expected: char, found: char },

    #[error("Demand addresses more than {} axes", MAX_AXES)]
    TooManyAxes,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl StepDems {
    pub fn new(steps: Vec<i64>) -> Self {
        Self { steps }
    }

    /// True if no axis is asked to move.
    pub fn is_zero(&self) -> bool {
        self.steps.iter().all(|s| *s == 0)
    }

    /// Render a batch of demands as a single line.
    pub fn format_batch(batch: &[StepDems]) -> String {
        batch
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(&BATCH_SEPARATOR.to_string())
    }

    /// Parse a batch line back into its demands.
    pub fn parse_batch(line: &str) -> Result<Vec<StepDems>, StepDemsParseError> {
        line.trim()
            .split(BATCH_SEPARATOR)
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for StepDems {
    /// Axes past `Z` cannot be lettered and are not rendered.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, steps) in self.steps.iter().take(MAX_AXES).enumerate() {
            if i > 0 {
                write!(f, "{}", AXIS_SEPARATOR)?;
            }
            write!(f, "{}{}", axis_letter(i), steps)?;
        }
        Ok(())
    }
}

impl FromStr for StepDems {
    type Err = StepDemsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StepDemsParseError::Empty);
        }

        let mut steps = Vec::new();

        for (i, token) in s.split(AXIS_SEPARATOR).map(str::trim).enumerate() {
            if i >= MAX_AXES {
                return Err(StepDemsParseError::TooManyAxes);
            }

            let mut chars = token.chars();
            let letter = match chars.next() {
                Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                _ => return Err(StepDemsParseError::InvalidToken(token.to_string())),
            };

            let expected = axis_letter(i);
            if letter != expected {
                return Err(StepDemsParseError::OutOfOrder {
                    expected,
                    found: letter,
                });
            }

            let count = chars
                .as_str()
                .parse::<i64>()
                .map_err(|_| StepDemsParseError::InvalidToken(token.to_string()))?;
            steps.push(count);
        }

        Ok(Self { steps })
    }
}

fn axis_letter(index: usize) -> char {
    (b'A' + index as u8) as char
}
