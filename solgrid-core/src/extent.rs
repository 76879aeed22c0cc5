//! Validated bounding extents and `BOX(x1 y1, x2 y2)` parsing.
//!
//! An [`Extent`] is the axis-aligned rectangle the grid builder tiles.
//! Construction validates the bounds so downstream stages never see an
//! inverted or non-finite box. Parsing accepts the textual form produced
//! by PostGIS-style stores (`BOX(minx miny, maxx maxy)`).

use std::str::FromStr;

use geo::{Coord, Rect};
use thiserror::Error;

/// Errors returned when constructing or parsing an [`Extent`].
#[derive(Debug, Error, PartialEq)]
pub enum ExtentError {
    /// A bound was NaN or infinite.
    #[error("extent bounds must be finite")]
    NonFinite,
    /// The minimum of an axis was not strictly below its maximum.
    #[error("extent bounds are inverted or empty: ({min_x}, {min_y}, {max_x}, {max_y})")]
    Inverted {
        /// Western bound.
        min_x: f64,
        /// Southern bound.
        min_y: f64,
        /// Eastern bound.
        max_x: f64,
        /// Northern bound.
        max_y: f64,
    },
    /// The textual form did not contain exactly two coordinate pairs.
    #[error("expected BOX(x1 y1, x2 y2), found {found:?}")]
    Malformed {
        /// The offending input.
        found: String,
    },
    /// A coordinate token was not a number.
    #[error("invalid coordinate {token:?} in extent text")]
    InvalidCoordinate {
        /// The token that failed to parse.
        token: String,
    },
}

/// An axis-aligned bounding box in a projected, metre-based reference.
///
/// # Examples
/// ```
/// use solgrid_core::Extent;
///
/// let extent: Extent = "BOX(0 0, 10 10)".parse()?;
/// assert_eq!(extent.width(), 10.0);
/// # Ok::<(), solgrid_core::ExtentError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Extent {
    /// Validate and construct an extent.
    ///
    /// # Errors
    /// Returns [`ExtentError::NonFinite`] when any bound is NaN or infinite
    /// and [`ExtentError::Inverted`] when a minimum is not strictly below
    /// its maximum.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, ExtentError> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(ExtentError::NonFinite);
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(ExtentError::Inverted {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Western bound.
    #[must_use]
    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Southern bound.
    #[must_use]
    pub const fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Eastern bound.
    #[must_use]
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Northern bound.
    #[must_use]
    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Extent width along the x axis.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent height along the y axis.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// The extent as a `geo` rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }

    /// The extent in the textual `BOX(x1 y1, x2 y2)` form.
    #[must_use]
    pub fn to_box_string(&self) -> String {
        format!(
            "BOX({} {}, {} {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl From<Rect<f64>> for Extent {
    fn from(rect: Rect<f64>) -> Self {
        // Rect normalises its corners, so the invariants hold by
        // construction for any non-degenerate rectangle.
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

impl FromStr for Extent {
    type Err = ExtentError;

    /// Parse a `BOX(x1 y1, x2 y2)` string.
    ///
    /// Exactly two comma-separated pairs are required, each pair
    /// whitespace-separated. Any other token count is a parse failure,
    /// never a partial result.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let malformed = || ExtentError::Malformed {
            found: text.to_owned(),
        };
        let inner = trimmed
            .strip_prefix("BOX(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(malformed)?;

        let pairs: Vec<&str> = inner.split(',').collect();
        let [first, second] = *pairs.as_slice() else {
            return Err(malformed());
        };

        let parse_pair = |pair: &str| -> Result<(f64, f64), ExtentError> {
            let tokens: Vec<&str> = pair.split_whitespace().collect();
            let [x, y] = *tokens.as_slice() else {
                return Err(malformed());
            };
            let parse = |token: &str| {
                token
                    .parse::<f64>()
                    .map_err(|_| ExtentError::InvalidCoordinate {
                        token: token.to_owned(),
                    })
            };
            Ok((parse(x)?, parse(y)?))
        };

        let (min_x, min_y) = parse_pair(first)?;
        let (max_x, max_y) = parse_pair(second)?;
        Self::new(min_x, min_y, max_x, max_y)
    }
}
