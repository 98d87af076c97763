// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Time-frequency domains and the evaluation grids ("cells") laid over them.
//!
//! A [`Domain`] is an axis-aligned box in (frequency, time). It describes both
//! the extent of an evaluation request and the validity region of a stored
//! polynomial; in the latter case, coordinates are scaled into [-1, 1] before
//! the polynomial is evaluated to keep high-order terms bounded.
//!
//! [`Cells`] discretise a domain. Each axis is a sequence of regularly-spaced
//! segments; many evaluators only care about the number of cells, but some
//! (e.g. the point-source DFT) require a single regular frequency segment.

mod error;
#[cfg(test)]
mod tests;

pub use error::DomainError;

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use vec1::Vec1;

/// Which axis of the time-frequency plane something refers to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum AxisKind {
    #[strum(serialize = "frequency")]
    Freq,
    Time,
}

/// An axis-aligned box in (frequency \[Hz\], time \[s\]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainRecord", into = "DomainRecord")]
pub struct Domain {
    start_freq: f64,
    end_freq: f64,
    start_time: f64,
    end_time: f64,
}

impl Domain {
    /// Create a new `Domain`. Each axis must have `start <= end`.
    pub fn new(
        start_freq: f64,
        end_freq: f64,
        start_time: f64,
        end_time: f64,
    ) -> Result<Domain, DomainError> {
        for (axis, start, end) in [
            (AxisKind::Freq, start_freq, end_freq),
            (AxisKind::Time, start_time, end_time),
        ] {
            if !start.is_finite() || !end.is_finite() || start > end {
                return Err(DomainError::InvalidDomain { axis, start, end });
            }
        }

        Ok(Domain {
            start_freq,
            end_freq,
            start_time,
            end_time,
        })
    }

    pub fn start_freq(&self) -> f64 {
        self.start_freq
    }

    pub fn end_freq(&self) -> f64 {
        self.end_freq
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn centre_freq(&self) -> f64 {
        0.5 * (self.start_freq + self.end_freq)
    }

    pub fn width_freq(&self) -> f64 {
        self.end_freq - self.start_freq
    }

    pub fn centre_time(&self) -> f64 {
        0.5 * (self.start_time + self.end_time)
    }

    pub fn width_time(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Is the (frequency, time) point inside this domain? Both edges are
    /// inclusive.
    pub fn contains(&self, freq: f64, time: f64) -> bool {
        (self.start_freq..=self.end_freq).contains(&freq)
            && (self.start_time..=self.end_time).contains(&time)
    }

    /// Do the two domains share any area (or edge)?
    pub fn overlaps(&self, other: &Domain) -> bool {
        self.start_freq <= other.end_freq
            && other.start_freq <= self.end_freq
            && self.start_time <= other.end_time
            && other.start_time <= self.end_time
    }

    /// The smallest domain containing both `self` and `other`.
    pub fn union(&self, other: &Domain) -> Domain {
        Domain {
            start_freq: self.start_freq.min(other.start_freq),
            end_freq: self.end_freq.max(other.end_freq),
            start_time: self.start_time.min(other.start_time),
            end_time: self.end_time.max(other.end_time),
        }
    }

    /// Scale a frequency into this domain's [-1, 1] coordinates.
    pub fn scale_freq(&self, freq: f64) -> Result<f64, DomainError> {
        let width = self.width_freq();
        if width == 0.0 {
            return Err(DomainError::Degenerate {
                axis: AxisKind::Freq,
                start: self.start_freq,
                end: self.end_freq,
            });
        }
        Ok(2.0 * (freq - self.centre_freq()) / width)
    }

    /// Scale a time into this domain's [-1, 1] coordinates.
    pub fn scale_time(&self, time: f64) -> Result<f64, DomainError> {
        let width = self.width_time();
        if width == 0.0 {
            return Err(DomainError::Degenerate {
                axis: AxisKind::Time,
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(2.0 * (time - self.centre_time()) / width)
    }

    /// Scale a (frequency, time) point into this domain's [-1, 1]^2
    /// coordinates. Points outside the domain scale outside of [-1, 1].
    pub fn scale(&self, freq: f64, time: f64) -> Result<(f64, f64), DomainError> {
        Ok((self.scale_freq(freq)?, self.scale_time(time)?))
    }

    /// Fail if either axis has zero width.
    pub fn check_scalable(&self) -> Result<(), DomainError> {
        self.scale(self.start_freq, self.start_time).map(|_| ())
    }
}

/// The serialised form of a [`Domain`]; deserialising goes through
/// [`Domain::new`] so that invalid domains can't be read in.
#[derive(Serialize, Deserialize)]
struct DomainRecord {
    freq: [f64; 2],
    time: [f64; 2],
}

impl TryFrom<DomainRecord> for Domain {
    type Error = DomainError;

    fn try_from(r: DomainRecord) -> Result<Self, Self::Error> {
        Domain::new(r.freq[0], r.freq[1], r.time[0], r.time[1])
    }
}

impl From<Domain> for DomainRecord {
    fn from(d: Domain) -> Self {
        DomainRecord {
            freq: [d.start_freq, d.end_freq],
            time: [d.start_time, d.end_time],
        }
    }
}

/// A run of regularly-spaced cells along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSegment {
    /// The lower edge of the first cell.
    pub start: f64,
    /// The width of every cell in this segment.
    pub width: f64,
    pub num_cells: usize,
}

impl AxisSegment {
    pub fn end(&self) -> f64 {
        self.start + self.width * self.num_cells as f64
    }

    pub fn centre(&self) -> f64 {
        0.5 * (self.start + self.end())
    }

    /// The total width covered by this segment.
    pub fn total_width(&self) -> f64 {
        self.width * self.num_cells as f64
    }

    /// The centres of each of the cells in this segment.
    pub fn cell_centres(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.num_cells).map(move |i| self.start + (i as f64 + 0.5) * self.width)
    }
}

/// One axis of an evaluation grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    kind: AxisKind,
    segments: Vec1<AxisSegment>,
}

impl Axis {
    pub fn new(kind: AxisKind, segments: Vec1<AxisSegment>) -> Result<Axis, DomainError> {
        let mut prev_end: Option<f64> = None;
        for (index, seg) in segments.iter().enumerate() {
            if !(seg.width.is_finite() && seg.width > 0.0) || seg.num_cells == 0 {
                return Err(DomainError::InvalidSegment {
                    axis: kind,
                    width: seg.width,
                    num_cells: seg.num_cells,
                });
            }
            if let Some(prev_end) = prev_end {
                let tol = 1e-9 * prev_end.abs().max(1.0);
                if (seg.start - prev_end).abs() > tol {
                    return Err(DomainError::NonContiguousSegments {
                        axis: kind,
                        index,
                        start: seg.start,
                        prev_end,
                    });
                }
            }
            prev_end = Some(seg.end());
        }

        Ok(Axis { kind, segments })
    }

    /// An axis with a single regular segment covering `start` to `end`.
    pub fn regular(
        kind: AxisKind,
        start: f64,
        end: f64,
        num_cells: usize,
    ) -> Result<Axis, DomainError> {
        let width = if num_cells == 0 {
            0.0
        } else {
            (end - start) / num_cells as f64
        };
        Axis::new(
            kind,
            vec1::vec1![AxisSegment {
                start,
                width,
                num_cells
            }],
        )
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn segments(&self) -> &[AxisSegment] {
        &self.segments
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn num_cells(&self) -> usize {
        self.segments.iter().map(|s| s.num_cells).sum()
    }

    pub fn start(&self) -> f64 {
        self.segments.first().start
    }

    pub fn end(&self) -> f64 {
        self.segments.last().end()
    }

    pub fn centres(&self) -> Vec<f64> {
        self.segments.iter().flat_map(|s| s.cell_centres()).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.segments
            .iter()
            .flat_map(|s| std::iter::repeat(s.width).take(s.num_cells))
            .collect()
    }
}

/// The discretised evaluation grid of a request. Values over cells are stored
/// with shape `(nx, ny)`, i.e. frequency first.
#[derive(Debug, Clone, PartialEq)]
pub struct Cells {
    freq: Axis,
    time: Axis,
}

impl Cells {
    pub fn new(freq: Axis, time: Axis) -> Cells {
        Cells { freq, time }
    }

    /// A grid with `nx` regular frequency cells and `ny` regular time cells
    /// spanning `domain`.
    pub fn regular(domain: &Domain, nx: usize, ny: usize) -> Result<Cells, DomainError> {
        Ok(Cells {
            freq: Axis::regular(AxisKind::Freq, domain.start_freq, domain.end_freq, nx)?,
            time: Axis::regular(AxisKind::Time, domain.start_time, domain.end_time, ny)?,
        })
    }

    pub fn freq_axis(&self) -> &Axis {
        &self.freq
    }

    pub fn time_axis(&self) -> &Axis {
        &self.time
    }

    pub fn num_freq_segments(&self) -> usize {
        self.freq.num_segments()
    }

    pub fn num_time_segments(&self) -> usize {
        self.time.num_segments()
    }

    /// The number of frequency cells.
    pub fn nx(&self) -> usize {
        self.freq.num_cells()
    }

    /// The number of time cells.
    pub fn ny(&self) -> usize {
        self.time.num_cells()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx(), self.ny())
    }

    pub fn freq_centres(&self) -> Vec<f64> {
        self.freq.centres()
    }

    pub fn time_centres(&self) -> Vec<f64> {
        self.time.centres()
    }

    pub fn freq_widths(&self) -> Vec<f64> {
        self.freq.widths()
    }

    /// The bounding box of the grid.
    pub fn domain(&self) -> Domain {
        Domain {
            start_freq: self.freq.start(),
            end_freq: self.freq.end(),
            start_time: self.time.start(),
            end_time: self.time.end(),
        }
    }
}
