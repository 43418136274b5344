//! Index patterns: how a loop iteration counter maps to an array offset.
//!
//! Every pattern is tied to one index declaration node. Patterns are
//! immutable once constructed and live in an [`IndexPatternTable`] that
//! nodes reference by [`PatternId`].

use std::collections::BTreeMap;

use crate::NodeId;

/// Position of a pattern inside an [`IndexPatternTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct PatternId(u32);

impl PatternId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// `y = (x - x_offset) / dx * dy + b` with integer division.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearPattern {
    pub x_offset: i64,
    pub dy: i64,
    pub dx: i64,
    pub b: i64,
}

impl LinearPattern {
    /// Real-valued slope `dy / dx`.
    #[allow(clippy::cast_precision_loss)]
    pub fn slope(&self) -> f64 {
        self.dy as f64 / self.dx as f64
    }

    /// Real-valued intercept of the line through the pattern.
    #[allow(clippy::cast_precision_loss)]
    pub fn intercept(&self) -> f64 {
        self.b as f64 - self.x_offset as f64 * self.slope()
    }

    fn evaluate(&self, x: i64) -> Option<i64> {
        if self.dx == 0 {
            return None;
        }
        Some((x - self.x_offset) / self.dx * self.dy + self.b)
    }
}

/// `y = x / a + b`, used when the slope is not an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Linear2Pattern {
    /// `1 / slope`.
    pub inverse_slope: i64,
    pub intercept: i64,
}

/// Explicit lookup table, rendered as a named index array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomPattern {
    pub name: String,
    pub values: BTreeMap<usize, usize>,
}

/// Mapping strategy of an index pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexStrategy {
    /// `y = x`
    Plain,
    Linear(LinearPattern),
    Linear2(Linear2Pattern),
    /// Different strategies over consecutive ranges of `x`, keyed by the
    /// first counter value of each section.
    Sectioned(BTreeMap<usize, IndexStrategy>),
    Random(RandomPattern),
}

impl IndexStrategy {
    /// Offset produced for counter value `x`.
    pub fn evaluate(&self, x: usize) -> Option<i64> {
        let xi = i64::try_from(x).ok()?;
        match self {
            IndexStrategy::Plain => Some(xi),
            IndexStrategy::Linear(linear) => linear.evaluate(xi),
            IndexStrategy::Linear2(linear) => {
                if linear.inverse_slope == 0 {
                    return None;
                }
                Some(xi / linear.inverse_slope + linear.intercept)
            }
            IndexStrategy::Sectioned(sections) => {
                let (_, section) = sections.range(..=x).next_back()?;
                section.evaluate(x)
            }
            IndexStrategy::Random(random) => {
                random.values.get(&x).and_then(|&y| i64::try_from(y).ok())
            }
        }
    }
}

/// A strategy bound to the index it is evaluated over.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexPattern {
    index: NodeId,
    strategy: IndexStrategy,
}

impl IndexPattern {
    pub fn new(index: NodeId, strategy: IndexStrategy) -> Self {
        Self { index, strategy }
    }

    pub fn plain(index: NodeId) -> Self {
        Self::new(index, IndexStrategy::Plain)
    }

    pub fn linear(index: NodeId, x_offset: i64, dy: i64, dx: i64, b: i64) -> Self {
        Self::new(
            index,
            IndexStrategy::Linear(LinearPattern {
                x_offset,
                dy,
                dx,
                b,
            }),
        )
    }

    pub fn linear2(index: NodeId, inverse_slope: i64, intercept: i64) -> Self {
        Self::new(
            index,
            IndexStrategy::Linear2(Linear2Pattern {
                inverse_slope,
                intercept,
            }),
        )
    }

    pub fn sectioned(index: NodeId, sections: BTreeMap<usize, IndexStrategy>) -> Self {
        Self::new(index, IndexStrategy::Sectioned(sections))
    }

    pub fn random(index: NodeId, name: impl Into<String>, values: BTreeMap<usize, usize>) -> Self {
        Self::new(
            index,
            IndexStrategy::Random(RandomPattern {
                name: name.into(),
                values,
            }),
        )
    }

    /// The index declaration this pattern is evaluated over.
    #[inline]
    pub fn index(&self) -> NodeId {
        self.index
    }

    #[inline]
    pub fn strategy(&self) -> &IndexStrategy {
        &self.strategy
    }

    /// Offset produced for counter value `x`.
    pub fn evaluate(&self, x: usize) -> Option<i64> {
        self.strategy.evaluate(x)
    }
}

/// The set of patterns referenced by loop-indexed nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexPatternTable {
    patterns: Vec<IndexPattern>,
}

impl IndexPatternTable {
    pub const fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn add(&mut self, pattern: IndexPattern) -> PatternId {
        let id = PatternId::new(self.patterns.len() as u32);
        self.patterns.push(pattern);
        id
    }

    #[inline]
    pub fn get(&self, id: PatternId) -> Option<&IndexPattern> {
        self.patterns.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &IndexPattern)> {
        self.patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (PatternId::new(i as u32), p))
    }
}
