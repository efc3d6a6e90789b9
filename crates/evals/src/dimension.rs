//! Scoring dimensions and rubric scores
//!
//! The SPIN rubric rates every transcript on a fixed, ordered set of seven
//! dimensions, each with an integer score from 1 to 5.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Lowest rubric score
pub const MIN_SCORE: u8 = 1;
/// Highest rubric score
pub const MAX_SCORE: u8 = 5;

/// One rubric dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Situation,
    Problem,
    Implication,
    NeedPayoff,
    Flow,
    Tone,
    Engagement,
}

impl Dimension {
    /// All dimensions in canonical order
    pub const ALL: [Dimension; 7] = [
        Dimension::Situation,
        Dimension::Problem,
        Dimension::Implication,
        Dimension::NeedPayoff,
        Dimension::Flow,
        Dimension::Tone,
        Dimension::Engagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Situation => "situation",
            Dimension::Problem => "problem",
            Dimension::Implication => "implication",
            Dimension::NeedPayoff => "need_payoff",
            Dimension::Flow => "flow",
            Dimension::Tone => "tone",
            Dimension::Engagement => "engagement",
        }
    }

    /// Dataset column holding the ground-truth score for this dimension
    pub fn column(&self) -> String {
        format!("score_{}", self.as_str())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == name)
            .ok_or_else(|| EvalError::invalid(format!("unknown dimension: {}", s.trim())))
    }
}

/// Ordered, duplicate-free set of dimensions to evaluate
///
/// Passed explicitly to the aggregator and pipeline so a run can be
/// narrowed to a subset of the rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Dimension>", into = "Vec<Dimension>")]
pub struct DimensionSet {
    dimensions: Vec<Dimension>,
}

impl DimensionSet {
    /// Build a set, keeping first-seen order and dropping repeats
    pub fn new(dimensions: impl IntoIterator<Item = Dimension>) -> Result<Self> {
        let mut unique = Vec::new();
        for dim in dimensions {
            if !unique.contains(&dim) {
                unique.push(dim);
            }
        }
        if unique.is_empty() {
            return Err(EvalError::invalid("dimension set must not be empty"));
        }
        Ok(Self { dimensions: unique })
    }

    /// The full seven-dimension SPIN rubric
    pub fn spin() -> Self {
        Self {
            dimensions: Dimension::ALL.to_vec(),
        }
    }

    /// Parse a comma-separated list such as `situation,problem`
    pub fn parse_list(list: &str) -> Result<Self> {
        let dims = list
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Dimension::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(dims)
    }

    pub fn iter(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.dimensions.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn contains(&self, dimension: Dimension) -> bool {
        self.dimensions.contains(&dimension)
    }

    pub fn as_slice(&self) -> &[Dimension] {
        &self.dimensions
    }
}

impl Default for DimensionSet {
    fn default() -> Self {
        Self::spin()
    }
}

impl TryFrom<Vec<Dimension>> for DimensionSet {
    type Error = EvalError;

    fn try_from(dimensions: Vec<Dimension>) -> Result<Self> {
        Self::new(dimensions)
    }
}

impl From<DimensionSet> for Vec<Dimension> {
    fn from(set: DimensionSet) -> Self {
        set.dimensions
    }
}

/// A rubric score, guaranteed to lie in `[1, 5]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub fn new(value: i64) -> Result<Self> {
        if (MIN_SCORE as i64..=MAX_SCORE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(EvalError::invalid(format!(
                "score must be in range [{}, {}], got {}",
                MIN_SCORE, MAX_SCORE, value
            )))
        }
    }

    pub fn value(&self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i64> for Score {
    type Error = EvalError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One score per rubric dimension
///
/// Every field is required, so a card that deserializes is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub situation: Score,
    pub problem: Score,
    pub implication: Score,
    pub need_payoff: Score,
    pub flow: Score,
    pub tone: Score,
    pub engagement: Score,
}

impl ScoreCard {
    /// Build a card by asking `f` for each dimension in canonical order
    pub fn try_from_fn<F>(mut f: F) -> Result<Self>
    where
        F: FnMut(Dimension) -> Result<Score>,
    {
        Ok(Self {
            situation: f(Dimension::Situation)?,
            problem: f(Dimension::Problem)?,
            implication: f(Dimension::Implication)?,
            need_payoff: f(Dimension::NeedPayoff)?,
            flow: f(Dimension::Flow)?,
            tone: f(Dimension::Tone)?,
            engagement: f(Dimension::Engagement)?,
        })
    }

    /// Same score on every dimension
    pub fn uniform(score: Score) -> Self {
        Self {
            situation: score,
            problem: score,
            implication: score,
            need_payoff: score,
            flow: score,
            tone: score,
            engagement: score,
        }
    }

    pub fn get(&self, dimension: Dimension) -> Score {
        match dimension {
            Dimension::Situation => self.situation,
            Dimension::Problem => self.problem,
            Dimension::Implication => self.implication,
            Dimension::NeedPayoff => self.need_payoff,
            Dimension::Flow => self.flow,
            Dimension::Tone => self.tone,
            Dimension::Engagement => self.engagement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_names_round_trip() {
        for dim in Dimension::ALL {
            assert_eq!(dim.as_str().parse::<Dimension>().unwrap(), dim);
        }
        assert_eq!(Dimension::NeedPayoff.column(), "score_need_payoff");
        assert_eq!(" Tone ".parse::<Dimension>().unwrap(), Dimension::Tone);
        assert!("rapport".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_dimension_serde_uses_snake_case() {
        let json = serde_json::to_string(&Dimension::NeedPayoff).unwrap();
        assert_eq!(json, "\"need_payoff\"");
    }

    #[test]
    fn test_dimension_set_dedups_and_keeps_order() {
        let set = DimensionSet::parse_list("tone, situation,tone").unwrap();
        assert_eq!(set.as_slice(), &[Dimension::Tone, Dimension::Situation]);
        assert!(set.contains(Dimension::Situation));
        assert!(!set.contains(Dimension::Flow));
    }

    #[test]
    fn test_dimension_set_rejects_empty() {
        assert!(matches!(
            DimensionSet::new(Vec::new()),
            Err(EvalError::InvalidInput(_))
        ));
        assert!(DimensionSet::parse_list(" , ").is_err());
        assert!(serde_json::from_str::<DimensionSet>("[]").is_err());
    }

    #[test]
    fn test_spin_set_has_all_seven() {
        let set = DimensionSet::default();
        assert_eq!(set.len(), 7);
        assert_eq!(set.as_slice(), &Dimension::ALL);
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(Score::new(1).unwrap().value(), 1);
        assert_eq!(Score::new(5).unwrap().value(), 5);
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
        assert!(serde_json::from_str::<Score>("7").is_err());
    }

    #[test]
    fn test_score_card_requires_every_dimension() {
        let complete = r#"{"situation":4,"problem":3,"implication":4,"need_payoff":3,"flow":4,"tone":4,"engagement":3}"#;
        let card: ScoreCard = serde_json::from_str(complete).unwrap();
        assert_eq!(card.get(Dimension::Engagement).value(), 3);
        assert_eq!(card.get(Dimension::Situation).value(), 4);

        let missing = r#"{"situation":4,"problem":3,"implication":4,"need_payoff":3,"flow":4,"tone":4}"#;
        assert!(serde_json::from_str::<ScoreCard>(missing).is_err());
    }

    #[test]
    fn test_try_from_fn_visits_in_canonical_order() {
        let mut seen = Vec::new();
        let card = ScoreCard::try_from_fn(|dim| {
            seen.push(dim);
            Score::new(2)
        })
        .unwrap();
        assert_eq!(seen, Dimension::ALL.to_vec());
        assert_eq!(card, ScoreCard::uniform(Score::new(2).unwrap()));
    }
}
