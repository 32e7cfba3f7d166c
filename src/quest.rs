use std::hash::{Hash, Hasher};

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// A validated weekly quest. Only obtainable through [`QuestCatalog::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quest {
    pub name: String,
    pub points: u64,
    /// Chance of completion in any given week, in `[0, 1]`.
    pub probability: f64,
}

// Probabilities are validated finite, so hashing the bit pattern is stable.
impl Hash for Quest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.points.hash(state);
        self.probability.to_bits().hash(state);
    }
}

/// Quest definition as it arrives from outside (JSON, CLI). Signed so that a
/// negative point value is reported by validation, not by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestSpec {
    pub name: String,
    pub points: i64,
    pub probability: f64,
}

impl QuestSpec {
    pub fn new(name: impl Into<String>, points: i64, probability: f64) -> Self {
        QuestSpec { name: name.into(), points, probability }
    }
}

impl From<&Quest> for QuestSpec {
    fn from(q: &Quest) -> Self {
        QuestSpec { name: q.name.clone(), points: q.points as i64, probability: q.probability }
    }
}

/// Ordered quest collection. Catalog order is the draw order within a week.
#[derive(Debug, Clone, Default, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct QuestCatalog {
    quests: Vec<Quest>,
}

impl QuestCatalog {
    /// Validate every definition. The first offending quest, in catalog
    /// order, is reported with its index and name.
    pub fn new(specs: Vec<QuestSpec>) -> Result<Self, SimError> {
        let mut quests = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            quests.push(validate(index, spec)?);
        }
        Ok(QuestCatalog { quests })
    }

    pub fn empty() -> Self {
        QuestCatalog::default()
    }

    /// The four reference quests: daily login, wallet, exchange, social.
    pub fn default_catalog() -> Self {
        let quest = |name: &str, points, probability| Quest {
            name: name.to_string(),
            points,
            probability,
        };
        QuestCatalog {
            quests: vec![
                quest("Daily login", 1, 0.9),
                quest("Wallet connection", 10, 0.7),
                quest("Exchange connection", 100, 0.2),
                quest("Social media engagement", 50, 0.3),
            ],
        }
    }

    /// `n` quests named `Quest 1..=n` with points uniform in `1..=100` and a
    /// completion probability uniform in `[0.1, 0.9)`, rounded to 2 decimals.
    pub fn random(n: usize, rng: &mut impl Rng) -> Self {
        let points = Uniform::new_inclusive(1_u64, 100).expect("invalid points range");
        let probability = Uniform::new(0.1_f64, 0.9).expect("invalid probability range");
        let quests = (1..=n)
            .map(|i| Quest {
                name: format!("Quest {i}"),
                points: points.sample(rng),
                probability: (probability.sample(rng) * 100.0).round() / 100.0,
            })
            .collect();
        QuestCatalog { quests }
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Quest> {
        self.quests.iter()
    }

    /// Points earned in a week where every quest is completed, before the
    /// cap. `None` when the sum does not fit in a `u64`.
    pub fn max_weekly_points(&self) -> Option<u64> {
        self.quests.iter().try_fold(0_u64, |acc, q| acc.checked_add(q.points))
    }

    /// Expected uncapped points per week: Σ points × probability.
    pub fn expected_weekly_points(&self) -> f64 {
        self.quests.iter().map(|q| q.points as f64 * q.probability).sum()
    }

    pub fn to_specs(&self) -> Vec<QuestSpec> {
        self.quests.iter().map(QuestSpec::from).collect()
    }
}

impl<'a> IntoIterator for &'a QuestCatalog {
    type Item = &'a Quest;
    type IntoIter = std::slice::Iter<'a, Quest>;

    fn into_iter(self) -> Self::IntoIter {
        self.quests.iter()
    }
}

fn validate(index: usize, spec: QuestSpec) -> Result<Quest, SimError> {
    let QuestSpec { name, points, probability } = spec;
    // NaN fails the range check as well.
    if !(0.0..=1.0).contains(&probability) {
        return Err(SimError::InvalidQuest {
            index,
            name,
            reason: format!("probability {probability} outside [0, 1]"),
        });
    }
    let Ok(points) = u64::try_from(points) else {
        return Err(SimError::InvalidQuest {
            index,
            name,
            reason: format!("points {points} is negative"),
        });
    };
    Ok(Quest { name, points, probability })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn valid_catalog_preserves_order() {
        let catalog = QuestCatalog::new(vec![
            QuestSpec::new("a", 1, 0.0),
            QuestSpec::new("b", 0, 1.0),
            QuestSpec::new("c", 5, 0.5),
        ])
        .unwrap();
        let names: Vec<&str> = catalog.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_catalog_is_valid() {
        let catalog = QuestCatalog::new(vec![]).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.max_weekly_points(), Some(0));
    }

    #[test]
    fn probability_above_one_rejected_with_index() {
        let err = QuestCatalog::new(vec![
            QuestSpec::new("ok", 1, 0.5),
            QuestSpec::new("too likely", 1, 1.01),
        ])
        .unwrap_err();
        match err {
            SimError::InvalidQuest { index, name, .. } => {
                assert_eq!(index, 1);
                assert_eq!(name, "too likely");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_probability_rejected() {
        let err = QuestCatalog::new(vec![QuestSpec::new("q", 1, -0.1)]).unwrap_err();
        assert!(matches!(err, SimError::InvalidQuest { index: 0, .. }));
    }

    #[test]
    fn nan_probability_rejected() {
        let err = QuestCatalog::new(vec![QuestSpec::new("q", 1, f64::NAN)]).unwrap_err();
        assert!(matches!(err, SimError::InvalidQuest { .. }));
    }

    #[test]
    fn negative_points_rejected() {
        let err = QuestCatalog::new(vec![QuestSpec::new("q", -5, 0.5)]).unwrap_err();
        match err {
            SimError::InvalidQuest { reason, .. } => assert!(reason.contains("-5"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn first_offending_quest_is_reported() {
        let err = QuestCatalog::new(vec![
            QuestSpec::new("bad points", -1, 0.5),
            QuestSpec::new("bad prob", 1, 2.0),
        ])
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidQuest { index: 0, .. }));
    }

    #[test]
    fn default_catalog_matches_reference_quests() {
        let catalog = QuestCatalog::default_catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.max_weekly_points(), Some(161));
        let expected = 1.0 * 0.9 + 10.0 * 0.7 + 100.0 * 0.2 + 50.0 * 0.3;
        assert!((catalog.expected_weekly_points() - expected).abs() < 1e-12);
    }

    #[test]
    fn weekly_points_overflow_is_none() {
        let catalog = QuestCatalog::new(vec![
            QuestSpec::new("a", i64::MAX, 1.0),
            QuestSpec::new("b", i64::MAX, 1.0),
            QuestSpec::new("c", 2, 1.0),
        ])
        .unwrap();
        assert_eq!(catalog.max_weekly_points(), None);
    }

    #[test]
    fn random_catalog_within_ranges() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let catalog = QuestCatalog::random(50, &mut rng);
        assert_eq!(catalog.len(), 50);
        for (i, q) in catalog.iter().enumerate() {
            assert_eq!(q.name, format!("Quest {}", i + 1));
            assert!((1..=100).contains(&q.points), "points {}", q.points);
            assert!((0.1..=0.9).contains(&q.probability), "probability {}", q.probability);
            let cents = q.probability * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9, "not rounded: {}", q.probability);
        }
    }

    #[test]
    fn random_catalog_is_seed_deterministic() {
        let a = QuestCatalog::random(6, &mut ChaCha20Rng::seed_from_u64(42));
        let b = QuestCatalog::random(6, &mut ChaCha20Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn specs_round_trip_through_validation() {
        let catalog = QuestCatalog::default_catalog();
        let rebuilt = QuestCatalog::new(catalog.to_specs()).unwrap();
        assert_eq!(catalog, rebuilt);
    }
}
