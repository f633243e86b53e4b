use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use super::genres::*;
use crate::error::{AppError, AppResult};

/// Emotion labels produced by the client-side face analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Surprised,
    Fearful,
    Disgusted,
    Neutral,
}

impl EmotionLabel {
    /// Every label, in the order the emotion → genre table is scanned
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprised,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Genres associated with this emotion. Neutral maps to nothing.
    pub fn genres(&self) -> &'static [GenreId] {
        match self {
            EmotionLabel::Happy => &[COMEDY, FAMILY, MUSIC, ANIMATION],
            EmotionLabel::Sad => &[DRAMA, ROMANCE, HISTORY],
            EmotionLabel::Angry => &[ACTION, THRILLER, CRIME, WAR],
            EmotionLabel::Surprised => &[SCIENCE_FICTION, FANTASY, HORROR, ADVENTURE],
            EmotionLabel::Fearful => &[HORROR, THRILLER, MYSTERY],
            EmotionLabel::Disgusted => &[CRIME, THRILLER, HORROR, DOCUMENTARY],
            EmotionLabel::Neutral => &[],
        }
    }

    /// Labels that can drive genre selection
    pub fn recommendable() -> impl Iterator<Item = EmotionLabel> {
        Self::ALL.into_iter().filter(|e| *e != EmotionLabel::Neutral)
    }
}

impl Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| AppError::Validation(format!("Unknown emotion label '{}'", s)))
    }
}

/// Confidence per emotion label, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EmotionSignal(BTreeMap<EmotionLabel, f64>);

impl EmotionSignal {
    /// Validates a raw label → confidence map.
    ///
    /// Every label must be known and every confidence must be a finite number in [0, 1].
    pub fn from_raw(raw: BTreeMap<String, f64>) -> AppResult<Self> {
        let mut weights = BTreeMap::new();
        for (label, confidence) in raw {
            let label: EmotionLabel = label.parse()?;
            if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
                return Err(AppError::Validation(format!(
                    "Confidence for '{}' must be within [0, 1], got {}",
                    label, confidence
                )));
            }
            weights.insert(label, confidence);
        }
        Ok(Self(weights))
    }

    pub fn get(&self, label: EmotionLabel) -> Option<f64> {
        self.0.get(&label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        self.0.iter().map(|(label, weight)| (*label, *weight))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Strongest non-neutral emotion. Ties keep the earlier label; an empty signal
    /// defaults to happy.
    pub fn dominant(&self) -> EmotionLabel {
        self.iter()
            .filter(|(label, _)| *label != EmotionLabel::Neutral)
            .fold(None, |best: Option<(EmotionLabel, f64)>, (label, weight)| match best {
                Some((_, best_weight)) if best_weight >= weight => best,
                _ => Some((label, weight)),
            })
            .map(|(label, _)| label)
            .unwrap_or(EmotionLabel::Happy)
    }
}

impl FromIterator<(EmotionLabel, f64)> for EmotionSignal {
    fn from_iter<T: IntoIterator<Item = (EmotionLabel, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
