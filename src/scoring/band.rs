use serde::Serialize;

use crate::PostKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandTier {
    Low,
    Medium,
    High,
    Critical,
}

impl BandTier {
    pub fn from_score(score: u8) -> Self {
        if score <= 30 {
            BandTier::Low
        } else if score <= 60 {
            BandTier::Medium
        } else if score <= 85 {
            BandTier::High
        } else {
            BandTier::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBand {
    pub tier: BandTier,
    pub label: &'static str,
    pub color: &'static str,
    pub critical: bool,
}

pub fn classify_band(score: u8, kind: PostKind) -> ScoreBand {
    let tier = BandTier::from_score(score);
    let (label, color) = match (kind, tier) {
        (PostKind::Cost, BandTier::Low) => ("WORTH IT", "green-300"),
        (PostKind::Cost, BandTier::Medium) => ("CALCULATED RISK", "green-500"),
        (PostKind::Cost, BandTier::High) => ("HEAVY TOLL", "emerald-500"),
        (PostKind::Cost, BandTier::Critical) => ("PYRRHIC VICTORY", "green-500"),
        (PostKind::Shame, BandTier::Low) => ("BARELY SCATHED", "cook-safe"),
        (PostKind::Shame, BandTier::Medium) => ("MEDIUM RARE", "cook-warning"),
        (PostKind::Shame, BandTier::High) => ("WELL DONE", "orange-500"),
        (PostKind::Shame, BandTier::Critical) => ("CRITICALLY COOKED", "cook-accent"),
    };

    ScoreBand {
        tier,
        label,
        color,
        critical: tier == BandTier::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_lower_band() {
        assert_eq!(BandTier::from_score(0), BandTier::Low);
        assert_eq!(BandTier::from_score(30), BandTier::Low);
        assert_eq!(BandTier::from_score(31), BandTier::Medium);
        assert_eq!(BandTier::from_score(60), BandTier::Medium);
        assert_eq!(BandTier::from_score(85), BandTier::High);
        assert_eq!(BandTier::from_score(86), BandTier::Critical);
        assert_eq!(BandTier::from_score(100), BandTier::Critical);
    }

    #[test]
    fn shame_scale_labels() {
        assert_eq!(classify_band(10, PostKind::Shame).label, "BARELY SCATHED");
        assert_eq!(classify_band(45, PostKind::Shame).label, "MEDIUM RARE");
        assert_eq!(classify_band(75, PostKind::Shame).label, "WELL DONE");
        let top = classify_band(95, PostKind::Shame);
        assert_eq!(top.label, "CRITICALLY COOKED");
        assert_eq!(top.color, "cook-accent");
        assert!(top.critical);
    }

    #[test]
    fn cost_scale_labels() {
        assert_eq!(classify_band(30, PostKind::Cost).label, "WORTH IT");
        assert_eq!(classify_band(60, PostKind::Cost).label, "CALCULATED RISK");
        assert_eq!(classify_band(85, PostKind::Cost).label, "HEAVY TOLL");
        assert!(!classify_band(85, PostKind::Cost).critical);
        assert_eq!(classify_band(100, PostKind::Cost).label, "PYRRHIC VICTORY");
    }
}
