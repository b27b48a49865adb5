//! Production phase state machine
//!
//! Every article flows through 8 ordered production phases:
//! RESEARCH → OUTLINE → DRAFTING → ASSEMBLY → IMAGES → SEO → SCORING → RESERVOIR
//!
//! Two pseudo-phases sit outside the forward chain: `published` (terminal
//! success, entered only by the promotion step) and `rejected` (terminal
//! failure, revocable by the recovery engine).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One stage of article production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Topic research and source gathering
    Research,
    /// Section outline generation
    Outline,
    /// Section-by-section draft writing
    Drafting,
    /// Draft assembly into a single article body
    Assembly,
    /// Image selection and placement
    Images,
    /// Metadata, internal links, search optimization
    Seo,
    /// Quality scoring of the finished article
    Scoring,
    /// Holding pool of completed articles awaiting promotion
    Reservoir,
    /// Terminal success state (promotion step only)
    Published,
    /// Terminal failure state (revocable by recovery)
    Rejected,
}

/// Canonical forward order of the production chain.
///
/// Index 0 is the earliest phase. `Published` and `Rejected` are
/// deliberately absent: they are not reachable by forward progress.
pub const PHASE_ORDER: [Phase; 8] = [
    Phase::Research,
    Phase::Outline,
    Phase::Drafting,
    Phase::Assembly,
    Phase::Images,
    Phase::Seo,
    Phase::Scoring,
    Phase::Reservoir,
];

impl Phase {
    /// Stable snake_case name, used for DB storage and log text
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Research => "research",
            Phase::Outline => "outline",
            Phase::Drafting => "drafting",
            Phase::Assembly => "assembly",
            Phase::Images => "images",
            Phase::Seo => "seo",
            Phase::Scoring => "scoring",
            Phase::Reservoir => "reservoir",
            Phase::Published => "published",
            Phase::Rejected => "rejected",
        }
    }

    /// Position in [`PHASE_ORDER`], or `None` for the pseudo-phases
    pub fn index(&self) -> Option<usize> {
        PHASE_ORDER.iter().position(|p| p == self)
    }

    /// One phase back in the canonical order, floor-clamped to `research`.
    ///
    /// Used by the `reprocess` recovery strategy so missing data is
    /// regenerated by the preceding phase worker. Pseudo-phases have no
    /// position in the chain and step back to the start of it.
    pub fn step_back(&self) -> Phase {
        match self.index() {
            Some(i) => PHASE_ORDER[i.saturating_sub(1)],
            None => Phase::Research,
        }
    }

    /// True for the two states outside the forward chain
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Published | Phase::Rejected)
    }

    /// Find a phase name embedded anywhere in free text (case-insensitive).
    ///
    /// Rejection reasons written by phase workers embed the failing phase
    /// name ("drafting failed after 3 attempts: ..."); the sweeper uses this
    /// to resume an item at the right point. Earlier phases win when several
    /// names appear.
    pub fn parse_loose(text: &str) -> Option<Phase> {
        let lower = text.to_lowercase();
        PHASE_ORDER.iter().copied().find(|p| lower.contains(p.as_str()))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "research" => Ok(Phase::Research),
            "outline" => Ok(Phase::Outline),
            "drafting" => Ok(Phase::Drafting),
            "assembly" => Ok(Phase::Assembly),
            "images" => Ok(Phase::Images),
            "seo" => Ok(Phase::Seo),
            "scoring" => Ok(Phase::Scoring),
            "reservoir" => Ok(Phase::Reservoir),
            "published" => Ok(Phase::Published),
            "rejected" => Ok(Phase::Rejected),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown phase: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_forward_chain() {
        assert_eq!(PHASE_ORDER[0], Phase::Research);
        assert_eq!(PHASE_ORDER[7], Phase::Reservoir);
        assert_eq!(PHASE_ORDER.len(), 8);
        assert!(!PHASE_ORDER.contains(&Phase::Published));
        assert!(!PHASE_ORDER.contains(&Phase::Rejected));
    }

    #[test]
    fn test_step_back_clamps_at_research() {
        assert_eq!(Phase::Research.step_back(), Phase::Research);
        assert_eq!(Phase::Outline.step_back(), Phase::Research);
        assert_eq!(Phase::Scoring.step_back(), Phase::Seo);
        assert_eq!(Phase::Reservoir.step_back(), Phase::Scoring);
    }

    #[test]
    fn test_round_trip_str() {
        for phase in PHASE_ORDER {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }
        assert_eq!("published".parse::<Phase>().unwrap(), Phase::Published);
        assert!("launching".parse::<Phase>().is_err());
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(
            Phase::parse_loose("Drafting failed after 3 attempts: timeout"),
            Some(Phase::Drafting)
        );
        assert_eq!(
            Phase::parse_loose("SEO pass returned malformed JSON"),
            Some(Phase::Seo)
        );
        assert_eq!(Phase::parse_loose("no phase mentioned here"), None);
    }
}
