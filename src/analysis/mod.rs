//! Batch narrative analysis
//!
//! Runs a fixed set of analyses over a whole snapshot and persists the
//! result as `ffp_analysis_<period>.json`.

mod error;
mod runner;


pub use error::{AnalysisError, AnalysisResult};
pub use runner::AnalysisRunner;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::ClubRecord;

/// The analyses produced for every run, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    OverallFfpCompliance,
    RiskAssessment,
    StrategicComparison,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::OverallFfpCompliance,
        AnalysisKind::RiskAssessment,
        AnalysisKind::StrategicComparison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::OverallFfpCompliance => "overall_ffp_compliance",
            AnalysisKind::RiskAssessment => "risk_assessment",
            AnalysisKind::StrategicComparison => "strategic_comparison",
        }
    }

    /// Instruction sent ahead of the snapshot data
    pub fn instruction(&self, period: i32) -> String {
        match self {
            AnalysisKind::OverallFfpCompliance => format!(
                "Analyze the Financial Fair Play compliance of these Premier League clubs for {}. \
                 Identify which clubs are at risk of FFP violations and explain the key financial \
                 metrics that indicate compliance or non-compliance.",
                period
            ),
            AnalysisKind::RiskAssessment => "Rank these clubs by their FFP risk level (high, medium, low) \
                 and explain the financial indicators that contribute to each risk assessment. \
                 Focus on debt levels, wage-to-revenue ratios, and transfer spending patterns."
                .to_string(),
            AnalysisKind::StrategicComparison => "Compare the financial strategies of the Big 6 clubs \
                 versus Brighton. What makes Brighton's approach different, and how does their \
                 financial model compare in terms of sustainability?"
                .to_string(),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub analysis: String,
}

/// Persisted result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub timestamp: DateTime<Utc>,
    pub analyses: Vec<AnalysisEntry>,
    /// Records the analyses were generated from
    pub raw_data: Vec<ClubRecord>,
}

impl AnalysisRun {
    pub fn get(&self, kind: AnalysisKind) -> Option<&str> {
        self.analyses
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.analysis.as_str())
    }
}
