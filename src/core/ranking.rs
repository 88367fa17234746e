
use crate::domain::model::{AnalysisResult, DerivativeMatch};
use std::cmp::Ordering;

/// Aggregate metal coverage across all matches of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetalBanner {
    AluminumOnly,
    SteelOnly,
    Both,
}

impl MetalBanner {
    pub fn label(&self) -> &'static str {
        match self {
            MetalBanner::AluminumOnly => "Aluminum",
            MetalBanner::SteelOnly => "Steel",
            MetalBanner::Both => "Aluminum & Steel",
        }
    }
}

/// How a ranked result must be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NotDerivative,
    NoDerivativeCategory,
    Derivative { banner: MetalBanner },
}

fn compare_matches(a: &DerivativeMatch, b: &DerivativeMatch) -> Ordering {
    b.confidence
        .rank()
        .cmp(&a.confidence.rank())
        .then_with(|| a.derivative_category.cmp(&b.derivative_category))
}

/// Confidence first (High > Medium > Low > unrecognized), then category byte-wise.
/// Stable, so identical matches keep their input order.
pub fn sort_matches(matches: &mut [DerivativeMatch]) {
    matches.sort_by(compare_matches);
}

/// Sorts the matches of a raw classifier result in place and hands it back.
pub fn rank(mut result: AnalysisResult) -> AnalysisResult {
    sort_matches(&mut result.matches);
    tracing::debug!(
        "Ranked {} matches (found: {})",
        result.matches.len(),
        result.found
    );
    result
}

pub fn metal_banner(matches: &[DerivativeMatch]) -> Option<MetalBanner> {
    let aluminum = matches.iter().any(|m| m.metal_type.covers_aluminum());
    let steel = matches.iter().any(|m| m.metal_type.covers_steel());

    match (aluminum, steel) {
        (true, true) => Some(MetalBanner::Both),
        (true, false) => Some(MetalBanner::AluminumOnly),
        (false, true) => Some(MetalBanner::SteelOnly),
        (false, false) => None,
    }
}

pub fn verdict(result: &AnalysisResult) -> Verdict {
    if !result.found {
        return Verdict::NotDerivative;
    }
    match metal_banner(&result.matches) {
        Some(banner) => Verdict::Derivative { banner },
        None => Verdict::NoDerivativeCategory,
    }
}

/// "1 category identified" / "3 categories identified".
pub fn category_summary(count: usize) -> String {
    let noun = if count == 1 { "category" } else { "categories" };
    format!("{} {} identified", count, noun)
}
