use crate::policy::BehaviorCloningEntry;

/// Score of every direction when the state has no behaviour-cloning entry.
pub const NO_SIGNAL_SCORE: f64 = 0.25;

/// Behaviour-cloning scores: `weight × base × confidence`.
///
/// Confidence is `min(1, samples / saturation)`.
pub fn cloning_scores(
    entry: Option<&BehaviorCloningEntry>,
    base_score: f64,
    saturation: f64,
) -> [f64; 4] {
    match entry {
        Some(entry) => {
            let confidence = entry.confidence(saturation);
            entry.weights.map(|w| w * base_score * confidence)
        }
        None => [NO_SIGNAL_SCORE; 4],
    }
}
