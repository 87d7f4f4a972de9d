use crate::aggregate::merge::Aggregator;
use crate::tokens::types::Token;

/// Minimum occurrence for a chain listed by `source_count` sources.
///
/// Products that are whole numbers up to float noise (`100 * 0.07`) are not
/// rounded up to the next integer.
pub fn quorum_threshold(source_count: usize, quorum: f64) -> u32 {
    let exact = source_count as f64 * quorum;
    let nearest = exact.round();
    if (exact - nearest).abs() < 1e-9 {
        nearest as u32
    } else {
        exact.ceil() as u32
    }
}

/// Keep the aggregated tokens listed by enough sources on their chain, plus
/// every chain's native coin.
///
/// The result may contain the same key twice (a coin that is also listed by
/// sources); callers deduplicate before saving. Aggregated entries come first
/// so they win deduplication.
pub fn select_popular(aggregator: &Aggregator<'_>, quorum: f64) -> Vec<Token> {
    let mut selected = Vec::new();

    for (key, token) in aggregator.tokens() {
        let source_count = aggregator.source_count(key.chain_id);
        if source_count == 0 {
            continue;
        }
        if token.occurrence.unwrap_or(0) >= quorum_threshold(source_count, quorum) {
            selected.push(token.clone());
        }
    }

    let popular = selected.len();
    selected.extend(aggregator.registry().coins().cloned());

    tracing::info!(
        candidates = aggregator.len(),
        popular,
        "Popular tokens selected"
    );
    selected
}
