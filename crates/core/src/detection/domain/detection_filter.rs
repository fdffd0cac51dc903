use crate::shared::bbox::BoundingBox;

/// Maximal-boxes filter over one detection batch.
///
/// Drops every box wholly contained in any *other* box of the batch,
/// keeping the larger encompassing detections. A detector occasionally
/// reports a sub-region (an eye, a partial face) inside a correct larger
/// detection; only the outer box should seed a track.
///
/// Only strict containment disqualifies: a box is never removed because
/// of itself, and two identical boxes contain each other without either
/// being the larger one, so both survive; the reconciliation step
/// against live tracks suppresses the second one there.
pub fn filter_contained(batch: &[BoundingBox]) -> Vec<BoundingBox> {
    batch
        .iter()
        .enumerate()
        .filter(|(i, candidate)| {
            !batch.iter().enumerate().any(|(j, other)| {
                *i != j && **candidate != *other && candidate.is_contained_in(other)
            })
        })
        .map(|(_, b)| *b)
        .collect()
}
