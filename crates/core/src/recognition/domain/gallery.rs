use serde::{Deserialize, Serialize};

use crate::shared::constants::UNKNOWN_LABEL;

/// One known identity: a label and its reference embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub label: String,
    pub embedding: Vec<f32>,
}

/// The session's reference set of known identities.
///
/// Loaded (or rebuilt) once at startup and read-only afterwards; entry
/// order is preserved from the store and determines tie-breaking.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest-neighbor identity lookup.
    ///
    /// Euclidean distance against every entry; the entry with the
    /// minimum distance wins, with exact ties resolved in favor of the
    /// earliest entry (strict-less-than argmin, stable across runs).
    /// Returns "Unknown" when the minimum is at or above `threshold`
    /// or the gallery is empty. Entries whose embedding length differs
    /// from the query (a gallery built by a different encoder) are at
    /// infinite distance and can never match.
    pub fn match_identity(&self, embedding: &[f32], threshold: f32) -> String {
        let mut best: Option<(f32, &str)> = None;
        for entry in &self.entries {
            let dist = euclidean_distance(embedding, &entry.embedding);
            if best.map_or(true, |(best_dist, _)| dist < best_dist) {
                best = Some((dist, &entry.label));
            }
        }
        match best {
            Some((dist, label)) if dist < threshold => label.to_string(),
            _ => UNKNOWN_LABEL.to_string(),
        }
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
