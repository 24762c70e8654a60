use anyhow::Context;

use crate::{
    analysis::{
        color::{Lab, delta_e_ciede2000, lab_to_srgb, srgb_to_lab},
        kmeans::{self, KMeansOpts},
    },
    foundation::{
        core::Rgb8,
        error::{FmiError, FmiResult},
    },
};

/// Cluster count used for card palettes.
pub const DEFAULT_CLUSTERS: usize = 5;

/// Minimum CIEDE2000 distance for a secondary color to count as clearly distinct.
pub const DISTINCT_DELTA_E: f64 = 20.0;

/// Lowest-ranked cluster (1-based) considered as a secondary candidate.
///
/// With [`DEFAULT_CLUSTERS`] this leaves the smallest cluster out of the scan on purpose: a
/// rank-5 center is usually a sliver of the artwork and makes a poor accent.
const LAST_SECONDARY_RANK: usize = 4;

/// Background (`primary`) and accent (`secondary`) colors for a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Palette {
    pub primary: Rgb8,
    pub secondary: Rgb8,
}

/// Extract a two-color palette from encoded image bytes.
///
/// Identical bytes and cluster counts always produce the identical palette.
pub fn extract_palette(image_bytes: &[u8], clusters: usize) -> FmiResult<Palette> {
    if clusters < 2 {
        return Err(FmiError::validation(format!(
            "palette extraction needs at least 2 clusters, got {clusters}"
        )));
    }

    let img = image::load_from_memory(image_bytes)
        .context("decode artwork for palette extraction")
        .map_err(|e| FmiError::artwork(format!("{e:#}")))?
        .to_rgb8();

    let pixels: Vec<[f32; 3]> = img
        .pixels()
        .map(|px| {
            let lab = srgb_to_lab(Rgb8::new(px[0], px[1], px[2]));
            [lab.l as f32, lab.a as f32, lab.b as f32]
        })
        .collect();

    let fit = kmeans::fit(&pixels, KMeansOpts::with_k(clusters))?;
    let ranked: Vec<Lab> = fit
        .ranked()
        .into_iter()
        .map(|i| Lab::from_array(fit.centers[i]))
        .collect();

    let primary = ranked[0];
    let secondary = ranked[pick_secondary(&ranked)];
    Ok(to_palette(primary, secondary))
}

/// Index into `ranked` of the secondary color.
///
/// Walks candidates from rank 2 down to rank 4 and stops at the first one at least
/// [`DISTINCT_DELTA_E`] away from the primary; if none qualifies the most distant candidate wins.
pub(crate) fn pick_secondary(ranked: &[Lab]) -> usize {
    let primary = ranked[0];
    let last = ranked.len().min(LAST_SECONDARY_RANK) - 1;

    let mut best = 1usize;
    let mut best_delta = delta_e_ciede2000(primary, ranked[1]);
    let mut delta = best_delta;
    let mut idx = 1usize;
    while delta < DISTINCT_DELTA_E && idx < last {
        idx += 1;
        delta = delta_e_ciede2000(primary, ranked[idx]);
        if delta > best_delta {
            best_delta = delta;
            best = idx;
        }
    }

    tracing::debug!(rank = best + 1, delta_e = best_delta, "picked secondary color");
    best
}

fn to_palette(primary: Lab, secondary: Lab) -> Palette {
    let p = lab_to_srgb(primary);
    let mut s = lab_to_srgb(secondary);
    if s == p {
        // Every candidate collapsed onto the primary; push lightness toward mid-grey.
        let shifted_l = if primary.l >= 50.0 {
            primary.l - DISTINCT_DELTA_E
        } else {
            primary.l + DISTINCT_DELTA_E
        };
        s = lab_to_srgb(Lab::new(shifted_l, secondary.a, secondary.b));
    }
    Palette {
        primary: p,
        secondary: s,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/palette.rs"]
mod tests;
