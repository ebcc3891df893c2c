//! Association of detected values with their descriptions
//!
//! A value block usually carries its own label ("再生能源占比 45%"). When
//! stripping the value leaves too little text, the label is assumed to sit
//! directly underneath, as in KPI tiles, and the nearest block below that
//! overlaps horizontally is used instead.

use crate::config::ExtractionConfig;
use susreport_types::{BBox, DataBlock};

/// A page block considered as a description source
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionCandidate {
    pub text: String,
    pub bbox: BBox,
}

/// Nearest candidate strictly below `anchor`, at most `max_gap` away and
/// overlapping it horizontally. Equal gaps keep the earliest candidate.
pub fn find_closest_below<'a>(
    candidates: &'a [DescriptionCandidate],
    anchor: &BBox,
    max_gap: f64,
) -> Option<&'a DescriptionCandidate> {
    candidates
        .iter()
        .filter_map(|c| {
            let gap = anchor.gap_below(&c.bbox)?;
            (gap <= max_gap && anchor.overlaps_horizontally(&c.bbox)).then_some((gap, c))
        })
        // min_by keeps the first of equal elements
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
}

/// The block text with every occurrence of `value + unit` removed, trimmed
pub fn inline_description(block: &DataBlock) -> String {
    let value_unit = format!("{}{}", block.value, block.unit);
    block.text.replace(&value_unit, "").trim().to_string()
}

/// Fill in the description of every data block
pub fn associate_descriptions(
    mut data_blocks: Vec<DataBlock>,
    candidates: &[DescriptionCandidate],
    config: &ExtractionConfig,
) -> Vec<DataBlock> {
    for data in data_blocks.iter_mut() {
        let mut description = inline_description(data);

        if description.chars().count() < config.min_description_chars {
            if let Some(closest) =
                find_closest_below(candidates, &data.bbox, config.max_vertical_gap)
            {
                description = closest.text.clone();
            }
        }

        data.description = description;
    }

    data_blocks
}
