//! Value/unit detection rules
//!
//! Rules are evaluated in order and the first rule that matches anywhere in
//! the text wins. Only that rule's first match is used. Values are kept as
//! the raw matched string.

use lazy_static::lazy_static;
use regex::Regex;
use susreport_types::{BBox, DataBlock};
use tracing::debug;

/// Where a rule takes its unit from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSource {
    /// A capture group of the pattern
    Group(usize),
    /// A fixed unit string
    Fixed(&'static str),
}

#[derive(Debug)]
pub struct UnitRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub unit: UnitSource,
}

impl UnitRule {
    fn new(name: &'static str, pattern: &str, unit: UnitSource) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("unit rule pattern must compile"),
            unit,
        }
    }

    /// First `(value, unit)` this rule finds in `text`
    pub fn find(&self, text: &str) -> Option<(String, String)> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(1)?.as_str().to_string();
        let unit = match self.unit {
            UnitSource::Group(i) => caps.get(i)?.as_str().to_string(),
            UnitSource::Fixed(unit) => unit.to_string(),
        };
        Some((value, unit))
    }
}

lazy_static! {
    /// Detection rules in priority order
    pub static ref UNIT_RULES: Vec<UnitRule> = vec![
        UnitRule::new(
            "number_with_unit",
            r"([\d,.]+)\s*(%|萬|億度|兆|元|美元|度|噸|個|項|人次|億)",
            UnitSource::Group(2),
        ),
        UnitRule::new("percentage", r"([\d,.]+)\s*%", UnitSource::Fixed("%")),
        UnitRule::new("currency", r"([\d,.]+)\s*(元|美元|台幣)", UnitSource::Group(2)),
        UnitRule::new("count", r"([\d,.]+)\s*(個|台|件|套|張)", UnitSource::Group(2)),
    ];
}

/// Find the first value and unit in `text` under the rule priority order
pub fn find_value_unit(text: &str) -> Option<(String, String)> {
    UNIT_RULES.iter().find_map(|rule| {
        let (value, unit) = rule.find(text)?;
        debug!("Rule {} matched {}{}", rule.name, value, unit);
        Some((value, unit))
    })
}

/// Build a data block from a text block when it contains a value with a unit
///
/// The description is left empty; it is filled in by the associator.
pub fn extract_data_from_text(text: &str, bbox: BBox) -> Option<DataBlock> {
    let (value, unit) = find_value_unit(text)?;
    Some(DataBlock {
        value,
        unit,
        text: text.to_string(),
        bbox,
        description: String::new(),
    })
}
