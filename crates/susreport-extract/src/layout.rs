//! Page layout classification
//!
//! | Layout | Rule |
//! |--------|------|
//! | `dashboard` | more than 20 spans, at least one shorter than 5 characters |
//! | `multi_column` | more than 10 spans, and more than 10% of the gaps between sorted span x-positions exceed 10% of the page width |
//! | `normal_text` | everything else |

use susreport_types::{PageLayout, TextSpan};

const DASHBOARD_MIN_SPANS: usize = 20;
const DASHBOARD_SHORT_SPAN_CHARS: usize = 5;
const MULTI_COLUMN_MIN_SPANS: usize = 10;
const COLUMN_GAP_RATIO: f64 = 0.1;
const LARGE_GAP_SHARE: f64 = 0.1;

pub fn classify_layout<'a, I>(spans: I, page_width: f64) -> PageLayout
where
    I: IntoIterator<Item = &'a TextSpan>,
{
    let spans: Vec<&TextSpan> = spans.into_iter().collect();

    if spans.len() > DASHBOARD_MIN_SPANS
        && spans
            .iter()
            .any(|s| s.text.chars().count() < DASHBOARD_SHORT_SPAN_CHARS)
    {
        return PageLayout::Dashboard;
    }

    if spans.len() > MULTI_COLUMN_MIN_SPANS {
        let mut xs: Vec<f64> = spans.iter().map(|s| s.bbox.x0).collect();
        xs.sort_by(f64::total_cmp);

        let gaps = xs.len() - 1;
        let large_gaps = xs
            .windows(2)
            .filter(|w| w[1] - w[0] > page_width * COLUMN_GAP_RATIO)
            .count();

        if large_gaps as f64 > gaps as f64 * LARGE_GAP_SHARE {
            return PageLayout::MultiColumn;
        }
    }

    PageLayout::NormalText
}

#[cfg(test)]
mod tests {
    use super::*;
    use susreport_types::BBox;

    fn span_at(text: &str, x0: f64, y0: f64) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            bbox: BBox::new(x0, y0, x0 + 40.0, y0 + 10.0),
            font_size: 10.0,
        }
    }

    #[test]
    fn test_no_spans_is_normal_text() {
        let spans: Vec<TextSpan> = Vec::new();
        assert_eq!(classify_layout(&spans, 600.0), PageLayout::NormalText);
    }

    #[test]
    fn test_many_short_spans_is_dashboard() {
        let spans: Vec<_> = (0..21)
            .map(|i| span_at(if i == 0 { "12%" } else { "營收成長" }, 10.0, i as f64 * 12.0))
            .collect();
        assert_eq!(classify_layout(&spans, 600.0), PageLayout::Dashboard);
    }

    #[test]
    fn test_exactly_twenty_spans_is_not_dashboard() {
        let spans: Vec<_> = (0..20).map(|i| span_at("12%", 10.0, i as f64 * 12.0)).collect();
        assert_eq!(classify_layout(&spans, 600.0), PageLayout::NormalText);
    }

    #[test]
    fn test_spread_x_positions_is_multi_column() {
        // six column starts 80 units apart, two spans each
        let spans: Vec<_> = (0..12)
            .map(|i| span_at("永續發展委員會運作情形", 20.0 + (i / 2) as f64 * 80.0, i as f64 * 12.0))
            .collect();
        assert_eq!(classify_layout(&spans, 600.0), PageLayout::MultiColumn);
    }

    #[test]
    fn test_single_column_is_normal_text() {
        let spans: Vec<_> = (0..12)
            .map(|i| span_at("永續發展委員會運作情形", 50.0 + i as f64, i as f64 * 12.0))
            .collect();
        assert_eq!(classify_layout(&spans, 600.0), PageLayout::NormalText);
    }
}
