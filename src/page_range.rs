//! Page-Range Parser (C5): tolerant comma-separated page/range tokens, plus
//! the sibling margin-tuple parser.

use crate::error::{WorkerError, WorkerResult};

/// Parses `"1,3-5, 9"` style input against a document of `total_pages`
/// pages. Non-numeric tokens are dropped silently; out-of-range bounds are
/// clamped rather than rejected. Output preserves document order and may
/// contain duplicates.
pub fn parse_page_ranges(input: &str, total_pages: usize) -> Vec<usize> {
    let mut pages = Vec::new();

    for raw_token in input.split(',') {
        let token = raw_token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((a, b)) = token.split_once('-') {
            let (a, b) = (a.trim(), b.trim());
            let (Ok(start_raw), Ok(end_raw)) = (a.parse::<i64>(), b.parse::<i64>()) else {
                continue;
            };
            let start = start_raw.max(1) as usize;
            let end = (end_raw as usize).min(total_pages);
            if start <= end {
                pages.extend(start..=end);
            }
        } else if let Ok(n) = token.parse::<i64>() {
            let n = n.max(1) as usize;
            if n <= total_pages {
                pages.push(n);
            }
        }
    }

    pages
}

/// Like [`parse_page_ranges`] but fails when nothing survives parsing,
/// for tools where an empty selection is never meaningful.
pub fn resolve_page_selection(input: &str, total_pages: usize) -> WorkerResult<Vec<usize>> {
    let pages = parse_page_ranges(input, total_pages);
    if pages.is_empty() {
        return Err(WorkerError::user("No valid pages selected"));
    }
    Ok(pages)
}

/// A four-sided margin in points: top, right, bottom, left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Parses either `"N"` (applied to all four sides) or `"T,R,B,L"`.
pub fn parse_margins(input: &str) -> WorkerResult<Margins> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();

    match parts.as_slice() {
        [single] => {
            let value: f64 = single
                .parse()
                .map_err(|_| WorkerError::user(format!("invalid margin value: {single}")))?;
            Ok(Margins {
                top: value,
                right: value,
                bottom: value,
                left: value,
            })
        }
        [t, r, b, l] => {
            let parse_one = |s: &str| -> WorkerResult<f64> {
                s.parse()
                    .map_err(|_| WorkerError::user(format!("invalid margin component: {s}")))
            };
            Ok(Margins {
                top: parse_one(t)?,
                right: parse_one(r)?,
                bottom: parse_one(b)?,
                left: parse_one(l)?,
            })
        }
        _ => Err(WorkerError::user(
            "margins must be a single value or a T,R,B,L 4-tuple",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_ranges_and_singles_in_order() {
        let pages = parse_page_ranges("1,3-5,2", 10);
        assert_eq!(pages, vec![1, 3, 4, 5, 2]);
    }

    #[test]
    fn clamps_out_of_bounds_ranges() {
        let pages = parse_page_ranges("5-100", 7);
        assert_eq!(pages, vec![5, 6, 7]);
    }

    #[test]
    fn drops_non_numeric_tokens_without_failing() {
        let pages = parse_page_ranges("1, x, 3", 5);
        assert_eq!(pages, vec![1, 3]);
    }

    #[test]
    fn inverted_range_emits_nothing() {
        let pages = parse_page_ranges("5-2", 10);
        assert!(pages.is_empty());
    }

    #[test]
    fn empty_required_selection_is_a_user_error() {
        let err = resolve_page_selection("x,y", 5).unwrap_err();
        assert!(matches!(err, WorkerError::User(_)));
    }

    #[test]
    fn single_margin_value_applies_to_all_sides() {
        let margins = parse_margins("12").unwrap();
        assert_eq!(margins, Margins { top: 12.0, right: 12.0, bottom: 12.0, left: 12.0 });
    }

    #[test]
    fn four_tuple_margin_assigns_each_side() {
        let margins = parse_margins("1,2,3,4").unwrap();
        assert_eq!(margins, Margins { top: 1.0, right: 2.0, bottom: 3.0, left: 4.0 });
    }

    #[test]
    fn wrong_arity_margin_is_rejected() {
        assert!(parse_margins("1,2,3").is_err());
    }

    #[test]
    fn non_numeric_margin_component_is_rejected() {
        assert!(parse_margins("1,2,x,4").is_err());
    }
}
