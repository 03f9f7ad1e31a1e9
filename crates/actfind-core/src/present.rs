//! Turn match positions into display groups with surrounding context.

use crate::segment::ParagraphSequence;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Match,
    Context,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Match => "MATCH",
            Label::Context => "CONTEXT",
        }
    }
}

/// Closed interval of paragraph positions, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    pub start: usize,
    pub end: usize,
}

impl ContextWindow {
    /// `[max(0, pos - radius), min(len - 1, pos + radius)]`. `None` when `pos` is out of range.
    pub fn around(pos: usize, radius: usize, len: usize) -> Option<Self> {
        if pos >= len {
            return None;
        }
        Some(Self {
            start: pos.saturating_sub(radius),
            end: pos.saturating_add(radius).min(len - 1),
        })
    }

    pub fn positions(self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine<'a> {
    pub position: usize,
    pub label: Label,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayGroup<'a> {
    pub match_position: usize,
    pub window: ContextWindow,
    pub lines: Vec<DisplayLine<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "groups", rename_all = "snake_case")]
pub enum Presentation<'a> {
    NoMatches,
    Groups(Vec<DisplayGroup<'a>>),
}

impl<'a> Presentation<'a> {
    pub fn groups(&self) -> &[DisplayGroup<'a>] {
        match self {
            Presentation::NoMatches => &[],
            Presentation::Groups(g) => g,
        }
    }
}

/// One group per match, in the order given. Windows may overlap; nothing is deduplicated.
///
/// Positions outside `paragraphs` are skipped. With nothing left to show the result is
/// [`Presentation::NoMatches`].
pub fn present<'a>(
    paragraphs: &'a ParagraphSequence,
    matches: &[usize],
    radius: usize,
) -> Presentation<'a> {
    let groups: Vec<DisplayGroup<'a>> = matches
        .iter()
        .filter_map(|&pos| {
            let window = ContextWindow::around(pos, radius, paragraphs.len())?;
            let lines = window
                .positions()
                .filter_map(|i| {
                    paragraphs.get(i).map(|text| DisplayLine {
                        position: i,
                        label: if i == pos { Label::Match } else { Label::Context },
                        text,
                    })
                })
                .collect();
            Some(DisplayGroup {
                match_position: pos,
                window,
                lines,
            })
        })
        .collect();

    if groups.is_empty() {
        Presentation::NoMatches
    } else {
        Presentation::Groups(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{find, segment, Query};

    fn three() -> ParagraphSequence {
        ["first", "second", "third"].iter().collect()
    }

    fn labels(g: &DisplayGroup<'_>) -> Vec<(usize, Label)> {
        g.lines.iter().map(|l| (l.position, l.label)).collect()
    }

    #[test]
    fn window_clamps_at_start() {
        let p = three();
        let out = present(&p, &[0], 1);
        let g = &out.groups()[0];
        assert_eq!(g.window, ContextWindow { start: 0, end: 1 });
        assert_eq!(labels(g), vec![(0, Label::Match), (1, Label::Context)]);
    }

    #[test]
    fn window_clamps_at_end() {
        let p = three();
        let out = present(&p, &[2], 1);
        let g = &out.groups()[0];
        assert_eq!(g.window, ContextWindow { start: 1, end: 2 });
        assert_eq!(labels(g), vec![(1, Label::Context), (2, Label::Match)]);
    }

    #[test]
    fn radius_zero_shows_only_the_match() {
        let p = three();
        let out = present(&p, &[1], 0);
        let g = &out.groups()[0];
        assert_eq!(labels(g), vec![(1, Label::Match)]);
        assert_eq!(g.lines[0].text, "second");
    }

    #[test]
    fn large_radius_does_not_overflow() {
        let p = three();
        let out = present(&p, &[1], usize::MAX);
        assert_eq!(out.groups()[0].window, ContextWindow { start: 0, end: 2 });
    }

    #[test]
    fn overlapping_windows_are_kept_separately() {
        let p = three();
        let out = present(&p, &[0, 1], 1);
        assert_eq!(out.groups().len(), 2);
        assert_eq!(labels(&out.groups()[0]), vec![(0, Label::Match), (1, Label::Context)]);
        assert_eq!(
            labels(&out.groups()[1]),
            vec![(0, Label::Context), (1, Label::Match), (2, Label::Context)]
        );
    }

    #[test]
    fn no_matches_is_signalled() {
        let p = three();
        assert_eq!(present(&p, &[], 1), Presentation::NoMatches);
        assert_eq!(present(&p, &[7], 1), Presentation::NoMatches);
        assert!(present(&p, &[], 1).groups().is_empty());
    }

    #[test]
    fn search_end_to_end_over_extracted_pages() {
        let paragraphs = segment(&["Para A\n\n\nPara B"]);
        assert_eq!(paragraphs.as_slice(), &["Para A".to_string(), "Para B".to_string()]);

        let q = Query::parse("para b").unwrap();
        let hits = find(&paragraphs, &q);
        assert_eq!(hits, vec![1]);

        let out = present(&paragraphs, &hits, 1);
        assert_eq!(out.groups().len(), 1);
        let g = &out.groups()[0];
        assert_eq!(g.match_position, 1);
        assert_eq!(g.window, ContextWindow { start: 0, end: 1 });
        assert_eq!(labels(g), vec![(0, Label::Context), (1, Label::Match)]);
        assert_eq!(g.lines[0].text, "Para A");
        assert_eq!(g.lines[1].text, "Para B");
    }

    #[test]
    fn serializes_labels_in_upper_case() {
        let p = three();
        let v = serde_json::to_value(present(&p, &[1], 0)).unwrap();
        assert_eq!(v["kind"], "groups");
        assert_eq!(v["groups"][0]["lines"][0]["label"], "MATCH");
        let v = serde_json::to_value(Presentation::NoMatches).unwrap();
        assert_eq!(v["kind"], "no_matches");
    }
}
