//! Role classification over positioned fragments.
//!
//! Works through the pages in a fixed order of steps, each narrowing what
//! the remaining fragments can be:
//!
//! 1. drop fragments lying entirely off the page;
//! 2. drop page numbers (digits-and-dot in the top-right corner);
//! 3. detect and drop the title page (every fragment centred, few
//!    fragments), shifting the front matter to page 2;
//! 4. tag the front matter: first fragment of the effective first page is
//!    the series title, the second the episode title;
//! 5. tag the closing marker: last fragment on the last page containing
//!    the word "end", indented past the dialogue lane;
//! 6. sort the rest into the two indentation lanes (direction/character
//!    vs dialogue), dropping anything in neither lane with a warning;
//! 7. resolve the direction lane: a fragment immediately followed by
//!    dialogue is a character name, otherwise a stage direction.
//!
//! Missing page numbers, a missing title page and a missing end marker
//! are warnings; a front-matter page with fewer than two fragments is
//! fatal, since nothing downstream can work without the titles.

use crate::config::ScriptLayout;
use crate::error::ConvertError;
use crate::pipeline::extract::ScriptPage;
use crate::pipeline::geometry::{
    by_indent, by_min_indent, is_centered, is_in_top_right, is_off_page, BoundingBox,
};
use crate::transcript::Role;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// A fragment annotated with its resolved role.
///
/// The tagger resolves a role for every fragment it keeps; `None` past
/// this stage indicates a pipeline bug and is rejected during assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedFragment {
    pub role: Option<Role>,
    pub text: String,
    pub page: usize,
}

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());
static END_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bend\b").unwrap());

/// Which indentation lane a kept body fragment fell into.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Lane {
    DirectionOrCharacter,
    Dialogue,
}

#[derive(Debug)]
struct Slot {
    page: usize,
    text: String,
    bbox: BoundingBox,
    role: Option<Role>,
    lane: Option<Lane>,
}

/// Classify every fragment of an extracted script into a [`Role`].
///
/// Fragments are returned in document order. Fragments that cannot be
/// placed (off-page, page numbers, title page, outside both lanes) are
/// dropped, the last three with a warning.
pub fn tag_pages(
    pages: &[ScriptPage],
    layout: &ScriptLayout,
) -> Result<Vec<TaggedFragment>, ConvertError> {
    let mut slots = collect_slots(pages, layout);

    let front_page = drop_title_page(&mut slots, pages, layout);
    tag_front_matter(&mut slots, front_page)?;
    tag_end_marker(&mut slots, pages, layout);
    assign_lanes(&mut slots, layout);
    resolve_direction_lane(&mut slots);

    Ok(slots
        .into_iter()
        .map(|s| TaggedFragment {
            role: s.role,
            text: s.text,
            page: s.page,
        })
        .collect())
}

/// Steps 1–2: flatten pages into slots, dropping off-page fragments and
/// page numbers.
fn collect_slots(pages: &[ScriptPage], layout: &ScriptLayout) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut page_numbers_found = 0usize;

    for page in pages {
        for fragment in &page.fragments {
            if is_off_page(&fragment.bbox, page.width, page.height) {
                debug!("Page {}: dropping off-page fragment {:?}", page.number, fragment.text);
                continue;
            }
            if PAGE_NUMBER.is_match(&fragment.text)
                && is_in_top_right(
                    &fragment.bbox,
                    layout.page_number_min_x,
                    layout.page_number_min_y,
                )
            {
                page_numbers_found += 1;
                continue;
            }
            slots.push(Slot {
                page: page.number,
                text: fragment.text.clone(),
                bbox: fragment.bbox,
                role: None,
                lane: None,
            });
        }
    }

    if page_numbers_found == 0 {
        warn!("Could not find page numbers");
    }
    slots
}

/// Step 3: detect the title page. Returns the page number holding the
/// front matter.
fn drop_title_page(slots: &mut Vec<Slot>, pages: &[ScriptPage], layout: &ScriptLayout) -> usize {
    let Some(first) = pages.first() else {
        return 1;
    };

    let on_first: Vec<&Slot> = slots.iter().filter(|s| s.page == first.number).collect();
    let all_centered = on_first
        .iter()
        .all(|s| is_centered(&s.bbox, first.width, layout.center_tolerance));

    if all_centered && on_first.len() <= layout.title_page_max_fragments {
        slots.retain(|s| s.page != first.number);
        first.number + 1
    } else {
        warn!("Could not find title page");
        first.number
    }
}

/// Step 4: series and episode titles are the first two fragments on the
/// front-matter page.
fn tag_front_matter(slots: &mut [Slot], front_page: usize) -> Result<(), ConvertError> {
    let mut front = slots.iter_mut().filter(|s| s.page == front_page);

    let found = match (front.next(), front.next()) {
        (Some(series), Some(episode)) => {
            series.role = Some(Role::SeriesTitle);
            episode.role = Some(Role::EpisodeTitle);
            return Ok(());
        }
        (Some(_), None) => 1,
        _ => 0,
    };
    Err(ConvertError::FrontMatterMissing {
        page: front_page,
        found,
    })
}

/// Step 5: the closing marker is the last deeply-indented "end" on the
/// last page.
fn tag_end_marker(slots: &mut [Slot], pages: &[ScriptPage], layout: &ScriptLayout) {
    let Some(last) = pages.last() else {
        return;
    };
    let min_indent = layout.dialogue_indent + layout.indent_tolerance;

    let end = slots
        .iter_mut()
        .filter(|s| s.page == last.number && s.role.is_none())
        .filter(|s| END_MARKER.is_match(&s.text) && by_min_indent(&s.bbox, min_indent))
        .last();

    match end {
        Some(slot) => slot.role = Some(Role::End),
        None => warn!("Could not find THE END or equivalent"),
    }
}

/// Step 6: drop untagged fragments outside both indentation lanes.
fn assign_lanes(slots: &mut Vec<Slot>, layout: &ScriptLayout) {
    for slot in slots.iter_mut() {
        if slot.role.is_some() {
            continue;
        }
        if by_indent(&slot.bbox, layout.directions_indent, layout.indent_tolerance) {
            slot.lane = Some(Lane::DirectionOrCharacter);
        } else if by_indent(&slot.bbox, layout.dialogue_indent, layout.indent_tolerance) {
            slot.lane = Some(Lane::Dialogue);
        }
    }

    slots.retain(|s| {
        let keep = s.role.is_some() || s.lane.is_some();
        if !keep {
            warn!(
                "Found text that has not been categorised: {:?} at {:?} (page {})",
                s.text, s.bbox, s.page
            );
        }
        keep
    });
}

/// Step 7: within the lane sequence, a direction-lane fragment followed by
/// dialogue is a character name; anything else (including the final lane
/// fragment) is a stage direction.
fn resolve_direction_lane(slots: &mut [Slot]) {
    let lane_indices: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, s)| s.lane.is_some())
        .map(|(i, _)| i)
        .collect();

    for (pos, &i) in lane_indices.iter().enumerate() {
        match slots[i].lane {
            Some(Lane::Dialogue) => slots[i].role = Some(Role::Dialogue),
            Some(Lane::DirectionOrCharacter) => {
                let next_is_dialogue = lane_indices
                    .get(pos + 1)
                    .map(|&j| slots[j].lane == Some(Lane::Dialogue))
                    .unwrap_or(false);
                slots[i].role = Some(if next_is_dialogue {
                    Role::Character
                } else {
                    Role::Direction
                });
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::Fragment;

    const PAGE_W: f32 = 612.0;
    const PAGE_H: f32 = 792.0;

    fn frag(text: &str, x0: f32, y0: f32) -> Fragment {
        Fragment::new(text, BoundingBox::new(x0, x0 + 150.0, y0, y0 + 12.0))
    }

    fn centered(text: &str, y0: f32) -> Fragment {
        // Midpoint exactly at 306.
        Fragment::new(text, BoundingBox::new(231.0, 381.0, y0, y0 + 12.0))
    }

    fn page(number: usize, fragments: Vec<Fragment>) -> ScriptPage {
        ScriptPage {
            number,
            width: PAGE_W,
            height: PAGE_H,
            fragments,
        }
    }

    fn roles(tagged: &[TaggedFragment]) -> Vec<(Role, &str)> {
        tagged
            .iter()
            .map(|t| (t.role.unwrap(), t.text.as_str()))
            .collect()
    }

    /// A minimal well-formed script: title page, then one content page.
    fn sample_pages() -> Vec<ScriptPage> {
        vec![
            page(
                1,
                vec![centered("MIDNIGHT BURGER", 500.0), centered("a podcast", 480.0)],
            ),
            page(
                2,
                vec![
                    frag("2.", 520.0, 760.0),
                    centered("MIDNIGHT BURGER:", 720.0),
                    centered("Panopticon.", 700.0),
                    frag("TAPE CLICKS ON", 108.0, 660.0),
                    frag("GLORIA", 108.0, 630.0),
                    frag("Hello there.", 144.0, 610.0),
                    frag("She leaves.", 108.0, 580.0),
                    frag("THE END", 160.0, 540.0),
                ],
            ),
        ]
    }

    #[test]
    fn tags_a_well_formed_script() {
        let tagged = tag_pages(&sample_pages(), &ScriptLayout::default()).unwrap();
        assert_eq!(
            roles(&tagged),
            vec![
                (Role::SeriesTitle, "MIDNIGHT BURGER:"),
                (Role::EpisodeTitle, "Panopticon."),
                (Role::Direction, "TAPE CLICKS ON"),
                (Role::Character, "GLORIA"),
                (Role::Dialogue, "Hello there."),
                (Role::Direction, "She leaves."),
                (Role::End, "THE END"),
            ]
        );
    }

    #[test]
    fn direction_lane_resolution_depends_on_successor() {
        let tagged = tag_pages(&sample_pages(), &ScriptLayout::default()).unwrap();
        let by_text: Vec<(&str, Role)> = tagged
            .iter()
            .map(|t| (t.text.as_str(), t.role.unwrap()))
            .collect();
        // GLORIA precedes dialogue: character. TAPE CLICKS ON precedes
        // GLORIA (direction lane): direction. She leaves. precedes nothing
        // in the lanes except via THE END which is excluded: direction.
        assert!(by_text.contains(&("GLORIA", Role::Character)));
        assert!(by_text.contains(&("TAPE CLICKS ON", Role::Direction)));
        assert!(by_text.contains(&("She leaves.", Role::Direction)));
    }

    #[test]
    fn page_numbers_are_dropped() {
        let tagged = tag_pages(&sample_pages(), &ScriptLayout::default()).unwrap();
        assert!(tagged.iter().all(|t| t.text != "2."));
    }

    #[test]
    fn off_page_fragments_are_dropped() {
        let mut pages = sample_pages();
        pages[1].fragments.push(Fragment::new(
            "printer artifact",
            BoundingBox::new(-200.0, -100.0, 300.0, 312.0),
        ));
        let tagged = tag_pages(&pages, &ScriptLayout::default()).unwrap();
        assert!(tagged.iter().all(|t| t.text != "printer artifact"));
    }

    #[test]
    fn no_title_page_means_front_matter_on_page_one() {
        // Page 1 has a left-aligned fragment: not a title page.
        let pages = vec![page(
            1,
            vec![
                centered("MIDNIGHT BURGER", 720.0),
                centered("Panopticon", 700.0),
                frag("GLORIA", 108.0, 630.0),
                frag("Hello.", 144.0, 610.0),
                frag("THE END", 160.0, 540.0),
            ],
        )];
        let tagged = tag_pages(&pages, &ScriptLayout::default()).unwrap();
        assert_eq!(tagged[0].role, Some(Role::SeriesTitle));
        assert_eq!(tagged[1].role, Some(Role::EpisodeTitle));
    }

    #[test]
    fn missing_front_matter_is_fatal() {
        let pages = vec![
            page(1, vec![centered("MIDNIGHT BURGER", 500.0)]),
            page(2, vec![frag("GLORIA", 144.0, 630.0)]),
        ];
        let err = tag_pages(&pages, &ScriptLayout::default()).unwrap_err();
        match err {
            ConvertError::FrontMatterMissing { page, found } => {
                assert_eq!(page, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn end_marker_takes_the_last_deep_match() {
        let mut pages = sample_pages();
        // An earlier, shallower "end" must not win; the final deep one does.
        pages[1].fragments.insert(
            4,
            frag("They reach the end of the road.", 108.0, 650.0),
        );
        pages[1].fragments.push(frag("END OF EPISODE", 200.0, 520.0));
        let tagged = tag_pages(&pages, &ScriptLayout::default()).unwrap();
        let ends: Vec<&TaggedFragment> =
            tagged.iter().filter(|t| t.role == Some(Role::End)).collect();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].text, "END OF EPISODE");
    }

    #[test]
    fn uncategorised_fragments_are_dropped() {
        let mut pages = sample_pages();
        pages[1]
            .fragments
            .push(Fragment::new("margin note", BoundingBox::new(20.0, 90.0, 400.0, 412.0)));
        let tagged = tag_pages(&pages, &ScriptLayout::default()).unwrap();
        assert!(tagged.iter().all(|t| t.text != "margin note"));
    }

    #[test]
    fn every_kept_fragment_has_a_role() {
        let tagged = tag_pages(&sample_pages(), &ScriptLayout::default()).unwrap();
        assert!(tagged.iter().all(|t| t.role.is_some()));
    }
}
