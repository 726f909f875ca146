use std::collections::HashMap;

use super::super::domain::{CourseId, CourseMembership, ProgressMap, Section, SectionId};
use super::super::unlock::{AvailabilityMap, AvailabilityResult, PrerequisiteEngine};
use super::views::{CourseEntryView, PathLayout, PathProgressSummary, SectionLayoutView};

/// Evaluate availability and arrange the memberships for display.
pub fn build_layout(
    sections: &[Section],
    memberships: &[CourseMembership],
    progress: &ProgressMap,
) -> PathLayout {
    let availability = PrerequisiteEngine::new().evaluate(memberships, progress);
    arrange(sections, memberships, progress, &availability)
}

/// Arrange memberships using an availability map computed by the caller.
///
/// Memberships whose section is unknown are shown with the ungrouped courses.
pub fn arrange(
    sections: &[Section],
    memberships: &[CourseMembership],
    progress: &ProgressMap,
    availability: &AvailabilityMap,
) -> PathLayout {
    let titles: HashMap<&CourseId, &str> = memberships
        .iter()
        .map(|membership| (&membership.course_id, membership.title.as_str()))
        .rev()
        .collect();

    let mut ordered_sections: Vec<&Section> = sections.iter().collect();
    ordered_sections.sort_by_key(|section| section.order);

    let mut ordered_memberships: Vec<&CourseMembership> = memberships.iter().collect();
    ordered_memberships.sort_by_key(|membership| membership.order);

    let mut grouped: HashMap<&SectionId, Vec<CourseEntryView>> = HashMap::new();
    let mut ungrouped = Vec::new();
    let mut summary = PathProgressSummary::default();

    for membership in ordered_memberships {
        let result = availability
            .get(&membership.id)
            .cloned()
            .unwrap_or_else(AvailabilityResult::unlocked);
        let entry = course_entry(membership, result, progress, &titles);

        summary.total += 1;
        if entry.locked {
            summary.locked += 1;
        } else {
            summary.unlocked += 1;
        }
        if entry.completed {
            summary.completed += 1;
        }

        let known_section = membership
            .section_id
            .as_ref()
            .filter(|section_id| sections.iter().any(|section| &section.id == *section_id));
        match known_section {
            Some(section_id) => grouped.entry(section_id).or_default().push(entry),
            None => ungrouped.push(entry),
        }
    }

    let sections = ordered_sections
        .into_iter()
        .map(|section| SectionLayoutView {
            section_id: section.id.clone(),
            name: section.name.clone(),
            order: section.order,
            courses: grouped.remove(&section.id).unwrap_or_default(),
        })
        .collect();

    PathLayout {
        sections,
        ungrouped,
        summary,
    }
}

fn course_entry(
    membership: &CourseMembership,
    availability: AvailabilityResult,
    progress: &ProgressMap,
    titles: &HashMap<&CourseId, &str>,
) -> CourseEntryView {
    let snapshot = progress.get(&membership.course_id);
    let dependency_title = availability
        .dependency
        .as_ref()
        .and_then(|course_id| titles.get(course_id).copied());

    CourseEntryView {
        membership_id: membership.id.clone(),
        course_id: membership.course_id.clone(),
        title: membership.title.clone(),
        order: membership.order,
        locked: availability.locked,
        reason: availability.reason,
        reason_label: availability.reason.label(),
        hint: availability.summary(dependency_title),
        completed: snapshot.map(|snapshot| snapshot.completed).unwrap_or(false),
        score: snapshot.and_then(|snapshot| snapshot.score),
        availability,
    }
}
