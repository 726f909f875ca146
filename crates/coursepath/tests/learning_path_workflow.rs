//! End-to-end scenarios for prerequisite evaluation through the public crate surface.

use coursepath::learning_paths::{
    build_layout, progress_map, CourseId, CourseMembership, LearnerProgressSnapshot, LockReason,
    MembershipId, PrerequisiteEngine, ProgressMap, UnlockRule,
};

fn membership(id: &str, course: &str, order: i32, unlock: UnlockRule) -> CourseMembership {
    CourseMembership {
        id: MembershipId::from(id),
        course_id: CourseId::from(course),
        title: course.to_uppercase(),
        section_id: None,
        order,
        unlock,
    }
}

fn done(course: &str, score: Option<f32>) -> LearnerProgressSnapshot {
    LearnerProgressSnapshot {
        course_id: CourseId::from(course),
        completed: true,
        score,
        completed_on: None,
    }
}

fn path_a_b() -> Vec<CourseMembership> {
    vec![
        membership("m-a", "A", 1, UnlockRule::None),
        membership(
            "m-b",
            "B",
            2,
            UnlockRule::AfterCourse {
                course_id: CourseId::from("A"),
            },
        ),
    ]
}

fn path_a_c() -> Vec<CourseMembership> {
    vec![
        membership("m-a", "A", 1, UnlockRule::None),
        membership(
            "m-c",
            "C",
            2,
            UnlockRule::AfterScore {
                course_id: CourseId::from("A"),
                min_score: 70,
            },
        ),
    ]
}

#[test]
fn course_unlocks_after_prerequisite_completion() {
    let engine = PrerequisiteEngine::new();
    let results = engine.evaluate(&path_a_b(), &progress_map(vec![done("A", None)]));

    let b = &results[&MembershipId::from("m-b")];
    assert!(!b.locked);
    assert_eq!(b.reason, LockReason::None);
}

#[test]
fn course_locked_when_nothing_started() {
    let engine = PrerequisiteEngine::new();
    let results = engine.evaluate(&path_a_b(), &ProgressMap::new());

    let b = &results[&MembershipId::from("m-b")];
    assert!(b.locked);
    assert_eq!(b.reason, LockReason::LockedAwaitingCompletion);
}

#[test]
fn score_gate_boundary() {
    let engine = PrerequisiteEngine::new();

    let exact = engine.evaluate(&path_a_c(), &progress_map(vec![done("A", Some(70.0))]));
    assert!(!exact[&MembershipId::from("m-c")].locked);

    let short = engine.evaluate(&path_a_c(), &progress_map(vec![done("A", Some(69.0))]));
    let c = &short[&MembershipId::from("m-c")];
    assert!(c.locked);
    assert_eq!(c.reason, LockReason::LockedAwaitingScore);
}

#[test]
fn dependency_outside_path_is_reported_not_raised() {
    let engine = PrerequisiteEngine::new();
    let memberships = vec![membership(
        "m-d",
        "D",
        1,
        UnlockRule::AfterCourse {
            course_id: CourseId::from("elsewhere"),
        },
    )];

    for progress in [
        ProgressMap::new(),
        progress_map(vec![done("elsewhere", Some(100.0)), done("D", None)]),
    ] {
        let results = engine.evaluate(&memberships, &progress);
        let d = &results[&MembershipId::from("m-d")];
        assert!(d.locked);
        assert_eq!(d.reason, LockReason::LockedMissingDependency);
    }
}

#[test]
fn absent_progress_equals_not_started() {
    let engine = PrerequisiteEngine::new();
    let explicit = progress_map(vec![LearnerProgressSnapshot::not_started(CourseId::from(
        "A",
    ))]);

    assert_eq!(
        engine.evaluate(&path_a_c(), &explicit),
        engine.evaluate(&path_a_c(), &ProgressMap::new())
    );
}

#[test]
fn layout_serializes_for_the_presentation_layer() {
    let layout = build_layout(&[], &path_a_c(), &progress_map(vec![done("A", Some(50.0))]));
    let value = serde_json::to_value(&layout).expect("layout serializes");

    assert_eq!(value["ungrouped"][1]["reason"], "locked_awaiting_score");
    assert_eq!(value["ungrouped"][1]["availability"]["min_score"], 70);
    assert_eq!(value["summary"]["completed"], 1);
}
