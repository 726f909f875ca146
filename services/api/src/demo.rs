use crate::infra::{load_path_definition, InMemoryLearningPathRepository};
use clap::Args;
use coursepath::config::{AppConfig, PathPolicyConfig};
use coursepath::error::AppError;
use coursepath::gradebook::GradebookImporter;
use coursepath::learning_paths::{
    build_layout, progress_map, CourseEntryView, CourseId, LearnerProgressSnapshot, LearningPath,
    LearningPathService, NewCourseMembership, NewSection, PathLayout, ProgressMap, UnlockSettings,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct PathReportArgs {
    /// JSON learning path definition (name, sections, courses with unlock settings)
    #[arg(long)]
    pub(crate) path_file: PathBuf,
    /// Optional gradebook CSV export with the learner's progress
    #[arg(long)]
    pub(crate) progress_csv: Option<PathBuf>,
    /// Print the unlock hint under every course
    #[arg(long)]
    pub(crate) list_hints: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Score the demo learner earned in the introductory course.
    #[arg(long)]
    pub(crate) intro_score: Option<f32>,
    /// Skip the administrator rule-editing portion of the demo.
    #[arg(long)]
    pub(crate) skip_admin: bool,
}

pub(crate) fn run_path_report(args: PathReportArgs) -> Result<(), AppError> {
    let PathReportArgs {
        path_file,
        progress_csv,
        list_hints,
    } = args;

    let policy = AppConfig::load()?.paths;
    let learning_path = load_path_definition(&path_file, policy)?;
    let (progress, imported) = match progress_csv {
        Some(csv) => (GradebookImporter::from_path(csv)?, true),
        None => (ProgressMap::new(), false),
    };

    let layout = build_layout(
        &learning_path.sections,
        &learning_path.memberships,
        &progress,
    );
    render_path_report(&learning_path, &layout, imported, list_hints);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        intro_score,
        skip_admin,
    } = args;
    let intro_score = intro_score.unwrap_or(68.0);

    println!("Learning path demo");
    let repository = Arc::new(InMemoryLearningPathRepository::default());
    let service = LearningPathService::new(repository, PathPolicyConfig::default());

    let path = service.create_path("Data Analyst Track")?;
    let foundations = service.create_section(
        &path.id,
        NewSection {
            name: "Foundations".to_string(),
            order: Some(1),
        },
    )?;
    let applied = service.create_section(
        &path.id,
        NewSection {
            name: "Applied Analysis".to_string(),
            order: Some(2),
        },
    )?;

    let demo_courses = [
        (
            "intro-101",
            "Intro to Data",
            Some(&foundations.id),
            UnlockSettings::default(),
        ),
        (
            "sheets-110",
            "Spreadsheet Skills",
            Some(&foundations.id),
            UnlockSettings::after_course("intro-101"),
        ),
        (
            "stats-201",
            "Applied Statistics",
            Some(&applied.id),
            UnlockSettings::after_score("intro-101", 70),
        ),
        (
            "capstone-300",
            "Capstone Project",
            None,
            UnlockSettings::after_course("stats-201"),
        ),
    ];

    let mut intro_membership = None;
    for (course_id, title, section_id, unlock) in demo_courses {
        let membership = service.add_course(
            &path.id,
            NewCourseMembership {
                course_id: CourseId::from(course_id),
                title: title.to_string(),
                section_id: section_id.cloned(),
                order: None,
                unlock,
            },
        )?;
        if course_id == "intro-101" {
            intro_membership = Some(membership.id);
        }
    }

    let progress = progress_map(vec![LearnerProgressSnapshot {
        course_id: CourseId::from("intro-101"),
        completed: true,
        score: Some(intro_score),
        completed_on: None,
    }]);
    let stored = service.get(&path.id)?;
    let layout = service.layout(&path.id, &progress)?;
    render_path_report(&stored, &layout, false, true);

    if skip_admin {
        return Ok(());
    }

    println!("\nAdministrator rule edits");
    if let Some(intro_id) = intro_membership {
        match service.set_unlock_rule(
            &path.id,
            &intro_id,
            &UnlockSettings::after_course("capstone-300"),
        ) {
            Ok(_) => println!("- Gating Intro to Data on the capstone was accepted"),
            Err(err) => println!("- Gating Intro to Data on the capstone was rejected: {err}"),
        }
    }

    let lowered = service
        .get(&path.id)?
        .memberships
        .into_iter()
        .find(|membership| membership.course_id == CourseId::from("stats-201"));
    if let Some(stats) = lowered {
        let updated = service.set_unlock_rule(
            &path.id,
            &stats.id,
            &UnlockSettings::after_score("intro-101", 60),
        )?;
        println!(
            "- Lowered the Applied Statistics threshold to {}%",
            updated.unlock.min_score().unwrap_or_default()
        );
        let layout = service.layout(&path.id, &progress)?;
        if let Some(entry) = layout.entry(&stats.id) {
            println!("  {}", describe_entry(entry));
        }
    }

    Ok(())
}

pub(crate) fn render_path_report(
    learning_path: &LearningPath,
    layout: &PathLayout,
    imported: bool,
    list_hints: bool,
) {
    println!("Learning path: {} ({})", learning_path.name, learning_path.id);
    if imported {
        println!("Progress source: gradebook CSV import");
    } else {
        println!("Progress source: none provided (learner has not started)");
    }

    let summary = &layout.summary;
    println!(
        "{} courses | {} unlocked | {} locked | {} completed ({:.0}%)",
        summary.total,
        summary.unlocked,
        summary.locked,
        summary.completed,
        summary.completion_pct()
    );

    for section in &layout.sections {
        println!("\n{}", section.name);
        render_entries(&section.courses, list_hints);
    }

    if !layout.ungrouped.is_empty() {
        println!("\nOther courses");
        render_entries(&layout.ungrouped, list_hints);
    }
}

fn render_entries(entries: &[CourseEntryView], list_hints: bool) {
    if entries.is_empty() {
        println!("- (no courses)");
        return;
    }

    for entry in entries {
        println!("- {}", describe_entry(entry));
        if list_hints && entry.locked {
            println!("    {}", entry.hint);
        }
    }
}

fn describe_entry(entry: &CourseEntryView) -> String {
    let state = if entry.completed {
        "completed"
    } else if entry.locked {
        "locked"
    } else {
        "available"
    };
    let score = match entry.score {
        Some(score) => format!(", score {score:.0}%"),
        None => String::new(),
    };
    format!(
        "{} [{}] {} ({}{})",
        entry.title, entry.course_id, state, entry.reason_label, score
    )
}
