use crate::infra::{CatalogArgs, PlannerBackend, PlannerService};
use chrono::{Local, NaiveDate};
use clap::Args;
use degree_planner::config::AppConfig;
use degree_planner::error::AppError;
use degree_planner::planning::{
    CourseId, EligibilityReport, MajorKey, MajorProgress, RequirementMode, StudentId,
};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Args, Debug)]
pub(crate) struct EligibilityArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Student identifier
    #[arg(long)]
    pub(crate) student: u64,
    /// Course identifier to evaluate
    #[arg(long)]
    pub(crate) course: u64,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ProgressArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Student identifier
    #[arg(long)]
    pub(crate) student: u64,
    /// Limit the report to one declared major (e.g. CS_BS)
    #[arg(long, value_parser = crate::infra::parse_major_key)]
    pub(crate) major: Option<MajorKey>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_eligibility(args: EligibilityArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let backend = PlannerBackend::load(&args.catalog, &config.planner)?;
    let service = backend.service(&config.planner);

    let student = StudentId(args.student);
    let report = service.eligibility(student, CourseId(args.course))?;

    if args.json {
        print_json(&report);
    } else {
        print!(
            "{}",
            render_eligibility(student, &report, Local::now().date_naive())
        );
    }
    Ok(())
}

pub(crate) fn run_progress(args: ProgressArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let backend = PlannerBackend::load(&args.catalog, &config.planner)?;
    let service = backend.service(&config.planner);

    let student = StudentId(args.student);
    let progress = collect_progress(&service, student, args.major.as_ref())?;

    if args.json {
        print_json(&progress);
    } else {
        print!(
            "{}",
            render_progress(student, &progress, Local::now().date_naive())
        );
    }
    Ok(())
}

fn collect_progress(
    service: &PlannerService,
    student: StudentId,
    major: Option<&MajorKey>,
) -> Result<Vec<MajorProgress>, AppError> {
    let progress = match major {
        Some(key) => vec![service.major_progress(student, key)?],
        None => service.overall_progress(student)?,
    };
    Ok(progress)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => println!("JSON report unavailable: {}", err),
    }
}

fn render_eligibility(student: StudentId, report: &EligibilityReport, today: NaiveDate) -> String {
    let mut out = String::new();
    let course = &report.course;
    let _ = writeln!(out, "Eligibility report ({})", today.format("%Y-%m-%d"));
    let _ = writeln!(
        out,
        "- Student {} -> {} {} ({} credits)",
        student,
        course.code(),
        course.title,
        course.credits
    );
    let _ = writeln!(
        out,
        "- Prerequisites: {}",
        report.expression.as_deref().unwrap_or("none")
    );

    if report.eligible {
        let _ = writeln!(out, "- Status: eligible");
        return out;
    }

    let _ = writeln!(out, "- Status: not eligible");
    let _ = writeln!(out, "Missing prerequisites:");
    for missing in &report.missing_prerequisites {
        let _ = writeln!(
            out,
            "  - {} {} ({} credits)",
            missing.code(),
            missing.title,
            missing.credits
        );
    }
    out
}

fn render_progress(student: StudentId, progress: &[MajorProgress], today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Degree progress for student {} ({})",
        student,
        today.format("%Y-%m-%d")
    );

    if progress.is_empty() {
        let _ = writeln!(out, "- No declared majors");
        return out;
    }

    for major in progress {
        let _ = writeln!(
            out,
            "\n{} {}: {}/{} credits ({:.1}%), {} remaining",
            major.major,
            major.name,
            major.credits_completed,
            major.total_credits_required,
            major.percent_complete,
            major.credits_remaining
        );
        for requirement in &major.requirements {
            let rule = match requirement.mode {
                RequirementMode::CreditThreshold { min_credits } => {
                    format!("{} credits from list", min_credits)
                }
                RequirementMode::Enumeration => "all listed courses".to_string(),
            };
            let _ = writeln!(
                out,
                "  - [{}] {} ({}): {} credits done, {} to go",
                requirement.status.label(),
                requirement.name,
                rule,
                requirement.credits_completed,
                requirement.credits_remaining
            );
            if !requirement.is_complete() && !requirement.remaining_courses.is_empty() {
                let remaining: Vec<String> = requirement
                    .remaining_courses
                    .iter()
                    .map(|course| course.code())
                    .collect();
                let _ = writeln!(out, "      options: {}", remaining.join(", "));
            }
        }
    }
    out
}
