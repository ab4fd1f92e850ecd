use crate::infra::{build_service, DemoService};
use clap::Args;
use scout_ai::config::RecruitingConfig;
use scout_ai::error::AppError;
use scout_ai::workflows::recruiting::{
    CandidateView, JobDraft, JobId, PipelineStats, ReviewStep, SkillsInput, SourcingOutcome,
};
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Job title for the sample requisition.
    #[arg(long, default_value = "Senior Full-Stack Engineer")]
    pub(crate) title: String,
    /// Comma-separated required skills.
    #[arg(long, default_value = "React, Node.js, AWS")]
    pub(crate) skills: String,
    /// Experience level (Junior, Mid, Senior, Lead).
    #[arg(long, default_value = "Senior")]
    pub(crate) level: String,
    /// Job location.
    #[arg(long, default_value = "Remote")]
    pub(crate) location: String,
    /// Candidates generated per sourcing run.
    #[arg(long, default_value_t = 5)]
    pub(crate) batch_size: usize,
    /// Stop after drafting the pitch instead of sending it.
    #[arg(long)]
    pub(crate) skip_send: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        title,
        skills,
        level,
        location,
        batch_size,
        skip_send,
    } = args;

    let batch_size = batch_size.max(2);
    let config = RecruitingConfig {
        batch_size,
        follow_up_batch_size: batch_size,
        source_on_create: false,
        ..RecruitingConfig::default()
    };
    let service = build_service(config, Duration::ZERO);

    println!("Scout AI review demo");
    let job = service.create_job(JobDraft {
        title,
        description: "Sample requisition created by the CLI demo.".to_string(),
        required_skills: SkillsInput::Csv(skills),
        experience_level: level,
        location,
        company_name: Some("Demo Co".to_string()),
        company_website: None,
    })?;
    println!(
        "Job {}: {} ({}, {}) requiring {}",
        job.id,
        job.title,
        job.experience_level.label(),
        job.location,
        job.required_skills.join(", ")
    );

    let ticket = service.source_more(&job.id)?;
    match ticket.wait().await {
        SourcingOutcome::Completed(report) => println!(
            "\nSourced {} candidates ({} duplicates, {} invalid dropped)",
            report.appended.len(),
            report.duplicates,
            report.invalid
        ),
        SourcingOutcome::Failed(err) => {
            println!("\nSourcing failed: {err}");
            return Ok(());
        }
    }

    let Some(first) = next_candidate(&service, &job.id)? else {
        println!("Queue is empty; nothing to review.");
        return Ok(());
    };
    print_candidate(&first);
    println!("  Decision: reject");

    let second = match service.reject(&job.id, &first.candidate.id)? {
        ReviewStep::Ready(view) => view,
        ReviewStep::Empty => {
            println!("No further candidates.");
            print_stats(&service.stats(&job.id)?);
            return Ok(());
        }
    };
    print_candidate(&second);
    println!("  Decision: accept");

    let accepted = service.accept(&job.id, &second.candidate.id).await?;
    println!("\nDrafted pitch ({})", accepted.pitch.reference);
    println!("  Subject: {}", accepted.pitch.subject);
    for line in accepted.pitch.body.lines() {
        println!("  | {line}");
    }

    if skip_send {
        println!("\nSend skipped; pitch left in editing.");
    } else {
        let sent = service
            .send_pitch(&job.id, &second.candidate.id, &accepted.pitch.reference)
            .await?;
        println!(
            "\nOutreach {}: {}",
            sent.state,
            sent.delivery.as_deref().unwrap_or("no delivery detail")
        );
    }

    print_stats(&service.stats(&job.id)?);
    Ok(())
}

fn next_candidate(service: &DemoService, job_id: &JobId) -> Result<Option<CandidateView>, AppError> {
    Ok(service.advance(job_id)?.candidate().cloned())
}

fn print_candidate(view: &CandidateView) {
    let profile = &view.candidate.profile;
    println!(
        "\n#{} {} ({}) score {}/100",
        view.assessment.rank_position, profile.name, view.candidate.id, view.assessment.score
    );
    println!(
        "  {} at {} | {} years | {}",
        profile.current_role, profile.current_company, profile.years_experience, profile.location
    );
    for highlight in &view.assessment.highlights {
        println!("  - {highlight}");
    }
}

fn print_stats(stats: &PipelineStats) {
    println!("\nPipeline");
    println!(
        "- total {} | pending {} | viewed {} | accepted {} | rejected {} | contacted {}",
        stats.total, stats.pending, stats.viewed, stats.accepted, stats.rejected, stats.contacted
    );
}
