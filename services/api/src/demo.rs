use crate::infra::InMemoryAppraisalRepository;
use appraisal::error::AppError;
use appraisal::workflows::appraisal::{
    encode_form, ActorRole, AppraisalService, AppraisalServiceError, AppraisalSettings, Cadre,
    FacultyInputs, FacultyKey, FormKind, InputPolicy, InteractionRecord, InteractionSheet,
    RawEntry, ReviewContext, Rubric, Scorecard, ScoringEngine,
};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding `{"cadre": ..., "forms": {...}}`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// How to treat unusable raw values: clamp (default) or reject
    #[arg(long, default_value = "clamp")]
    pub(crate) policy: InputPolicy,
    /// Print the full scorecard as JSON instead of the summary table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct InteractionCheckArgs {
    /// CSV with columns department,faculty_id,role,marks
    #[arg(long)]
    pub(crate) sheet: PathBuf,
    /// Highest mark a reviewer may give
    #[arg(long, default_value_t = 100.0)]
    pub(crate) ceiling: f64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Department used for the demo record
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Print the stored research document after verification
    #[arg(long)]
    pub(crate) show_document: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let inputs: FacultyInputs = serde_json::from_str(&raw)?;

    let engine = ScoringEngine::new(Rubric::standard(), args.policy);
    let scorecard = engine
        .score(&inputs)
        .map_err(AppraisalServiceError::from)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scorecard)?);
    } else {
        render_scorecard(&scorecard);
    }
    Ok(())
}

pub(crate) fn run_interaction_check(args: InteractionCheckArgs) -> Result<(), AppError> {
    let sheet = InteractionSheet::from_path(&args.sheet)?;

    let mut records: BTreeMap<FacultyKey, InteractionRecord> = BTreeMap::new();
    for row in &sheet.rows {
        records
            .entry(row.key.clone())
            .or_default()
            .record(row.role, row.marks, args.ceiling)
            .map_err(AppraisalServiceError::from)?;
    }

    println!(
        "{} mark(s) for {} faculty member(s)",
        sheet.rows.len(),
        records.len()
    );
    for (key, record) in &records {
        let average = record.average();
        println!(
            "- {}: average {:.2} from {} reviewer(s)",
            key, average.value, average.reviewers
        );
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let department = args.department.unwrap_or_else(|| "CSE".to_string());
    let key = FacultyKey::new(department.clone(), "f-204");

    let repository = Arc::new(InMemoryAppraisalRepository::default());
    let service = AppraisalService::new(repository, AppraisalSettings::default());

    let faculty = ReviewContext::new("f-204", ActorRole::Faculty, department.clone());
    let verifier = ReviewContext::new("v-11", ActorRole::Verifier, department.clone());
    let hod = ReviewContext::new("hod", ActorRole::Hod, department.clone());
    let dean = ReviewContext::new("dean", ActorRole::Dean, "ACADEMICS");
    let external = ReviewContext::new("external", ActorRole::External, "VISITING");

    println!("Faculty appraisal demo ({key})");
    let record = service.save_inputs(&faculty, &key, demo_inputs())?;
    if let Some(scorecard) = &record.scorecard {
        render_scorecard(scorecard);
    }

    service.submit(&faculty, &key)?;
    println!("\nSubmitted -> {}", service.get(&key)?.status.label());

    let record = service.get(&key)?;
    for (form, ledger) in &record.verification {
        for section in ledger.sections() {
            // the verifier only accepts half of the claimed citations
            let score = if section.key == "citations" {
                section.self_reported / 2.0
            } else {
                section.self_reported
            };
            service.verify_section(&verifier, &key, *form, &section.key, score)?;
        }
    }
    service.advance(&verifier, &key)?;
    service.advance(&hod, &key)?;
    service.advance(&hod, &key)?;
    println!("Verification complete -> {}", service.get(&key)?.status.label());

    if args.show_document {
        let record = service.get(&key)?;
        let rubric = service
            .engine()
            .rubric()
            .form(FormKind::Research)
            .map_err(AppraisalServiceError::from)?;
        let scorecard = record
            .scorecard
            .as_ref()
            .and_then(|scorecard| scorecard.form(FormKind::Research));
        if let (Some(scorecard), Some(inputs)) =
            (scorecard, record.inputs.forms.get(&FormKind::Research))
        {
            let document = encode_form(
                rubric,
                inputs,
                scorecard,
                record.verification.get(&FormKind::Research),
            )?;
            println!(
                "\nStored research document:\n{}",
                serde_json::to_string_pretty(&document)?
            );
        }
    }

    service.record_interaction(&hod, &key, 78.0)?;
    service.record_interaction(&dean, &key, 84.0)?;
    service.record_interaction(&external, &key, 72.0)?;

    let summary = service.summary(&key)?;
    println!("\nVerified totals");
    for form in &summary.verified {
        println!(
            "- {}: {:.2} verified -> {:.2} after cadre rules ({})",
            form.form.label(),
            form.verified.total,
            form.capped_total,
            if form.complete { "complete" } else { "pending" }
        );
    }
    if let Some(mark) = summary.final_mark {
        println!(
            "Final mark {:.2} = self-appraisal {:.2} + interaction {:.2} (average {:.2} over {} reviewer(s))",
            mark.value,
            mark.self_appraisal_component,
            mark.interaction_component,
            mark.interaction_average,
            mark.reviewers
        );
    }

    let report = service.department_report(&department)?;
    println!("\nDepartment report\n{}", report.to_csv_string()?);
    Ok(())
}

fn demo_inputs() -> FacultyInputs {
    FacultyInputs::new(Cadre::AssociateProfessor)
        .with_entry(FormKind::Teaching, "contact_hours", RawEntry::count(180))
        .with_entry(FormKind::Teaching, "course_pass_90", RawEntry::count(2))
        .with_entry(FormKind::Teaching, "feedback_good", RawEntry::count(3))
        .with_entry(FormKind::Teaching, "ug_project", RawEntry::count(4))
        .with_entry(FormKind::Teaching, "mentee_group", RawEntry::count(2))
        .with_entry(FormKind::Research, "journal_scopus_wos", RawEntry::count(3))
        .with_entry(FormKind::Research, "conference_other", RawEntry::count(4))
        .with_entry(
            FormKind::Research,
            "citations",
            RawEntry::count("57").with_proof("https://scholar.example.edu/f-204"),
        )
        .with_entry(FormKind::Research, "phd_ongoing", RawEntry::count(2))
        .with_entry(FormKind::Research, "consultancy_amount", RawEntry::amount(250_000))
        .with_entry(FormKind::SelfDevelopment, "fdp_one_week", RawEntry::count(2))
        .with_entry(
            FormKind::SelfDevelopment,
            "professional_membership",
            RawEntry::count(1),
        )
}

fn render_scorecard(scorecard: &Scorecard) {
    println!("Cadre: {}", scorecard.cadre);
    for form in scorecard.forms.values() {
        println!(
            "\n{} (raw {:.2}, rescaled {:.2}, capped {:.2})",
            form.form.label(),
            form.pre_cap_total,
            form.rescaled_total,
            form.capped_total
        );
        for section in form.sections.iter().filter(|section| section.raw_score > 0.0) {
            println!(
                "  {:>2}. {}: {:.2} (claimed {:.2})",
                section.index, section.label, section.capped_score, section.raw_score
            );
        }
        for adjustment in &form.adjustments {
            println!(
                "  ! {}: {} -> scored as {}",
                adjustment.category, adjustment.issue, adjustment.applied
            );
        }
    }
    println!("\nSelf-reported total: {:.2}", scorecard.self_reported_total);
}
