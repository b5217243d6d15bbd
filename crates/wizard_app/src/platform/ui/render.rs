use wizard_core::{AppViewModel, SubmissionPhase};

/// Renders the wizard as plain text lines for the terminal.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(view.rows.len() + 6);
    lines.push(format!(
        "== {} :: step {}/{} {} ==",
        view.title,
        view.step_index + 1,
        view.step_count,
        view.step_title
    ));

    if let Some(score) = view.score {
        let pending = if view.scoring_in_flight { " (updating)" } else { "" };
        lines.push(format!("Live grade: {score}%{pending}"));
    }

    for row in &view.rows {
        let marker = if row.invalid { "!" } else { " " };
        let value = if row.value.is_empty() { "-" } else { row.value.as_str() };
        lines.push(format!("{marker} {:<32} {value}", row.field.to_string()));
    }

    if !view.invalid.is_empty() {
        let names: Vec<String> = view.invalid.iter().map(ToString::to_string).collect();
        lines.push(format!("Required: {}", names.join(", ")));
    }
    if let Some(notice) = &view.notice {
        lines.push(notice.clone());
    }
    if let Some(error) = &view.submit_error {
        lines.push(format!("Error: {error}"));
    }

    lines.push(
        match &view.phase {
            SubmissionPhase::Editing if view.is_final_step => "[back] [submit]",
            SubmissionPhase::Editing => "[back] [next]",
            SubmissionPhase::Submitting => "Submitting...",
            SubmissionPhase::Done { .. } => "Submitted.",
        }
        .to_string(),
    );
    lines
}
