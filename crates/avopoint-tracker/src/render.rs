/*
[INPUT]:  SessionView
[OUTPUT]: Styled terminal text
[POS]:    Presentation layer - terminal rendering
[UPDATE]: When the terminal layout changes
*/

use console::style;

use crate::steps::StepState;
use crate::view::{ProgressView, SessionView};

const BAR_WIDTH: usize = 30;

pub fn render(view: &SessionView) -> String {
    match view {
        SessionView::Collecting { last_error } => {
            let mut out = style("Sélectionnez les quatre documents").bold().to_string();
            if let Some(error) = last_error {
                out.push('\n');
                out.push_str(&style(format!("Erreur: {error}")).red().to_string());
            }
            out
        }
        SessionView::Submitting => style("Envoi des documents...").cyan().to_string(),
        SessionView::Connecting { task_id } => format!(
            "{} {}",
            style("Suivi de la tâche").cyan(),
            style(task_id).dim()
        ),
        SessionView::Progress(progress) => render_progress(progress),
        SessionView::Success { task_id } => format!(
            "{}\n{} {}",
            style("Contestation prête à télécharger").bold().green(),
            style("Tâche").dim(),
            task_id
        ),
        SessionView::Failure { task_id, error } => format!(
            "{}\n{}\n{} {}",
            style("Échec du traitement").bold().red(),
            style(error).red(),
            style("Tâche").dim(),
            task_id
        ),
    }
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

fn render_progress(progress: &ProgressView) -> String {
    let mut lines = vec![
        format!("{}", style(progress_bar(progress.percent)).cyan()),
        format!("{}", style(&progress.message).bold()),
    ];
    for entry in &progress.timeline {
        let line = match entry.state {
            StepState::Completed => format!("  {} {}", style("✓").green(), entry.label),
            StepState::Active => format!(
                "  {} {}",
                style("▸").yellow(),
                style(entry.label).yellow().bold()
            ),
            StepState::Pending => format!("  {} {}", style("·").dim(), style(entry.label).dim()),
        };
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::timeline;
    use rstest::rstest;

    fn plain(view: &SessionView) -> String {
        console::strip_ansi_codes(&render(view)).into_owned()
    }

    #[rstest]
    #[case(0, "[------------------------------]   0%")]
    #[case(40, "[############------------------]  40%")]
    #[case(100, "[##############################] 100%")]
    fn bar_fills_proportionally(#[case] percent: u8, #[case] expected: &str) {
        assert_eq!(progress_bar(percent), expected);
    }

    #[test]
    fn progress_lists_timeline_with_markers() {
        let view = SessionView::Progress(ProgressView {
            task_id: "t1".to_string(),
            percent: 15,
            message: "Extraction OCR de l'avis de contravention".to_string(),
            step_label: "SCANNING_CONTRAVENTION".to_string(),
            timeline: timeline(15),
        });
        let text = plain(&view);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2 + 11);
        assert!(lines[0].ends_with(" 15%"));
        assert_eq!(lines[1], "Extraction OCR de l'avis de contravention");
        assert_eq!(lines[2], "  ✓ Réception et vérification des documents");
        assert_eq!(lines[4], "  ▸ Extraction OCR certificat d'immatriculation");
        assert_eq!(lines[12], "  · Contestation prête à télécharger");
    }

    #[test]
    fn failure_shows_error_verbatim() {
        let text = plain(&SessionView::Failure {
            task_id: "t1".to_string(),
            error: "OCR illisible".to_string(),
        });
        assert!(text.contains("Échec du traitement"));
        assert!(text.contains("OCR illisible"));
        assert!(text.contains("t1"));
    }

    #[test]
    fn collecting_shows_error_only_when_present() {
        let clean = plain(&SessionView::Collecting { last_error: None });
        assert!(!clean.contains("Erreur"));

        let failed = plain(&SessionView::Collecting {
            last_error: Some("Missing required documents: permis".to_string()),
        });
        assert!(failed.contains("Erreur: Missing required documents: permis"));
    }
}
