use crate::model::{AuditResult, Character};
use crate::voices::{get_voice, VOICE_CATALOG};
use std::collections::HashMap;
use std::fmt::Write;

/// Render the final audit report as markdown. Pure formatting over the
/// ranked results; no I/O here.
pub fn render_report(results: &[AuditResult], characters: &[Character]) -> String {
    let character_map: HashMap<&str, &Character> =
        characters.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut report = String::new();
    let _ = writeln!(report, "# Voice Audit Report\n");

    summary_section(&mut report, results);
    assignment_table(&mut report, results);
    top_ten_section(&mut report, results, &character_map);
    distribution_section(&mut report, results);

    report
}

fn summary_section(report: &mut String, results: &[AuditResult]) {
    let scores: Vec<f64> = results.iter().map(|r| r.best_score).collect();
    let avg = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let assigned: std::collections::HashSet<&str> =
        results.iter().map(|r| r.best_voice.as_str()).collect();
    let catalog_size = VOICE_CATALOG.len();
    let coverage = assigned.len() as f64 / catalog_size as f64 * 100.0;

    let _ = writeln!(report, "## Summary\n");
    let _ = writeln!(report, "- **Total Characters Audited**: {}", results.len());
    let _ = writeln!(report, "- **Average Score**: {:.2}/10", avg);
    if !scores.is_empty() {
        let _ = writeln!(report, "- **Score Range**: {:.2} - {:.2}", min, max);
    }
    let _ = writeln!(
        report,
        "- **Voice Coverage**: {}/{} voices ({:.1}%)\n",
        assigned.len(),
        catalog_size,
        coverage
    );
}

fn assignment_table(report: &mut String, results: &[AuditResult]) {
    let _ = writeln!(report, "## Character-Voice Assignments\n");
    let _ = writeln!(
        report,
        "| Rank | Character | Voice | Score | Gender Match | Age Match | Accent Match | Overall | Consistency |"
    );
    let _ = writeln!(
        report,
        "|------|-----------|-------|-------|--------------|-----------|--------------|---------|-------------|"
    );

    for result in results {
        let Some(best) = result
            .evaluations
            .iter()
            .find(|e| e.voice_name == result.best_voice)
        else {
            continue;
        };
        let _ = writeln!(
            report,
            "| {} | {} | {} | {:.2} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |",
            result.rank,
            result.character_name,
            result.best_voice,
            result.best_score,
            f64::from(best.scores.gender),
            f64::from(best.scores.age),
            f64::from(best.scores.accent),
            f64::from(best.scores.overall),
            f64::from(best.scores.consistency),
        );
    }
    let _ = writeln!(report);
}

fn top_ten_section(
    report: &mut String,
    results: &[AuditResult],
    character_map: &HashMap<&str, &Character>,
) {
    let _ = writeln!(report, "## Top 10 Characters\n");
    for result in results.iter().take(10) {
        let _ = writeln!(report, "### {}. {}\n", result.rank, result.character_name);
        if let Some(voice) = get_voice(&result.best_voice) {
            let _ = writeln!(
                report,
                "- **Voice**: {} ({}, {})",
                result.best_voice,
                voice.gender.as_str(),
                voice.age.as_str()
            );
        } else {
            let _ = writeln!(report, "- **Voice**: {}", result.best_voice);
        }
        let _ = writeln!(report, "- **Score**: {:.2}/10", result.best_score);

        let character = character_map.get(result.character_id.as_str());
        let _ = writeln!(
            report,
            "- **Category**: {}",
            character.map(|c| c.category.as_str()).unwrap_or("Unknown")
        );
        let _ = writeln!(
            report,
            "- **Archetype**: {}",
            character.map(|c| c.archetype.as_str()).unwrap_or("Unknown")
        );

        if let Some(best) = result
            .evaluations
            .iter()
            .find(|e| e.voice_name == result.best_voice)
        {
            let _ = writeln!(
                report,
                "- **Scores**: Gender {:.1}, Age {:.1}, Accent {:.1}, Overall {:.1}, Consistency {:.1}",
                f64::from(best.scores.gender),
                f64::from(best.scores.age),
                f64::from(best.scores.accent),
                f64::from(best.scores.overall),
                f64::from(best.scores.consistency),
            );
        }
        let _ = writeln!(report);
    }
}

fn distribution_section(report: &mut String, results: &[AuditResult]) {
    let _ = writeln!(report, "## Voice Distribution\n");
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for result in results {
        *counts.entry(result.best_voice.as_str()).or_insert(0) += 1;
    }
    let mut rows: Vec<(&str, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let _ = writeln!(report, "| Voice | Assigned Count |");
    let _ = writeln!(report, "|-------|----------------|");
    for (voice, count) in rows {
        let _ = writeln!(report, "| {} | {} |", voice, count);
    }
}
