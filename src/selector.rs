use crate::store::CharacterRecord;
use log::info;

/// Pick a diverse audit sample: up to half the target from Human
/// characters, up to half from Fantasy, remainder filled from whatever is
/// left in listing order, capped at `target`.
pub fn select_diverse(records: &[CharacterRecord], target: usize) -> Vec<CharacterRecord> {
    let is_category = |r: &CharacterRecord, cat: &str| r.category.eq_ignore_ascii_case(cat);

    let humans: Vec<&CharacterRecord> =
        records.iter().filter(|r| is_category(r, "Human")).collect();
    let fantasy: Vec<&CharacterRecord> = records
        .iter()
        .filter(|r| is_category(r, "Fantasy"))
        .collect();

    let per_category = target / 2;
    let mut selected: Vec<CharacterRecord> = Vec::with_capacity(target);

    for record in humans.iter().take(per_category) {
        selected.push((*record).clone());
    }
    for record in fantasy.iter().take(per_category) {
        selected.push((*record).clone());
    }

    // Fill remaining slots from any category, keeping listing order.
    for record in records {
        if selected.len() >= target {
            break;
        }
        if !selected.iter().any(|s| s.id == record.id) {
            selected.push(record.clone());
        }
    }

    info!(
        "Selected {} of {} characters for audit",
        selected.len(),
        records.len()
    );
    selected
}
