use crate::models::{BoardStats, Hit, HitType};

pub fn build_stats(hits: &[Hit]) -> BoardStats {
    let rated: Vec<&Hit> = hits.iter().filter(|hit| !hit.ratings.is_empty()).collect();
    let average_rating = if rated.is_empty() {
        0.0
    } else {
        rated.iter().map(|hit| hit.average_rating).sum::<f64>() / rated.len() as f64
    };

    BoardStats {
        total_hits: hits.len(),
        average_rating,
        most_common_type: most_common_type(hits),
    }
}

/// Raw category with the most hits. Among equally common categories the one
/// seen first in list order is reported.
pub fn most_common_type(hits: &[Hit]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for hit in hits {
        match counts.iter_mut().find(|(kind, _)| *kind == hit.kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((hit.kind.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (kind, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((kind, count));
        }
    }
    best.map(|(kind, _)| kind.to_string())
}

pub fn most_common_label(stats: &BoardStats) -> &'static str {
    match &stats.most_common_type {
        Some(kind) => HitType::from_raw(kind).label(),
        None => "None",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HitRow;
    use chrono::Utc;

    fn hit(id: i64, kind: &str, ratings: Vec<u8>) -> Hit {
        Hit::from_row(
            HitRow {
                id,
                reason: format!("hit {id}"),
                kind: kind.to_string(),
                description: None,
                created_at: Utc::now(),
            },
            ratings,
        )
    }

    #[test]
    fn empty_board_has_no_common_type() {
        let stats = build_stats(&[]);
        assert_eq!(stats.total_hits, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(most_common_label(&stats), "None");
    }

    #[test]
    fn average_skips_unrated_hits() {
        let hits = vec![hit(1, "slap", vec![4, 2]), hit(2, "slap", vec![]), hit(3, "poke", vec![5])];
        let stats = build_stats(&hits);
        assert_eq!(stats.total_hits, 3);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.most_common_type.as_deref(), Some("slap"));
        assert_eq!(most_common_label(&stats), "Classic Slap");
    }

    #[test]
    fn ties_report_the_first_seen_type() {
        let hits = vec![hit(1, "pillow", vec![]), hit(2, "poke", vec![]), hit(3, "poke", vec![]), hit(4, "pillow", vec![])];
        assert_eq!(most_common_type(&hits).as_deref(), Some("pillow"));
    }

    #[test]
    fn unknown_types_are_labelled_other() {
        let stats = build_stats(&[hit(1, "trebuchet", vec![])]);
        assert_eq!(most_common_label(&stats), "Other");
    }
}
