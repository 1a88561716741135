//! Pure scoring functions for relevance recall, forgetting, and decay.
//!
//! Every function takes `now` explicitly; none reads the clock.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::knowledge::core::config::ScoringConfig;
use crate::knowledge::recall::entry::MemoryEntry;

const MS_PER_HOUR: f64 = 3_600_000.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Hours elapsed from `then` to `now`, never negative.
#[must_use]
pub fn elapsed_hours(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    let ms = now.signed_duration_since(then).num_milliseconds().max(0);
    #[allow(clippy::cast_precision_loss)]
    let ms = ms as f64;
    ms / MS_PER_HOUR
}

/// Days elapsed from `then` to `now`, never negative.
#[must_use]
pub fn elapsed_days(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    elapsed_hours(now, then) / HOURS_PER_DAY
}

/// Fraction of query words found in the lower-cased JSON text of `content`.
///
/// An empty or whitespace-only query scores 0.
#[must_use]
pub fn content_similarity(content: &Value, query: &str) -> f64 {
    let haystack = content.to_string().to_lowercase();
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let matches = words.iter().filter(|word| haystack.contains(**word)).count();
    ratio(matches, words.len())
}

/// Overlap of associations with the caller's context.
///
/// `|associations ∩ context| / max(|associations|, |context|)`, 0 when both
/// sides are empty.
#[must_use]
pub fn context_match(associations: &BTreeSet<String>, context: &BTreeSet<String>) -> f64 {
    let denominator = associations.len().max(context.len());
    if denominator == 0 {
        return 0.0;
    }
    ratio(associations.intersection(context).count(), denominator)
}

/// Exponential recency decay `exp(-hours / scale_hours)`.
#[must_use]
pub fn recency(now: DateTime<Utc>, last_accessed: DateTime<Utc>, scale_hours: f64) -> f64 {
    (-elapsed_hours(now, last_accessed) / scale_hours).exp()
}

/// Weighted relevance of `entry` for a query and optional context.
#[must_use]
pub fn relevance(
    entry: &MemoryEntry,
    query: &str,
    context: Option<&BTreeSet<String>>,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> f64 {
    let content = content_similarity(&entry.content, query);
    let context_score = context.map_or(0.0, |ctx| context_match(&entry.associations, ctx));
    let intrinsic = entry.importance * entry.confidence;
    let recent = recency(now, entry.last_accessed, config.recency_scale_hours);

    config.recency_weight.mul_add(
        recent,
        config.intrinsic_weight.mul_add(
            intrinsic,
            config
                .context_weight
                .mul_add(context_score, config.content_weight * content),
        ),
    )
}

/// Retention score; the lowest-scoring entry is forgotten first.
#[must_use]
pub fn forget_score(entry: &MemoryEntry, now: DateTime<Utc>, recency_scale_hours: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let usage = (entry.access_count as f64 / 100.0).min(1.0);
    let recent = recency(now, entry.last_accessed, recency_scale_hours);

    0.1_f64.mul_add(
        recent,
        0.2_f64.mul_add(
            usage,
            0.4_f64.mul_add(entry.importance, 0.3 * entry.confidence),
        ),
    )
}

/// Recomputed importance from current importance, usage rate and how
/// connected the entry's associations are.
///
/// `bucket_total` is the sum of association bucket sizes across the
/// entry's tags.
#[must_use]
pub fn decayed_importance(entry: &MemoryEntry, bucket_total: usize, now: DateTime<Utc>) -> f64 {
    let age_days = elapsed_days(now, entry.created).max(1.0);
    #[allow(clippy::cast_precision_loss)]
    let access_frequency = entry.access_count as f64 / age_days;

    let association_strength = if entry.associations.is_empty() {
        0.0
    } else {
        ratio(bucket_total, 10 * entry.associations.len()).min(1.0)
    };

    0.3_f64
        .mul_add(
            association_strength,
            0.4_f64.mul_add(entry.importance, 0.3 * access_frequency),
        )
        .clamp(0.0, 1.0)
}

/// Recomputed confidence, decaying with time since modification and
/// floored at 0.5.
#[must_use]
pub fn decayed_confidence(entry: &MemoryEntry, now: DateTime<Utc>) -> f64 {
    let days = elapsed_days(now, entry.modified);
    (entry.confidence * (-days / 30.0).exp()).clamp(0.5, 1.0)
}

/// Whether the cleanup rules drop `entry`.
#[must_use]
pub fn should_cleanup(entry: &MemoryEntry, now: DateTime<Utc>) -> bool {
    let age_days = elapsed_days(now, entry.created);
    (age_days > 90.0 && entry.importance < 0.2)
        || entry.confidence < 0.3
        || (age_days > 180.0 && entry.access_count == 0)
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::core::ids::MemoryId;
    use crate::knowledge::recall::entry::MemoryKind;
    use chrono::Duration;
    use serde_json::json;

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn entry(now: DateTime<Utc>) -> MemoryEntry {
        MemoryEntry {
            id: MemoryId::new(),
            kind: MemoryKind::Concept,
            content: json!({"name": "Empresyonizm", "painter": "Monet"}),
            associations: tags(&["sanat", "stil"]),
            importance: 0.5,
            confidence: 0.8,
            last_accessed: now,
            access_count: 0,
            created: now,
            modified: now,
        }
    }

    #[test]
    fn test_content_similarity_counts_substring_words() {
        let content = json!({"name": "Empresyonizm", "painter": "Monet"});
        assert!((content_similarity(&content, "monet") - 1.0).abs() < 1e-12);
        assert!((content_similarity(&content, "Monet Picasso") - 0.5).abs() < 1e-12);
        assert!(content_similarity(&content, "   ").abs() < f64::EPSILON);
        assert!(content_similarity(&content, "").abs() < f64::EPSILON);
    }

    #[test]
    fn test_context_match() {
        let assoc = tags(&["sanat", "tarih", "stil"]);
        assert!((context_match(&assoc, &tags(&["sanat"])) - 1.0 / 3.0).abs() < 1e-12);
        assert!((context_match(&assoc, &assoc) - 1.0).abs() < 1e-12);
        assert!(context_match(&BTreeSet::new(), &BTreeSet::new()).abs() < f64::EPSILON);
        assert!(context_match(&BTreeSet::new(), &tags(&["x"])).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recency_decays_with_scale() {
        let now = Utc::now();
        assert!((recency(now, now, 720.0) - 1.0).abs() < 1e-12);
        let month_ago = now - Duration::hours(720);
        assert!((recency(now, month_ago, 720.0) - (-1.0_f64).exp()).abs() < 1e-9);
        // Future timestamps count as zero elapsed time.
        assert!((recency(now, now + Duration::hours(5), 720.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_relevance_weights_components() {
        let now = Utc::now();
        let e = entry(now);
        let config = ScoringConfig::default();

        let no_context = relevance(&e, "monet", None, &config, now);
        let expected = 0.4 + 0.2 * 0.5 * 0.8 + 0.1;
        assert!((no_context - expected).abs() < 1e-9);

        let ctx = tags(&["sanat", "stil"]);
        let with_context = relevance(&e, "monet", Some(&ctx), &config, now);
        assert!((with_context - (expected + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_more_recent_entry_never_ranks_lower() {
        let now = Utc::now();
        let config = ScoringConfig::default();
        let mut older = entry(now);
        older.last_accessed = now - Duration::days(10);
        let newer = MemoryEntry {
            last_accessed: now - Duration::days(1),
            ..older.clone()
        };
        assert!(
            relevance(&newer, "monet", None, &config, now)
                >= relevance(&older, "monet", None, &config, now)
        );
    }

    #[test]
    fn test_forget_score_caps_usage() {
        let now = Utc::now();
        let mut e = entry(now);
        e.access_count = 1000;
        let capped = forget_score(&e, now, 720.0);
        let expected = 0.4 * 0.5 + 0.3 * 0.8 + 0.2 + 0.1;
        assert!((capped - expected).abs() < 1e-9);
    }

    #[test]
    fn test_decayed_importance_uses_min_one_day_age() {
        let now = Utc::now();
        let mut e = entry(now);
        e.access_count = 1;
        // Brand new entry: age is treated as one day.
        let importance = decayed_importance(&e, 2, now);
        let expected = 0.4 * 0.5 + 0.3 * 1.0 + 0.3 * (2.0 / 20.0);
        assert!((importance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_decayed_importance_is_clamped() {
        let now = Utc::now();
        let mut e = entry(now);
        e.access_count = 50;
        e.importance = 1.0;
        assert!((decayed_importance(&e, 100, now) - 1.0).abs() < f64::EPSILON);

        e.associations.clear();
        e.access_count = 0;
        e.importance = 0.0;
        assert!(decayed_importance(&e, 0, now).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decayed_confidence_has_floor() {
        let now = Utc::now();
        let mut e = entry(now - Duration::days(365));
        e.confidence = 0.9;
        assert!((decayed_confidence(&e, now) - 0.5).abs() < f64::EPSILON);

        let fresh = entry(now);
        assert!((decayed_confidence(&fresh, now) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_cleanup_rules() {
        let now = Utc::now();

        let mut stale = entry(now - Duration::days(91));
        stale.importance = 0.1;
        stale.access_count = 3;
        assert!(should_cleanup(&stale, now));

        let mut doubtful = entry(now);
        doubtful.confidence = 0.2;
        assert!(should_cleanup(&doubtful, now));

        let unused = entry(now - Duration::days(181));
        assert!(should_cleanup(&unused, now));

        let mut kept = entry(now - Duration::days(181));
        kept.access_count = 1;
        assert!(!should_cleanup(&kept, now));
    }
}
