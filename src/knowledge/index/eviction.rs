//! Victim selection shared by byte-bounded and count-bounded eviction.

/// Outcome of a reclaim plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReclaimPlan<Id> {
    /// Ids to delete, in eviction order.
    pub victims: Vec<Id>,
    /// Bytes released by deleting every victim.
    pub freed: usize,
}

/// Walk `candidates` in order, taking victims until `required` bytes are freed.
///
/// Stops as soon as the threshold is met. Candidates must already be sorted
/// in eviction order.
///
/// # Errors
/// Returns the total reclaimable bytes when every candidate together still
/// falls short of `required`.
pub fn plan_reclaim<Id, I>(candidates: I, required: usize) -> Result<ReclaimPlan<Id>, usize>
where
    I: IntoIterator<Item = (Id, usize)>,
{
    let mut plan = ReclaimPlan {
        victims: Vec::new(),
        freed: 0,
    };

    for (id, size) in candidates {
        if plan.freed >= required {
            break;
        }
        plan.victims.push(id);
        plan.freed = plan.freed.saturating_add(size);
    }

    if plan.freed >= required {
        Ok(plan)
    } else {
        Err(plan.freed)
    }
}

/// Pick the item with the lowest score; ties go to the smallest tiebreak key.
pub fn select_lowest<T, K, I, F>(items: I, key: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    K: Ord,
    F: Fn(&T) -> (f64, K),
{
    items
        .into_iter()
        .map(|item| {
            let (score, tiebreak) = key(&item);
            (score, tiebreak, item)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, _, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_stops_once_requirement_met() {
        let plan = plan_reclaim(vec![("a", 400), ("b", 400), ("c", 400)], 200).unwrap();
        assert_eq!(plan.victims, vec!["a"]);
        assert_eq!(plan.freed, 400);

        let plan = plan_reclaim(vec![("a", 100), ("b", 100), ("c", 100)], 150).unwrap();
        assert_eq!(plan.victims, vec!["a", "b"]);
    }

    #[test]
    fn test_plan_zero_requirement_takes_nothing() {
        let plan = plan_reclaim(vec![("a", 10)], 0).unwrap();
        assert!(plan.victims.is_empty());
        assert_eq!(plan.freed, 0);
    }

    #[test]
    fn test_plan_reports_shortfall() {
        assert_eq!(plan_reclaim(vec![("a", 10), ("b", 5)], 100), Err(15));
        assert_eq!(plan_reclaim(Vec::<(u8, usize)>::new(), 1), Err(0));
    }

    #[test]
    fn test_select_lowest_with_tiebreak() {
        let items = vec![("x", 0.5, 2), ("y", 0.2, 9), ("z", 0.2, 1)];
        let picked = select_lowest(items, |(_, score, tie)| (*score, *tie));
        assert_eq!(picked.map(|(name, _, _)| name), Some("z"));

        let none: Option<(u8, f64)> = select_lowest(Vec::new(), |(_, s): &(u8, f64)| (*s, 0));
        assert!(none.is_none());
    }
}
