use crate::projects::{DestroyerBehaviour, ModifiedDate, Project};

use std::collections::HashSet;

use chrono::NaiveDate;
use log::info;

/// Projects without a `destroyer_behaviour` label are treated as if they asked
/// to be ignored.
pub(crate) fn is_ignored(project: &Project) -> bool {
    let behaviour = &project.labels.behaviour;
    let ignored = matches!(behaviour, None | Some(DestroyerBehaviour::Ignore));
    if ignored {
        info!(
            "{} is set to be ignored due to 'destroyer_behaviour' label: {}",
            project.display_name,
            behaviour.as_ref().map_or("ignore", |x| x.as_str())
        );
    }
    ignored
}

pub(crate) fn should_reap_based_on_labels(
    display_name: &str,
    behaviour: Option<&DestroyerBehaviour>,
    modified_date: Option<&ModifiedDate>,
) -> bool {
    let Some(behaviour) = behaviour else {
        if modified_date.is_none() {
            info!("{display_name} has labels but is missing destroyer labels, will not be reaped!");
            return false;
        }
        return true;
    };

    match behaviour {
        DestroyerBehaviour::Ignore | DestroyerBehaviour::NoReap => {
            info!(
                "{display_name} is set to {} destroyer behaviour and will not be reaped",
                behaviour.as_str()
            );
            false
        }
        DestroyerBehaviour::Reap | DestroyerBehaviour::Other(_) => true,
    }
}

/// Calendar days between `modified_date` and `today`, minus the working days
/// in `[modified_date, today]`. What's left over is (roughly) the number of
/// weekend days and holidays in that range; this is the number reaping has
/// always been keyed off of, so keep it.
pub(crate) fn working_days_without_deployment(
    modified_date: NaiveDate,
    today: NaiveDate,
    holidays: &HashSet<NaiveDate>,
) -> i64 {
    let elapsed_days = (today - modified_date).num_days();
    elapsed_days
        - bank_holidays::count_non_weekend_non_holiday_days(modified_date, today, holidays)
}

pub(crate) fn is_stale(
    project: &Project,
    holidays: &HashSet<NaiveDate>,
    inactive_days_for_reaping: i64,
    today: NaiveDate,
) -> bool {
    let display_name = &*project.display_name;
    let labels = &project.labels;
    // Unreachable in practice, since `is_ignored` filters these out first.
    if !labels.has_any {
        info!("{display_name} has no labels and should be reaped");
        return true;
    }

    let behaviour = labels.behaviour.as_ref();
    let modified_date = labels.modified_date.as_ref();
    if !should_reap_based_on_labels(display_name, behaviour, modified_date) {
        return false;
    }

    let modified_date = match modified_date {
        None => {
            info!("{display_name} is missing modified_date, will not be reaped!");
            return false;
        }
        Some(ModifiedDate::Invalid(x)) => {
            info!(
                "{display_name} has an invalid modified_date format ({x:?}), will not be reaped!"
            );
            return false;
        }
        Some(ModifiedDate::Valid(x)) => *x,
    };

    let idle_days = working_days_without_deployment(modified_date, today, holidays);
    let stale = idle_days > inactive_days_for_reaping;
    if stale {
        info!(
            "{display_name} should be reaped. It has not been deployed to for {idle_days} days. \
             The last modified date is: {modified_date}. The 'destroyer_behaviour' label is set \
             to '{}'",
            behaviour.map_or("None", |x| x.as_str())
        );
    }
    stale
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn test_holidays() -> HashSet<NaiveDate> {
        HashSet::from([date("2022-01-03")])
    }

    #[test]
    fn test_is_ignored_defaults_to_ignoring() {
        assert!(is_ignored(&Project::with_labels("p", &[])));
        assert!(is_ignored(&Project::with_labels("p", &[("team", "x")])));
        assert!(is_ignored(&Project::with_labels(
            "p",
            &[("destroyer_behaviour", "ignore")]
        )));

        assert!(!is_ignored(&Project::with_labels(
            "p",
            &[("destroyer_behaviour", "reap")]
        )));
        assert!(!is_ignored(&Project::with_labels(
            "p",
            &[("destroyer_behaviour", "no-reap")]
        )));
        assert!(!is_ignored(&Project::with_labels(
            "p",
            &[("destroyer_behaviour", "something-else")]
        )));
    }

    #[test]
    fn test_should_reap_based_on_labels() {
        let valid_date = ModifiedDate::Valid(date("2022-01-01"));
        let reap = |b: Option<&DestroyerBehaviour>, d: Option<&ModifiedDate>| {
            should_reap_based_on_labels("Test project", b, d)
        };

        assert!(!reap(None, None));
        assert!(!reap(Some(&DestroyerBehaviour::Ignore), Some(&valid_date)));
        assert!(!reap(Some(&DestroyerBehaviour::Ignore), None));
        assert!(!reap(Some(&DestroyerBehaviour::NoReap), Some(&valid_date)));
        assert!(reap(Some(&DestroyerBehaviour::Reap), Some(&valid_date)));
        assert!(reap(Some(&DestroyerBehaviour::Reap), None));
        assert!(reap(None, Some(&valid_date)));
        assert!(reap(
            Some(&DestroyerBehaviour::Other("whatever".into())),
            None
        ));
    }

    #[test]
    fn test_working_days_without_deployment() {
        // 9 elapsed days, 5 of which are working days.
        assert_eq!(
            working_days_without_deployment(date("2022-01-01"), date("2022-01-10"), &test_holidays()),
            4
        );
        assert_eq!(
            working_days_without_deployment(date("2022-01-10"), date("2022-01-10"), &test_holidays()),
            -1
        );
        // Modified dates in the future never look idle.
        assert!(
            working_days_without_deployment(date("2022-02-01"), date("2022-01-10"), &test_holidays())
                < 0
        );
    }

    #[test]
    fn test_is_stale_far_in_the_future() {
        let project = Project::with_labels(
            "Test project",
            &[("destroyer_behaviour", "reap"), ("modified_date", "2022-01-01")],
        );
        assert!(is_stale(&project, &test_holidays(), 2, date("2023-01-01")));
    }

    #[test]
    fn test_is_stale_threshold_is_exclusive() {
        let project = Project::with_labels(
            "Test project",
            &[("destroyer_behaviour", "reap"), ("modified_date", "2022-01-01")],
        );
        let today = date("2022-01-10");
        assert!(is_stale(&project, &test_holidays(), 3, today));
        assert!(!is_stale(&project, &test_holidays(), 4, today));
    }

    #[test]
    fn test_is_stale_respects_labels() {
        fn stale(labels: &[(&str, &str)]) -> bool {
            let project = Project::with_labels("p", labels);
            is_stale(&project, &test_holidays(), 2, date("2023-01-01"))
        }

        // Unreachable from the pipeline, but no labels at all means stale.
        assert!(stale(&[]));
        assert!(!stale(&[("team", "x")]));
        assert!(!stale(&[
            ("destroyer_behaviour", "no-reap"),
            ("modified_date", "2022-01-01")
        ]));
        assert!(!stale(&[
            ("destroyer_behaviour", "ignore"),
            ("modified_date", "2022-01-01")
        ]));
        assert!(!stale(&[("destroyer_behaviour", "reap")]));
        assert!(!stale(&[
            ("destroyer_behaviour", "reap"),
            ("modified_date", "yesterday")
        ]));
        assert!(!stale(&[("modified_date", "2022/01/01")]));
        assert!(!stale(&[
            ("destroyer_behaviour", "reap"),
            ("modified_date", "22-01-01")
        ]));
        assert!(!stale(&[("modified_date", "202-01-01")]));
        assert!(stale(&[("modified_date", "2022-01-01")]));
        assert!(stale(&[
            ("destroyer_behaviour", "custom"),
            ("modified_date", "2022-01-01")
        ]));
    }

    #[test]
    fn test_is_stale_is_repeatable() {
        let project = Project::with_labels(
            "p",
            &[("destroyer_behaviour", "reap"), ("modified_date", "2022-01-01")],
        );
        let today = date("2022-01-10");
        let first = is_stale(&project, &test_holidays(), 3, today);
        for _ in 0..3 {
            assert_eq!(is_stale(&project, &test_holidays(), 3, today), first);
        }
    }
}
