use crate::projects::Project;

use log::{debug, info};

// Feature environments are the only projects whose names say this.
const FEATURE_ENV_MARKER: &str = "development";

/// Strips the first two `-`-separated segments off of a project name, e.g.
/// `acme-development-foo-bar` => `foo-bar`. Names with fewer than three
/// segments have an empty tier.
pub(crate) fn tier(display_name: &str) -> &str {
    display_name.splitn(3, '-').nth(2).unwrap_or("")
}

fn is_feature_env(project: &Project) -> bool {
    project.display_name.contains(FEATURE_ENV_MARKER)
}

pub(crate) fn feature_env_tiers(projects: &[Project]) -> Vec<&str> {
    projects
        .iter()
        .filter(|x| is_feature_env(x))
        .map(|x| tier(&x.display_name))
        .collect()
}

/// Picks out the tiers that should actually be torn down from `stale_projects`.
pub(crate) fn reapable_tiers<'a>(stale_projects: &[&'a Project]) -> Vec<&'a str> {
    let mut results = Vec::new();
    for &project in stale_projects {
        if !is_feature_env(project) {
            info!(
                "Ignoring Project {} as it does not appear to be a developer environment.",
                project.display_name
            );
            continue;
        }

        let tier = tier(&project.display_name);
        // `production-foo` is a feature env that happens to be named
        // production; `production` and `productionfoo` are not.
        if tier.starts_with("production") && !tier.starts_with("production-") {
            debug!("Skipping production tier {tier:?}");
            continue;
        }
        results.push(tier);
    }
    results
}
