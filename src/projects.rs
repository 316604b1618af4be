use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::debug;
use serde::Deserialize;

lazy_static! {
    static ref HOST: reqwest::Url = reqwest::Url::parse("https://cloudresourcemanager.googleapis.com")
        .expect("parsing resource manager URL");
}

const BEHAVIOUR_LABEL: &str = "destroyer_behaviour";
const MODIFIED_DATE_LABEL: &str = "modified_date";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DestroyerBehaviour {
    Ignore,
    NoReap,
    Reap,
    // Anything else someone decided to type into the label.
    Other(Box<str>),
}

impl DestroyerBehaviour {
    fn parse(s: &str) -> Self {
        match s {
            "ignore" => Self::Ignore,
            "no-reap" => Self::NoReap,
            "reap" => Self::Reap,
            x => Self::Other(x.into()),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::Ignore => "ignore",
            Self::NoReap => "no-reap",
            Self::Reap => "reap",
            Self::Other(x) => x.as_ref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ModifiedDate {
    Valid(NaiveDate),
    // Kept so we can complain about it later; these are never reaped.
    Invalid(Box<str>),
}

impl ModifiedDate {
    fn parse(s: &str) -> Self {
        match bank_holidays::parse_ymd_date(s) {
            Ok(x) => Self::Valid(x),
            Err(_) => Self::Invalid(s.into()),
        }
    }
}

/// The labels of a project that matter for reaping, pulled out of GCP's label
/// map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProjectLabels {
    /// Whether the project had any labels at all, including ones we don't care
    /// about.
    pub(crate) has_any: bool,
    pub(crate) behaviour: Option<DestroyerBehaviour>,
    pub(crate) modified_date: Option<ModifiedDate>,
}

impl ProjectLabels {
    pub(crate) fn from_labels(labels: &HashMap<String, String>) -> Self {
        Self {
            has_any: !labels.is_empty(),
            behaviour: labels
                .get(BEHAVIOUR_LABEL)
                .map(|x| DestroyerBehaviour::parse(x)),
            modified_date: labels.get(MODIFIED_DATE_LABEL).map(|x| ModifiedDate::parse(x)),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Project {
    pub(crate) display_name: Box<str>,
    pub(crate) labels: ProjectLabels,
}

#[cfg(test)]
impl Project {
    pub(crate) fn with_labels(display_name: &str, labels: &[(&str, &str)]) -> Self {
        let labels = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            display_name: display_name.into(),
            labels: ProjectLabels::from_labels(&labels),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    project_id: String,
    display_name: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListProjectsPage {
    // Omitted entirely when a page is empty.
    #[serde(default)]
    projects: Vec<RawProject>,
    #[serde(default)]
    next_page_token: String,
}

impl From<RawProject> for Project {
    fn from(raw: RawProject) -> Self {
        Self {
            display_name: raw.display_name.unwrap_or(raw.project_id).into(),
            labels: ProjectLabels::from_labels(&raw.labels),
        }
    }
}

/// A thin client for the bits of Cloud Resource Manager v3 that we need.
/// Credentials are sorted out elsewhere; we just get handed a token.
pub(crate) struct ResourceManager {
    client: reqwest::Client,
    host: reqwest::Url,
    access_token: String,
}

impl ResourceManager {
    pub(crate) fn new(client: reqwest::Client, access_token: String) -> Self {
        Self::with_host(client, HOST.clone(), access_token)
    }

    fn with_host(client: reqwest::Client, host: reqwest::Url, access_token: String) -> Self {
        Self {
            client,
            host,
            access_token,
        }
    }

    async fn json_get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let resp = self
            .client
            .get(self.host.join(path)?)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .and_then(|x| x.error_for_status())
            .with_context(|| format!("requesting {path}"))?;

        resp.json().await.with_context(|| format!("parsing {path}"))
    }

    /// Lists the projects directly under `parent` (e.g., `organizations/1234`).
    pub(crate) async fn list_projects(&self, parent: &str) -> Result<Vec<Project>> {
        let mut results = Vec::new();
        let mut page_token = String::new();
        loop {
            let mut query = vec![("parent", parent)];
            if !page_token.is_empty() {
                query.push(("pageToken", page_token.as_str()));
            }

            let page: ListProjectsPage = self
                .json_get("v3/projects", &query)
                .await
                .with_context(|| format!("listing projects under {parent}"))?;
            debug!(
                "Fetched {} projects under {parent}; more pages: {}",
                page.projects.len(),
                !page.next_page_token.is_empty()
            );
            results.extend(page.projects.into_iter().map(Project::from));

            if page.next_page_token.is_empty() {
                return Ok(results);
            }
            page_token = page.next_page_token;
        }
    }
}
