//! Live BacDive profile source over HTTP.
//!
//! Blocking reqwest client with timeout, gzip and bounded retries with
//! exponential backoff. A genus lookup pages through the taxon search up to
//! `max_profiles` IDs, then retrieves the profiles in batches.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::ProfileSet;
use crate::error::FetchError;
use crate::fetch::bacdive::{parse_search_page, profiles_from_response};
use crate::fetch::ProfileSource;
use crate::value::RawValue;

/// Upper bound on search pages followed for one genus.
const MAX_SEARCH_PAGES: usize = 100;

/// Connection settings for [`BacDiveSource`].
#[derive(Debug, Clone)]
pub struct BacDiveConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Initial backoff, doubled per retry.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Cap on strain IDs collected per genus.
    pub max_profiles: usize,
    /// IDs per retrieve call.
    pub batch_size: usize,
    pub bearer_token: Option<String>,
}

impl Default for BacDiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bacdive.dsmz.de".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            max_profiles: 200,
            batch_size: 100,
            bearer_token: None,
        }
    }
}

/// [`ProfileSource`] backed by the BacDive REST API.
#[derive(Debug)]
pub struct BacDiveSource {
    config: BacDiveConfig,
    client: reqwest::blocking::Client,
}

fn conn_err(e: &reqwest::Error) -> FetchError {
    FetchError::ConnectionFailed {
        message: e.to_string(),
    }
}

impl BacDiveSource {
    /// Builds the HTTP client.
    ///
    /// # Errors
    /// Returns `FetchError::Unavailable` if the client cannot be constructed.
    pub fn new(config: BacDiveConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub const fn config(&self) -> &BacDiveConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GETs a JSON document with retry and backoff.
    fn get_json(&self, url: &str) -> Result<RawValue, FetchError> {
        let mut backoff = self.config.initial_backoff;
        let mut last_err = FetchError::ConnectionFailed {
            message: "no attempt made".to_string(),
        };

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!(attempt, max_retries = self.config.max_retries, ?backoff, url, "retrying request");
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(self.config.max_backoff);
            }

            let mut request = self.client.get(url).header("Accept", "application/json");
            if let Some(token) = &self.config.bearer_token {
                request = request.bearer_auth(token);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<RawValue>().map_err(|e| FetchError::Decode {
                            message: e.to_string(),
                        });
                    }
                    let body = response.text().unwrap_or_default();
                    let err = FetchError::Http {
                        status: status.as_u16(),
                        message: body,
                    };
                    if status.is_client_error() && status.as_u16() != 429 {
                        return Err(err);
                    }
                    last_err = err;
                }
                Err(e) => last_err = conn_err(&e),
            }
        }
        Err(last_err)
    }

    fn search_ids(&self, genus: &str) -> Result<Vec<String>, FetchError> {
        let first = self.url(&format!("taxon/{}", genus.trim()));
        collect_ids(first, self.config.max_profiles, |url| self.get_json(url))
    }
}

/// Follows `next` links from `first` until `max_profiles` IDs are collected.
///
/// Stops early on a page without IDs, a `next` URL already visited, or
/// after [`MAX_SEARCH_PAGES`] pages.
fn collect_ids<F>(first: String, max_profiles: usize, mut fetch_page: F) -> Result<Vec<String>, FetchError>
where
    F: FnMut(&str) -> Result<RawValue, FetchError>,
{
    let mut ids = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(first);
    while let Some(url) = next.take() {
        if visited.len() >= MAX_SEARCH_PAGES {
            warn!(pages = visited.len(), url = %url, "search page limit reached");
            break;
        }
        if !visited.insert(url.clone()) {
            warn!(url = %url, "search pagination revisits a page, stopping");
            break;
        }
        let page = parse_search_page(&fetch_page(&url)?);
        if page.ids.is_empty() {
            debug!(url = %url, "empty search page");
            break;
        }
        ids.extend(page.ids);
        if ids.len() >= max_profiles {
            ids.truncate(max_profiles);
            break;
        }
        next = page.next;
    }
    Ok(ids)
}

impl ProfileSource for BacDiveSource {
    fn fetch_profiles(&self, category: &str) -> Result<ProfileSet, FetchError> {
        let ids = match self.search_ids(category) {
            Ok(ids) => ids,
            Err(FetchError::Http { status: 404, .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        if ids.is_empty() {
            info!(genus = category, "no strains found");
            return Ok(ProfileSet::new());
        }

        let mut profiles = ProfileSet::new();
        for batch in ids.chunks(self.config.batch_size.max(1)) {
            let url = self.url(&format!("fetch/{}", batch.join(";")));
            for (id, profile) in profiles_from_response(&self.get_json(&url)?) {
                profiles.insert(id, profile);
            }
        }
        info!(genus = category, ids = ids.len(), profiles = profiles.len(), "fetched profiles");
        Ok(profiles)
    }
}
