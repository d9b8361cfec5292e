//! Client-facing views and their addresses.
//!
//! The result view embeds the job identifier so a reload can resume
//! observation without submitting again.

use crate::error::{Error, Result};
use crate::types::JobId;

const RESULT_PREFIX: &str = "/result/";

/// An addressable client view
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Submission form (root)
    Home,
    /// Status view for one job
    Result(JobId),
}

impl Route {
    /// Path of this view (`/` or `/result/{id}`)
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Result(id) => format!("{RESULT_PREFIX}{}", urlencoding::encode(id.as_str())),
        }
    }

    /// Resolve a path to a view
    ///
    /// A single trailing slash is tolerated; query strings and fragments are ignored.
    pub fn parse(path: &str) -> Result<Self> {
        let bare = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let trimmed = if bare.len() > 1 {
            bare.strip_suffix('/').unwrap_or(bare)
        } else {
            bare
        };

        if trimmed == "/" || trimmed.is_empty() {
            return Ok(Route::Home);
        }

        if let Some(raw_id) = trimmed.strip_prefix(RESULT_PREFIX)
            && !raw_id.is_empty()
            && !raw_id.contains('/')
        {
            let job_id = urlencoding::decode(raw_id)
                .ok()
                .and_then(|decoded| JobId::new(decoded.into_owned()).ok())
                .ok_or_else(|| Error::UnknownRoute(path.to_string()))?;
            return Ok(Route::Result(job_id));
        }

        Err(Error::UnknownRoute(path.to_string()))
    }

    /// The job this view observes, if any
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Route::Home => None,
            Route::Result(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
