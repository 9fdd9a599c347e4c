//! Release notes gatherer
//!
//! Reads `RELEASE_NOTES.md`, a list of sections headed `# x.y.z` (an
//! optional `v` prefix is accepted). The section for the version being built
//! is used, falling back to the first section.

use async_trait::async_trait;
use regex::Regex;
use semver::Version;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

use super::{settle, Gatherer};
use crate::core::context::{BuildContext, ReleaseNotes};
use crate::core::fact::FactSetter;
use crate::error::GatherError;

const RELEASE_NOTES_FILE: &str = "RELEASE_NOTES.md";

/// Settles the `release_notes` fact
#[derive(Debug)]
pub struct ReleaseNotesGatherer {
    setter: FactSetter<ReleaseNotes>,
}

impl ReleaseNotesGatherer {
    /// Create a gatherer owning the `release_notes` fact
    pub fn new(setter: FactSetter<ReleaseNotes>) -> Self {
        Self { setter }
    }
}

#[async_trait]
impl Gatherer for ReleaseNotesGatherer {
    fn name(&self) -> &'static str {
        "release-notes"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let path = context.working_directory().join(RELEASE_NOTES_FILE);
        let version = context.version();

        settle(self.setter, cancel, async move {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(GatherError::NotFound {
                        what: RELEASE_NOTES_FILE.to_string(),
                    })
                }
                Err(e) => {
                    return Err(GatherError::Io {
                        path,
                        error: e.to_string(),
                    })
                }
            };

            select_section(&content, version).ok_or_else(|| GatherError::NotFound {
                what: format!("Version section in {RELEASE_NOTES_FILE}"),
            })
        })
        .await;
    }
}

fn heading() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| {
        Regex::new(r"^#\s+v?(\d+\.\d+\.\d+)\s*$")
            .unwrap_or_else(|e| unreachable!("heading pattern is valid: {e}"))
    })
}

/// Split a release notes document into `(version, notes)` sections
fn sections(content: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();

    for line in content.lines() {
        if let Some(captures) = heading().captures(line.trim_end()) {
            sections.push((captures[1].to_string(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
    }

    sections
        .into_iter()
        .map(|(version, body)| (version, body.join("\n").trim().to_string()))
        .collect()
}

/// Pick the section for `version` (ignoring pre-release and build metadata)
fn select_section(content: &str, version: &Version) -> Option<ReleaseNotes> {
    let wanted = format!("{}.{}.{}", version.major, version.minor, version.patch);
    let mut found = sections(content);
    if found.is_empty() {
        return None;
    }

    let index = found.iter().position(|(v, _)| *v == wanted).unwrap_or(0);
    let (version, notes) = found.swap_remove(index);
    Some(ReleaseNotes { version, notes })
}
