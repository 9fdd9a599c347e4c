//! Project description gatherer

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{settle, Gatherer};
use crate::core::context::{BuildContext, Description};
use crate::core::fact::FactSetter;
use crate::error::GatherError;

const README_FILES: [&str; 3] = ["README.md", "readme.md", "Readme.md"];

/// Settles the `description` fact from the README
#[derive(Debug)]
pub struct DescriptionGatherer {
    setter: FactSetter<Description>,
}

impl DescriptionGatherer {
    /// Create a gatherer owning the `description` fact
    pub fn new(setter: FactSetter<Description>) -> Self {
        Self { setter }
    }
}

#[async_trait]
impl Gatherer for DescriptionGatherer {
    fn name(&self) -> &'static str {
        "description"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let directory = context.working_directory();

        settle(self.setter, cancel, async move {
            for name in README_FILES {
                let path = directory.join(name);
                let content = match tokio::fs::read_to_string(&path).await {
                    Ok(content) => content,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => {
                        return Err(GatherError::Io {
                            path,
                            error: e.to_string(),
                        })
                    }
                };

                return first_paragraph(&content)
                    .map(|text| Description { text })
                    .ok_or_else(|| GatherError::NotFound {
                        what: format!("Description paragraph in '{}'", path.display()),
                    });
            }

            Err(GatherError::NotFound {
                what: "README.md".to_string(),
            })
        })
        .await;
    }
}

/// First paragraph of prose in a markdown document
///
/// Headings, badge lines, HTML and fenced code are skipped. Lines of the
/// paragraph are joined with single spaces.
fn first_paragraph(markdown: &str) -> Option<String> {
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines().map(str::trim) {
        if line.starts_with("```") {
            in_fence = !in_fence;
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        if in_fence {
            continue;
        }

        let skip = line.is_empty()
            || line.starts_with('#')
            || line.starts_with("[![")
            || line.starts_with("![")
            || line.starts_with('<');
        if skip {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        paragraph.push(line);
    }

    (!paragraph.is_empty()).then(|| paragraph.join(" "))
}
