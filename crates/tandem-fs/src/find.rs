//! Streaming recursive file search.
//!
//! A spawned task walks the tree breadth-first and sends matches through a
//! channel as they are discovered, so the UI can render results while the
//! walk is still running. The walk honors a cancellation token and an
//! upper result cap.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use derive_builder::Builder;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tandem_core::glob::glob_match;

/// Channel depth for streamed results.
const FIND_CHANNEL_SIZE: usize = 256;

/// Search parameters.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FindOptions {
    /// Glob pattern, or a regular expression when `regex` is set.
    pub pattern: String,

    /// Descend into subdirectories.
    #[builder(default = "true")]
    pub subdirs: bool,

    /// Interpret the pattern as a regular expression.
    #[builder(default = "false")]
    pub regex: bool,

    /// Case-sensitive matching.
    #[builder(default = "false")]
    pub case_sensitive: bool,

    /// Include hidden entries.
    #[builder(default = "false")]
    pub include_hidden: bool,

    /// Stop after this many matches.
    #[builder(default = "1000")]
    pub max_results: usize,
}

impl FindOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.pattern {
            Some(p) if !p.is_empty() => Ok(()),
            _ => Err("pattern is required".to_string()),
        }
    }
}

impl FindOptions {
    /// Builder entry point.
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }
}

/// Events streamed by a find task.
#[derive(Debug)]
pub enum FindEvent {
    /// A path whose name matched.
    Match(PathBuf),
    /// A subtree that could not be read (non-fatal).
    Unreadable(PathBuf),
    /// The walk finished.
    Done {
        /// False when the walk stopped early (cap or cancellation).
        complete: bool,
        /// Directories visited.
        visited: usize,
    },
}

enum Matcher {
    Glob { pattern: String, case_sensitive: bool },
    Regex(regex::Regex),
}

impl Matcher {
    fn new(options: &FindOptions) -> Result<Self, regex::Error> {
        if options.regex {
            let built = regex::RegexBuilder::new(&options.pattern)
                .case_insensitive(!options.case_sensitive)
                .build()?;
            Ok(Self::Regex(built))
        } else {
            Ok(Self::Glob {
                pattern: options.pattern.clone(),
                case_sensitive: options.case_sensitive,
            })
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Glob {
                pattern,
                case_sensitive,
            } => glob_match(name, pattern, *case_sensitive),
            Self::Regex(re) => re.is_match(name),
        }
    }
}

/// Start a recursive find under `root`.
///
/// Returns a receiver of [`FindEvent`]; an invalid regex pattern is
/// reported synchronously.
pub fn start_find(
    root: PathBuf,
    options: FindOptions,
    cancel: CancellationToken,
) -> Result<mpsc::Receiver<FindEvent>, regex::Error> {
    let matcher = Matcher::new(&options)?;
    let (tx, rx) = mpsc::channel(FIND_CHANNEL_SIZE);

    tokio::spawn(async move {
        walk(root, options, matcher, cancel, tx).await;
    });

    Ok(rx)
}

async fn walk(
    root: PathBuf,
    options: FindOptions,
    matcher: Matcher,
    cancel: CancellationToken,
    tx: mpsc::Sender<FindEvent>,
) {
    let mut queue: VecDeque<PathBuf> = VecDeque::from([root]);
    let mut found = 0usize;
    let mut visited = 0usize;
    let mut complete = true;

    'outer: while let Some(dir) = queue.pop_front() {
        if cancel.is_cancelled() {
            complete = false;
            break;
        }
        visited += 1;

        // One blocking read per directory keeps cancellation latency at
        // a single-directory granularity.
        let dir_for_read = dir.clone();
        let entries = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<_>> {
            let mut out = Vec::new();
            for entry in fs::read_dir(&dir_for_read)? {
                let entry = entry?;
                let metadata = entry.metadata().ok();
                out.push((entry.file_name(), entry.path(), metadata));
            }
            Ok(out)
        })
        .await;

        let entries = match entries {
            Ok(Ok(entries)) => entries,
            _ => {
                let _ = tx.send(FindEvent::Unreadable(dir)).await;
                continue;
            }
        };

        for (file_name, path, metadata) in entries {
            if cancel.is_cancelled() {
                complete = false;
                break 'outer;
            }

            let name = file_name.to_string_lossy();
            if !options.include_hidden && name.starts_with('.') {
                continue;
            }

            let is_dir = metadata.as_ref().map(|m| m.is_dir()).unwrap_or(false);
            if is_dir && options.subdirs {
                queue.push_back(path.clone());
            }

            if matcher.matches(&name) {
                found += 1;
                if tx.send(FindEvent::Match(path)).await.is_err() {
                    // Receiver dropped; stop quietly.
                    return;
                }
                if found >= options.max_results {
                    complete = false;
                    break 'outer;
                }
            }
        }
    }

    debug!(found, visited, complete, "find finished");
    let _ = tx.send(FindEvent::Done { complete, visited }).await;
}
