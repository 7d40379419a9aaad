//! Replacement composer: decides, per entry, whether and how it is renamed.
//!
//! A [`Composer`] is built once per walk. It compiles the configured
//! strategy up front (a compile failure is logged once and disables
//! renaming for the whole walk) and then, for each entry:
//!
//! 1. applies the inclusion filters,
//! 2. snapshots the walk counters into a [`TransformContext`],
//! 3. starts the computation on the scoped part of the name ([`Composer::begin`]),
//! 4. reattaches the untouched part, drops no-op renames and updates the
//!    counters ([`Composer::finish`]).
pub mod literal;
pub mod regex;
pub mod stats;

use self::literal::{replace_literal, replace_literal_transform, LiteralOptions};
use self::regex::RegexStrategy;
use crate::model::{EntryInfo, ReplaceSettings, Scope, SearchSettings};
use crate::transform::{guarded, ScriptEngine, Transform, TransformCall, TransformError};
use compact_str::CompactString;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use literal::{find_matches, replace_literal_with, LiteralMatch};
pub use stats::RenameStats;

/// Why a single entry could not be given a rename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("invalid search pattern: {0}")]
    Pattern(String),
    #[error("transform did not resolve synchronously")]
    Pending,
}

/// In-flight computation of one entry's scoped value.
pub type Candidate = BoxFuture<'static, Result<String, ComposeError>>;

/// Rebuild `source`, substituting each byte range with its value.
///
/// Ranges must be sorted and non-overlapping.
pub(crate) fn splice<I>(source: &str, replacements: I) -> String
where
    I: IntoIterator<Item = (Range<usize>, String)>,
{
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (range, value) in replacements {
        out.push_str(&source[last..range.start]);
        out.push_str(&value);
        last = range.end;
    }
    out.push_str(&source[last..]);
    out
}

#[derive(Clone)]
enum Replacer {
    Text(String),
    Script(Arc<dyn Transform>),
}

impl Replacer {
    fn reads_counters(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Script(t) => t.reads_counters(),
        }
    }
}

#[derive(Clone)]
enum Strategy {
    /// The search transform computes the whole new `base`.
    Script(Arc<dyn Transform>),
    Literal {
        search: Arc<str>,
        options: LiteralOptions,
        replacer: Replacer,
    },
    Regex {
        regex: Arc<RegexStrategy>,
        replacer: Replacer,
    },
    /// Compilation failed; nothing is renamed.
    Disabled,
}

/// Per-walk rename decision maker.
#[derive(Clone)]
pub struct Composer {
    strategy: Strategy,
    roots: HashSet<PathBuf>,
    search: SearchSettings,
    replace: ReplaceSettings,
}

impl Composer {
    pub fn new(
        roots: &[PathBuf],
        search: &SearchSettings,
        replace: &ReplaceSettings,
        engine: &dyn ScriptEngine,
    ) -> Self {
        let strategy = match Self::compile(search, replace, engine) {
            Ok(strategy) => strategy,
            Err(err) => {
                warn!(error = %err, "Rename strategy failed to compile; no entries will be renamed");
                Strategy::Disabled
            }
        };

        Self {
            strategy,
            roots: roots.iter().cloned().collect(),
            search: search.clone(),
            replace: replace.clone(),
        }
    }

    fn compile(
        search: &SearchSettings,
        replace: &ReplaceSettings,
        engine: &dyn ScriptEngine,
    ) -> Result<Strategy, ComposeError> {
        if search.input.is_empty() {
            return Ok(Strategy::Disabled);
        }
        if search.use_function {
            return Ok(Strategy::Script(guarded(engine.compile(&search.input)?)));
        }
        if replace.input.is_empty() {
            return Ok(Strategy::Disabled);
        }

        let replacer = if replace.use_function {
            Replacer::Script(guarded(engine.compile(&replace.input)?))
        } else {
            Replacer::Text(replace.input.clone())
        };

        if search.is_regex {
            let regex = RegexStrategy::new(search).map_err(|e| ComposeError::Pattern(e.to_string()))?;
            Ok(Strategy::Regex {
                regex: Arc::new(regex),
                replacer,
            })
        } else {
            Ok(Strategy::Literal {
                search: Arc::from(search.input.as_str()),
                options: LiteralOptions {
                    case_sensitive: search.is_case_sensitive,
                    matches_all: search.matches_all,
                },
                replacer,
            })
        }
    }

    /// `true` if no computation can observe the walk counters, so sibling
    /// entries may be computed concurrently.
    pub fn is_counter_independent(&self) -> bool {
        match &self.strategy {
            Strategy::Script(t) => !t.reads_counters(),
            Strategy::Literal { replacer, .. } | Strategy::Regex { replacer, .. } => {
                !replacer.reads_counters()
            }
            Strategy::Disabled => true,
        }
    }

    /// `false` if compilation failed or the inputs leave nothing to do.
    pub fn is_active(&self) -> bool {
        !matches!(self.strategy, Strategy::Disabled)
    }

    fn scope(&self) -> Scope {
        match self.strategy {
            Strategy::Script(_) => Scope::Full,
            _ => self.replace.scope,
        }
    }

    fn is_included(&self, info: &EntryInfo) -> bool {
        // A search transform bypasses every replace-side filter.
        if self.search.use_function {
            return true;
        }
        if info.is_directory && !self.replace.include_folders {
            return false;
        }
        if !info.is_directory && !self.replace.include_files {
            return false;
        }
        self.replace.include_subfolders
            || self.roots.contains(&info.base_path)
            || self.roots.contains(&info.full_path)
    }

    /// Filter `info` and start computing its scoped value.
    ///
    /// Returns `None` when the entry is filtered out; counters are untouched
    /// apart from registering the entry's folder.
    pub fn begin(&self, info: &EntryInfo, stats: &mut RenameStats) -> Option<Candidate> {
        if matches!(self.strategy, Strategy::Disabled) || !self.is_included(info) {
            return None;
        }

        let ctx = stats.context_for(info);
        let target = info.scoped(self.scope()).to_string();

        let candidate: Candidate = match &self.strategy {
            Strategy::Script(transform) => transform
                .call(TransformCall::whole(&target), ctx)
                .map(|r| r.map_err(ComposeError::from))
                .boxed(),
            Strategy::Literal {
                search,
                options,
                replacer: Replacer::Text(text),
            } => {
                let value = replace_literal(&target, search, text, *options);
                futures::future::ready(Ok(value)).boxed()
            }
            Strategy::Literal {
                search,
                options,
                replacer: Replacer::Script(transform),
            } => {
                let (search, options, transform) = (search.clone(), *options, transform.clone());
                async move {
                    replace_literal_transform(&target, &search, options, &transform, &ctx)
                        .await
                        .map_err(ComposeError::from)
                }
                .boxed()
            }
            Strategy::Regex {
                regex,
                replacer: Replacer::Text(text),
            } => futures::future::ready(Ok(regex.replace(&target, text))).boxed(),
            Strategy::Regex {
                regex,
                replacer: Replacer::Script(transform),
            } => {
                let (regex, transform) = (regex.clone(), transform.clone());
                async move {
                    regex
                        .replace_with(&target, &transform, &ctx)
                        .await
                        .map_err(ComposeError::from)
                }
                .boxed()
            }
            Strategy::Disabled => return None,
        };

        Some(candidate)
    }

    /// Turn a computed scoped value into the entry's rename and update the
    /// counters if a rename was produced.
    pub fn finish(
        &self,
        info: &EntryInfo,
        outcome: Result<String, ComposeError>,
        stats: &mut RenameStats,
    ) -> Option<CompactString> {
        let value = match outcome {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %info.full_path.display(), error = %err, "Rename computation failed");
                return None;
            }
        };

        let renamed = match self.scope() {
            Scope::Full => value,
            Scope::Name => format!("{value}{}", info.ext),
            Scope::Extension => format!("{}{value}", info.name),
        };

        if renamed == info.base.as_str() {
            return None;
        }

        debug!(from = %info.base, to = %renamed, "Rename proposed");
        stats.record(info);
        Some(CompactString::new(renamed))
    }

    /// Synchronous [`begin`](Self::begin) + [`finish`](Self::finish).
    ///
    /// A computation that does not resolve immediately fails with
    /// [`ComposeError::Pending`].
    pub fn compose_now(&self, info: &EntryInfo, stats: &mut RenameStats) -> Option<CompactString> {
        let candidate = self.begin(info, stats)?;
        let outcome = candidate.now_or_never().unwrap_or(Err(ComposeError::Pending));
        self.finish(info, outcome, stats)
    }
}
