//! User-authored transforms.
//!
//! A transform turns one string into another with access to a small,
//! read-only [`TransformContext`] and nothing else. Every transform returns a
//! future; synchronous ones simply hand back a future that is already
//! resolved, so callers never need to know which kind they hold.
//!
//! The default [`ScriptEngine`] is [`PipelineEngine`], which compiles the
//! pipeline language described in [`pipeline`]:
//!
//! ```text
//! lower | replace(" ", "_") | prefix("{global:03}_")
//! ```
pub mod parser;
pub mod pipeline;
pub mod template;

use crate::model::EntryMetadata;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

pub use pipeline::{Pipeline, PipelineEngine};

/// Failure to compile or run a transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("unknown step `{0}`")]
    UnknownStep(String),
    #[error("step `{step}` expects {expected} argument(s), found {found}")]
    Arity {
        step: String,
        expected: &'static str,
        found: usize,
    },
    #[error("step `{step}`: {message}")]
    BadArgument { step: String, message: String },
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("transform failed: {0}")]
    Execution(String),
}

/// The only state a transform can observe about the entry being renamed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    /// Entries renamed so far in this walk.
    pub global_index: usize,
    /// Files renamed so far in this entry's folder; `None` for folders.
    pub file_in_folder_index: Option<usize>,
    pub is_folder: bool,
    pub metadata: Option<EntryMetadata>,
}

/// Arguments of one transform invocation, mirroring a regex replacer callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformCall {
    /// Text being transformed: the matched substring, or the whole `base`
    /// when the transform drives the search itself.
    pub matched: String,
    /// Capture groups 1..n of a regex match (`None` for groups that did not
    /// participate). Empty for literal matches.
    pub groups: Vec<Option<String>>,
    /// Character index of `matched` within `source`.
    pub offset: usize,
    /// The full string being searched.
    pub source: String,
}

impl TransformCall {
    /// A call covering the whole of `text`.
    pub fn whole(text: &str) -> Self {
        Self {
            matched: text.to_string(),
            groups: Vec::new(),
            offset: 0,
            source: text.to_string(),
        }
    }
}

/// Deferred transform result.
pub type TransformFuture = BoxFuture<'static, Result<String, TransformError>>;

/// A compiled, reusable transform.
pub trait Transform: Send + Sync {
    /// Compute the replacement for `call`.
    fn call(&self, call: TransformCall, ctx: TransformContext) -> TransformFuture;

    /// Whether the output may depend on `global_index` or
    /// `file_in_folder_index`.
    ///
    /// The async planner only fans sibling computations out concurrently when
    /// this is `false`.
    fn reads_counters(&self) -> bool {
        true
    }
}

/// Compiles transform source code.
pub trait ScriptEngine: Send + Sync {
    fn compile(&self, source: &str) -> Result<Arc<dyn Transform>, TransformError>;
}

/// Adapter turning a closure into a [`Transform`].
pub struct FnTransform<F> {
    f: F,
    reads_counters: bool,
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(TransformCall, TransformContext) -> TransformFuture + Send + Sync,
{
    fn call(&self, call: TransformCall, ctx: TransformContext) -> TransformFuture {
        (self.f)(call, ctx)
    }

    fn reads_counters(&self) -> bool {
        self.reads_counters
    }
}

/// Wrap an async-capable closure as a transform that may read counters.
pub fn from_fn<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(TransformCall, TransformContext) -> TransformFuture + Send + Sync + 'static,
{
    Arc::new(FnTransform {
        f,
        reads_counters: true,
    })
}

/// Wrap a synchronous closure that ignores the counters.
pub fn from_sync_fn<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(&TransformCall) -> String + Send + Sync + 'static,
{
    Arc::new(FnTransform {
        f: move |call: TransformCall, _ctx: TransformContext| -> TransformFuture {
            futures::future::ready(Ok(f(&call))).boxed()
        },
        reads_counters: false,
    })
}

/// Wrapper turning a panic inside a transform into
/// [`TransformError::Execution`] for that one call.
struct Guarded(Arc<dyn Transform>);

impl Transform for Guarded {
    fn call(&self, call: TransformCall, ctx: TransformContext) -> TransformFuture {
        match panic::catch_unwind(AssertUnwindSafe(|| self.0.call(call, ctx))) {
            Ok(future) => AssertUnwindSafe(future)
                .catch_unwind()
                .map(|outcome| outcome.unwrap_or_else(|payload| Err(panicked(payload.as_ref()))))
                .boxed(),
            Err(payload) => futures::future::ready(Err(panicked(payload.as_ref()))).boxed(),
        }
    }

    fn reads_counters(&self) -> bool {
        self.0.reads_counters()
    }
}

/// Contain panics raised while computing or polling `transform`.
pub fn guarded(transform: Arc<dyn Transform>) -> Arc<dyn Transform> {
    Arc::new(Guarded(transform))
}

fn panicked(payload: &(dyn Any + Send)) -> TransformError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    TransformError::Execution(format!("panicked: {message}"))
}
