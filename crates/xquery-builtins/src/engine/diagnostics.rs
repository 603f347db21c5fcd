//! Side channel for profiling and tracing hooks around function evaluation.
//!
//! The evaluator reports events to a [`DiagnosticSink`] carried by the query context. The
//! default sink discards everything; results never depend on which sink is installed.

use crate::xdm::{ExpandedName, XdmItem};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The function was resolved for a call site.
    Bind,
    /// Before the implementation runs.
    Start,
    /// After the result passed the return type check.
    Finish,
}

/// What the arguments of a call read from the focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub context_item: bool,
    pub context_sequence: bool,
}

impl Dependencies {
    pub const NONE: Dependencies = Dependencies {
        context_item: false,
        context_sequence: false,
    };
    pub const CONTEXT_ITEM: Dependencies = Dependencies {
        context_item: true,
        context_sequence: false,
    };
    pub const CONTEXT_SEQUENCE: Dependencies = Dependencies {
        context_item: false,
        context_sequence: true,
    };

    #[must_use]
    pub fn union(self, other: Dependencies) -> Dependencies {
        Dependencies {
            context_item: self.context_item || other.context_item,
            context_sequence: self.context_sequence || other.context_sequence,
        }
    }
}

impl fmt::Display for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.context_item, self.context_sequence) {
            (false, false) => f.write_str("none"),
            (true, false) => f.write_str("context-item"),
            (false, true) => f.write_str("context-sequence"),
            (true, true) => f.write_str("context-item, context-sequence"),
        }
    }
}

pub enum Payload<'a, N> {
    Dependencies(Dependencies),
    ContextSequence(&'a [XdmItem<N>]),
    Result(&'a [XdmItem<N>]),
    Deprecated(&'a str),
}

pub trait DiagnosticSink<N>: Send + Sync {
    fn event(&self, function: &ExpandedName, phase: Phase, payload: Payload<'_, N>);
}

/// Discards every event.
pub struct NoopSink;

impl<N> DiagnosticSink<N> for NoopSink {
    fn event(&self, _function: &ExpandedName, _phase: Phase, _payload: Payload<'_, N>) {}
}

/// Forwards events to `tracing`. Deprecations are reported at `warn` level by the
/// registry itself, so this sink keeps them at `debug`.
pub struct TracingSink;

impl<N: fmt::Debug> DiagnosticSink<N> for TracingSink {
    fn event(&self, function: &ExpandedName, phase: Phase, payload: Payload<'_, N>) {
        match payload {
            Payload::Dependencies(deps) => {
                tracing::trace!(
                    function = %function,
                    ?phase,
                    dependencies = %deps,
                    "call dependencies"
                );
            }
            Payload::ContextSequence(seq) => {
                tracing::trace!(
                    function = %function,
                    ?phase,
                    items = seq.len(),
                    context = ?seq,
                    "context sequence"
                );
            }
            Payload::Result(seq) => {
                tracing::trace!(
                    function = %function,
                    ?phase,
                    items = seq.len(),
                    result = ?seq,
                    "call result"
                );
            }
            Payload::Deprecated(note) => {
                tracing::debug!(function = %function, ?phase, note, "deprecated function bound");
            }
        }
    }
}
