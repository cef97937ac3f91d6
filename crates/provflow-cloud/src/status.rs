//! Status classification
//!
//! Every resource kind reports its state as a string from a small, closed
//! vocabulary. Each vocabulary is an enum with a total mapping into [`Phase`];
//! strings the vocabulary does not know parse to its `unknown` value, which is
//! always in-progress, so an unexpected status keeps the poller waiting rather
//! than reporting a false success or failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-way classification of a remote status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Desired terminal state reached
    Ready,
    /// Explicit failure state; terminal
    Failed,
    /// Object no longer exists (or never did)
    Absent,
    /// Anything else; keep polling
    InProgress,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Phase::InProgress)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Ready => write!(f, "ready"),
            Phase::Failed => write!(f, "failed"),
            Phase::Absent => write!(f, "absent"),
            Phase::InProgress => write!(f, "in-progress"),
        }
    }
}

/// A closed set of status values reported by one resource kind.
///
/// Implement with [`status_vocabulary!`](crate::status_vocabulary).
pub trait StatusVocabulary:
    Copy + Eq + std::hash::Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Every declared value, in declaration order
    const ALL: &'static [Self];

    /// Value used for anything the vocabulary does not recognise
    const UNKNOWN: Self;

    /// Parse a status string reported by the remote.
    ///
    /// Matching is case-insensitive and treats `-` and spaces as `_`.
    /// Unrecognised strings map to [`Self::UNKNOWN`].
    fn parse(raw: &str) -> Self;

    /// Canonical wire name
    fn as_str(self) -> &'static str;

    /// Classification while creating, updating or reading
    fn phase(self) -> Phase;

    /// Classification while deleting.
    ///
    /// A ready object that is being deleted is still in progress. Kinds whose
    /// creation-failure statuses can be cleaned up by a delete map those to
    /// in-progress here as well.
    fn delete_phase(self) -> Phase;
}

/// Normalise a remote status string for vocabulary matching
pub fn normalize_status(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Define a status vocabulary enum with its total classification.
///
/// Each variant is `Name = "wire_name" => Phase`, optionally followed by
/// `/ DeletePhase` to override its classification while deleting.
///
/// ```ignore
/// status_vocabulary! {
///     pub enum VolumeStatus {
///         Creating = "creating" => InProgress,
///         Available = "available" => Ready,
///         Error = "error" => Failed / InProgress,
///         Deleted = "deleted" => Absent,
///         Unknown = "unknown" => InProgress,
///     }
///     unknown = Unknown;
/// }
/// ```
#[macro_export]
macro_rules! status_vocabulary {
    (@delete $phase:ident) => {
        match $crate::Phase::$phase {
            $crate::Phase::Ready => $crate::Phase::InProgress,
            other => other,
        }
    };
    (@delete $phase:ident $delete:ident) => {
        $crate::Phase::$delete
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $wire:literal => $phase:ident $(/ $delete:ident)?
            ),+ $(,)?
        }
        unknown = $unknown:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::StatusVocabulary for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];
            const UNKNOWN: Self = $name::$unknown;

            fn parse(raw: &str) -> Self {
                let normalized = $crate::status::normalize_status(raw);
                match normalized.as_str() {
                    $($wire => $name::$variant,)+
                    _ => $name::$unknown,
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            fn phase(self) -> $crate::Phase {
                match self {
                    $($name::$variant => $crate::Phase::$phase,)+
                }
            }

            fn delete_phase(self) -> $crate::Phase {
                match self {
                    $($name::$variant => $crate::status_vocabulary!(@delete $phase $($delete)?),)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::StatusVocabulary::as_str(*self))
            }
        }
    };
}

status_vocabulary! {
    /// Canonical status vocabulary for control planes that report the
    /// generic lifecycle states directly
    pub enum GenericStatus {
        Pending = "pending" => InProgress,
        Creating = "creating" => InProgress,
        Ready = "ready" => Ready,
        Updating = "updating" => InProgress,
        Failed = "failed" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Result of classifying one fetched snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ready,
    /// Terminal failure with the remote-provided diagnostic
    Failed(String),
    Absent,
    InProgress,
}

/// Anything that can classify a snapshot of type `S`
pub trait Classify<S>: Send + Sync {
    fn classify(&self, snapshot: &S) -> Classification;
}

impl<S, F> Classify<S> for F
where
    F: Fn(&S) -> Classification + Send + Sync,
{
    fn classify(&self, snapshot: &S) -> Classification {
        self(snapshot)
    }
}

type Predicate<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;
type FailurePredicate<S> = Box<dyn Fn(&S) -> Option<String> + Send + Sync>;

/// The ready / failed / absent predicate set for one resource kind.
///
/// Predicates are checked in that order; a snapshot matching none of them is
/// in progress. The failed predicate returns the diagnostic to surface.
pub struct StatePredicates<S> {
    is_ready: Predicate<S>,
    is_failed: FailurePredicate<S>,
    is_absent: Predicate<S>,
}

impl<S> StatePredicates<S> {
    pub fn new(
        is_ready: impl Fn(&S) -> bool + Send + Sync + 'static,
        is_failed: impl Fn(&S) -> Option<String> + Send + Sync + 'static,
        is_absent: impl Fn(&S) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            is_ready: Box::new(is_ready),
            is_failed: Box::new(is_failed),
            is_absent: Box::new(is_absent),
        }
    }

    pub fn is_ready(&self, snapshot: &S) -> bool {
        (self.is_ready)(snapshot)
    }

    pub fn failure(&self, snapshot: &S) -> Option<String> {
        (self.is_failed)(snapshot)
    }

    pub fn is_absent(&self, snapshot: &S) -> bool {
        (self.is_absent)(snapshot)
    }
}

impl<S> Classify<S> for StatePredicates<S> {
    fn classify(&self, snapshot: &S) -> Classification {
        if self.is_ready(snapshot) {
            Classification::Ready
        } else if let Some(reason) = self.failure(snapshot) {
            Classification::Failed(reason)
        } else if self.is_absent(snapshot) {
            Classification::Absent
        } else {
            Classification::InProgress
        }
    }
}

impl<S> fmt::Debug for StatePredicates<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatePredicates").finish_non_exhaustive()
    }
}
