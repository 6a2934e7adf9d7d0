//! Packaging conflict resolution
//!
//! When several dependencies ship a native library under the same path, a
//! pick-first rule chooses which copy ends up in the package. The winner is
//! the candidate whose originating dependency is declared earliest.

use crate::error::{DescriptorError, Result};
use crate::model::Dependency;
use glob::{MatchOptions, Pattern};
use serde::{Serialize, Serializer};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A pick-first rule for a glob pattern such as `**/libc++_shared.so`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingRule {
    pattern: Pattern,
}

impl PackagingRule {
    /// Compile a pick-first pattern.
    pub fn pick_first(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(DescriptorError::malformed(
                "android.packaging.pick_first: pattern is empty",
            ));
        }
        let pattern = Pattern::new(pattern).map_err(|e| {
            DescriptorError::malformed(format!(
                "android.packaging.pick_first: invalid pattern {:?}: {}",
                pattern, e.msg
            ))
        })?;
        Ok(Self { pattern })
    }

    /// Pattern source text
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether a package path falls under this rule
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }

    /// Select the candidate from the earliest declared dependency.
    ///
    /// Fails when nothing matches, when a matching candidate comes from an
    /// undeclared dependency, or when two matching candidates share the
    /// winning dependency.
    pub fn resolve<'c>(
        &self,
        candidates: &'c [PackagingCandidate],
        dependencies: &[Dependency],
    ) -> Result<&'c PackagingCandidate> {
        let pattern = self.pattern();
        let mut ranked = Vec::new();

        for candidate in candidates.iter().filter(|c| self.matches(&c.path)) {
            let rank = dependencies
                .iter()
                .position(|d| d.coordinate() == candidate.dependency)
                .ok_or_else(|| {
                    DescriptorError::ambiguous(
                        pattern,
                        format!(
                            "{} comes from {}, which is not a declared dependency",
                            candidate.path, candidate.dependency
                        ),
                    )
                })?;
            ranked.push((rank, candidate));
        }

        let Some(best) = ranked.iter().map(|(rank, _)| *rank).min() else {
            return Err(DescriptorError::ambiguous(pattern, "no candidate matches"));
        };

        let mut winners = ranked.into_iter().filter(|(rank, _)| *rank == best);
        let (_, winner) = winners
            .next()
            .ok_or_else(|| DescriptorError::ambiguous(pattern, "no candidate matches"))?;
        if let Some((_, other)) = winners.next() {
            return Err(DescriptorError::ambiguous(
                pattern,
                format!(
                    "{} and {} both come from {}",
                    winner.path, other.path, winner.dependency
                ),
            ));
        }

        tracing::debug!(
            pattern,
            path = %winner.path,
            dependency = %winner.dependency,
            "Resolved packaging conflict"
        );
        Ok(winner)
    }
}

impl Serialize for PackagingRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.pattern())
    }
}

/// A file competing for a path in the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagingCandidate {
    /// Path of the file inside its dependency, e.g. `jni/x86/libaosl.so`
    pub path: String,
    /// `group:artifact` coordinate of the dependency that ships it
    pub dependency: String,
}

impl PackagingCandidate {
    /// Candidate shipped at `path` by `dependency`
    pub fn new(path: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dependency: dependency.into(),
        }
    }
}
