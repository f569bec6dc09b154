//! Merge Resolver: collapses diamond identity paths named by merge directives.
//!
//! Directive paths are relative to the entity that declares the property; the
//! resolver works on absolute paths, so each directive is anchored at the path
//! prefix of the structure being built. A column whose path starts with a source
//! path is never added to the table. Instead its path is remembered as a
//! substitution onto the matching target column, which is how foreign keys that
//! mention the dropped column end up pointing at the kept one.

use crate::error::CompileError;
use crate::identity::PropertyPath;
use odsgen_model::{Property, ScalarType};
use tracing::trace;

#[derive(Debug, Clone)]
struct MergeRule {
    source: PropertyPath,
    target: PropertyPath,
    declared_at: String,
    used: bool,
}

#[derive(Debug, Clone)]
struct Substitution {
    source: PropertyPath,
    target: PropertyPath,
    data_type: ScalarType,
    declared_at: String,
}

/// A dropped path resolved to the path of a column that exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMerge {
    /// Path of the dropped column.
    pub source: PropertyPath,
    /// Path of the kept column.
    pub target: PropertyPath,
    /// Type the dropped column would have had.
    pub data_type: ScalarType,
    /// Entity or property that declared the merge.
    pub declared_at: String,
}

/// Merge state of one table under construction.
#[derive(Debug, Clone, Default)]
pub struct MergeResolver {
    rules: Vec<MergeRule>,
    substitutions: Vec<Substitution>,
}

impl MergeResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the merge directives of `property`, anchored at `base_path`.
    pub fn add_directives(
        &mut self,
        base_path: &[String],
        property: &Property,
        declared_at: &str,
    ) -> Result<(), CompileError> {
        for directive in &property.merge_directives {
            let source = directive.source_segments();
            let target = directive.target_segments();
            if source.first() != Some(&property.full_name()) {
                return Err(CompileError::invalid_merge(
                    declared_at,
                    format!(
                        "merge source '{}' must start with '{}'",
                        directive.source_path,
                        property.full_name()
                    ),
                ));
            }
            if target.is_empty() {
                return Err(CompileError::invalid_merge(
                    declared_at,
                    "merge target is empty",
                ));
            }
            self.rules.push(MergeRule {
                source: [base_path, source.as_slice()].concat(),
                target: [base_path, target.as_slice()].concat(),
                declared_at: declared_at.to_string(),
                used: false,
            });
        }
        Ok(())
    }

    /// Record that `source`, a column of type `data_type`, is an alias of the
    /// column at `target`.
    pub fn add_alias(
        &mut self,
        source: PropertyPath,
        target: PropertyPath,
        data_type: ScalarType,
        declared_at: &str,
    ) {
        self.substitutions.push(Substitution {
            source,
            target,
            data_type,
            declared_at: declared_at.to_string(),
        });
    }

    /// Decide whether a column reached by `paths` is merged away.
    ///
    /// Returns `true` when the column must not be added. Every path of a dropped
    /// column is substituted, so foreign keys may name it by any of them.
    pub fn intercept(
        &mut self,
        column: &str,
        data_type: ScalarType,
        paths: &[PropertyPath],
    ) -> Result<bool, CompileError> {
        let mut targets = Vec::with_capacity(paths.len());
        for path in paths {
            targets.push(self.match_rules(column, path)?);
        }
        let Some((fallback, declared_at)) = targets.iter().flatten().next().cloned() else {
            return Ok(false);
        };

        for (path, target) in paths.iter().zip(targets) {
            let (target, declared_at) =
                target.unwrap_or_else(|| (fallback.clone(), declared_at.clone()));
            trace!(
                column,
                source = %path.join("."),
                target = %target.join("."),
                "merging column"
            );
            self.substitutions.push(Substitution {
                source: path.clone(),
                target,
                data_type,
                declared_at,
            });
        }
        Ok(true)
    }

    fn match_rules(
        &mut self,
        column: &str,
        path: &PropertyPath,
    ) -> Result<Option<(PropertyPath, String)>, CompileError> {
        let mut chosen: Option<(PropertyPath, String)> = None;
        for rule in self.rules.iter_mut().filter(|r| path.starts_with(&r.source)) {
            rule.used = true;
            let target = [rule.target.as_slice(), &path[rule.source.len()..]].concat();
            match &chosen {
                Some((existing, _)) if *existing != target => {
                    return Err(CompileError::conflicting_merges(
                        &rule.declared_at,
                        column,
                        &existing.join("."),
                        &target.join("."),
                    ));
                }
                Some(_) => {}
                None => chosen = Some((target, rule.declared_at.clone())),
            }
        }
        Ok(chosen)
    }

    /// Resolve every substitution to the path of a column that exists.
    ///
    /// `exists` reports whether a column carries the given path. Chains of
    /// substitutions are followed.
    pub fn resolve(
        &self,
        exists: impl Fn(&PropertyPath) -> bool,
    ) -> Result<Vec<ResolvedMerge>, CompileError> {
        if let Some(rule) = self.rules.iter().find(|r| !r.used) {
            return Err(CompileError::unresolved_merge_path(
                &rule.declared_at,
                &rule.source.join("."),
            ));
        }

        let mut resolved = Vec::with_capacity(self.substitutions.len());
        for substitution in &self.substitutions {
            let mut target = &substitution.target;
            let mut hops = 0;
            while !exists(target) {
                hops += 1;
                let next = self
                    .substitutions
                    .iter()
                    .find(|s| &s.source == target)
                    .filter(|_| hops <= self.substitutions.len());
                match next {
                    Some(next) => target = &next.target,
                    None => {
                        return Err(CompileError::unresolved_merge_path(
                            &substitution.declared_at,
                            &substitution.target.join("."),
                        ))
                    }
                }
            }
            resolved.push(ResolvedMerge {
                source: substitution.source.clone(),
                target: target.clone(),
                data_type: substitution.data_type,
                declared_at: substitution.declared_at.clone(),
            });
        }
        Ok(resolved)
    }
}
