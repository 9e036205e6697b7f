//! Name-based create/delete sets for workspaces and repositories.
//!
//! Pure functions: no I/O, deterministic, names compared byte-exact.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use repomirror_core::{Repository, RepositoryId, Workspace};

/// Workspaces to create on, and delete from, one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceDiff {
    /// Source workspaces with no same-named target workspace, source order.
    pub to_create: Vec<Workspace>,
    /// Target workspaces with no same-named source workspace, target order.
    pub to_delete: Vec<Workspace>,
}

impl WorkspaceDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// The `{id, name}` pair kept for every repository slated for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    pub id: RepositoryId,
    pub name: String,
}

/// Repositories to create in, and delete from, one target workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryDiff {
    /// Prefixed names missing on the target, de-duplicated, source order.
    pub to_create: Vec<String>,
    /// Target repositories whose name is not an expected prefixed name.
    pub to_delete: Vec<RepositoryRef>,
}

impl RepositoryDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Index workspaces by name. On duplicate names the last entry wins but the
/// first occurrence fixes the position.
fn index_by_name(workspaces: &[Workspace]) -> (Vec<&str>, HashMap<&str, &Workspace>) {
    let mut order = Vec::with_capacity(workspaces.len());
    let mut by_name = HashMap::with_capacity(workspaces.len());
    for workspace in workspaces {
        if by_name.insert(workspace.name.as_str(), workspace).is_none() {
            order.push(workspace.name.as_str());
        }
    }
    (order, by_name)
}

/// Compare workspace listings by name. Workspaces present on both sides are
/// left alone; there is no update path.
pub fn diff_workspaces(source: &[Workspace], target: &[Workspace]) -> WorkspaceDiff {
    let (source_order, source_by_name) = index_by_name(source);
    let (target_order, target_by_name) = index_by_name(target);

    let to_create = source_order
        .iter()
        .filter(|name| !target_by_name.contains_key(*name))
        .map(|name| source_by_name[name].clone())
        .collect();

    let to_delete = target_order
        .iter()
        .filter(|name| !source_by_name.contains_key(*name))
        .map(|name| target_by_name[name].clone())
        .collect();

    WorkspaceDiff {
        to_create,
        to_delete,
    }
}

/// Compare a source workspace's repositories against its target twin.
///
/// Every source repository is expected on the target as `prefix + name`.
/// Target repositories are not filtered by prefix first: anything in a
/// mirrored workspace that is not an expected name is deleted.
pub fn diff_repositories(
    source: &[Repository],
    target: &[Repository],
    prefix: &str,
) -> RepositoryDiff {
    let mut expected = Vec::with_capacity(source.len());
    let mut expected_set = HashSet::with_capacity(source.len());
    for repo in source {
        let name = format!("{prefix}{}", repo.name);
        if expected_set.insert(name.clone()) {
            expected.push(name);
        }
    }

    let actual: HashSet<&str> = target.iter().map(|repo| repo.name.as_str()).collect();

    let to_create = expected
        .into_iter()
        .filter(|name| !actual.contains(name.as_str()))
        .collect();

    let to_delete = target
        .iter()
        .filter(|repo| !expected_set.contains(&repo.name))
        .map(|repo| RepositoryRef {
            id: repo.id.clone(),
            name: repo.name.clone(),
        })
        .collect();

    RepositoryDiff {
        to_create,
        to_delete,
    }
}
