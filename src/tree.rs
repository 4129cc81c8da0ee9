use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{RouteEntry, RouteManifest, RouteNode};

/// parentId ごとにルートをまとめ、親子関係を持つツリーへ組み立てる。
///
/// - 存在しない parentId を参照するルートがあればエラー
/// - どのルートからも辿れないルート (循環) があればエラー
/// - 兄弟の並びは ID 順
pub fn build_route_tree(manifest: &RouteManifest) -> Result<Vec<RouteNode>> {
    let mut by_parent: BTreeMap<Option<&str>, Vec<&RouteEntry>> = BTreeMap::new();
    for entry in manifest.values() {
        if let Some(parent_id) = entry.parent_id() {
            if !manifest.contains_key(parent_id) {
                return Err(Error::MissingParent {
                    id: entry.id().to_string(),
                    parent_id: parent_id.to_string(),
                });
            }
        }
        by_parent.entry(entry.parent_id()).or_default().push(entry);
    }

    let mut attached = 0;
    let roots = attach_children(None, &by_parent, &mut attached);

    if attached != manifest.len() {
        let mut reachable = Vec::new();
        collect_ids(&roots, &mut reachable);
        let unreachable = manifest
            .keys()
            .filter(|id| !reachable.contains(&id.as_str()))
            .cloned()
            .collect();
        return Err(Error::UnreachableRoutes(unreachable));
    }

    Ok(roots)
}

fn attach_children(
    parent_id: Option<&str>,
    by_parent: &BTreeMap<Option<&str>, Vec<&RouteEntry>>,
    attached: &mut usize,
) -> Vec<RouteNode> {
    let Some(entries) = by_parent.get(&parent_id) else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| {
            *attached += 1;
            RouteNode {
                entry: (*entry).clone(),
                children: attach_children(Some(entry.id()), by_parent, attached),
            }
        })
        .collect()
}

fn collect_ids<'a>(nodes: &'a [RouteNode], out: &mut Vec<&'a str>) {
    for node in nodes {
        out.push(node.entry.id());
        collect_ids(&node.children, out);
    }
}
