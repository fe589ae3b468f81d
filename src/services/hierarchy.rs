// src/services/hierarchy.rs

//! Montagem da árvore de páginas a partir da tabela plana.
//! Funções puras: nada aqui toca o banco.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::page::{Page, PageNode, ParentOption};

/// Raízes são as linhas sem `parent_id`. Irmãos em ordem (order_index, created_at).
///
/// Só entra na árvore o que é alcançável a partir de uma raiz: órfãos (pai inexistente)
/// e páginas presas num ciclo ficam de fora. Cada linha aparece no máximo uma vez.
pub fn build_forest(rows: Vec<Page>) -> Vec<PageNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<Page>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(a.created_at.cmp(&b.created_at))
        });
    }

    let roots = by_parent.remove(&None).unwrap_or_default();
    let mut visited = HashSet::new();

    roots
        .into_iter()
        .filter_map(|page| attach(page, &mut by_parent, &mut visited))
        .collect()
}

fn attach(
    page: Page,
    by_parent: &mut HashMap<Option<Uuid>, Vec<Page>>,
    visited: &mut HashSet<Uuid>,
) -> Option<PageNode> {
    if !visited.insert(page.id) {
        return None;
    }

    let children: Vec<PageNode> = by_parent
        .remove(&Some(page.id))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|child| attach(child, by_parent, visited))
        .collect();

    Some(PageNode {
        page,
        children: non_empty(children),
    })
}

fn non_empty(children: Vec<PageNode>) -> Option<Vec<PageNode>> {
    (!children.is_empty()).then_some(children)
}

/// Mantém o nó se o nome contém `search` (sem diferenciar maiúsculas)
/// ou se algum descendente sobrevive ao filtro. Busca vazia devolve tudo.
pub fn filter_forest(forest: Vec<PageNode>, search: &str) -> Vec<PageNode> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return forest;
    }
    forest
        .into_iter()
        .filter_map(|node| filter_node(node, &needle))
        .collect()
}

fn filter_node(node: PageNode, needle: &str) -> Option<PageNode> {
    let PageNode { page, children } = node;

    let kept: Vec<PageNode> = children
        .unwrap_or_default()
        .into_iter()
        .filter_map(|child| filter_node(child, needle))
        .collect();

    if page.name.to_lowercase().contains(needle) || !kept.is_empty() {
        Some(PageNode {
            page,
            children: non_empty(kept),
        })
    } else {
        None
    }
}

/// Remove páginas inativas junto com a subárvore delas (sidebar pública).
pub fn prune_inactive(forest: Vec<PageNode>) -> Vec<PageNode> {
    forest
        .into_iter()
        .filter(|node| node.page.is_active)
        .map(|PageNode { page, children }| PageNode {
            page,
            children: children.map(prune_inactive).and_then(non_empty),
        })
        .collect()
}

/// Lista em profundidade para o dropdown de "página pai".
/// `exclude` some junto com seus descendentes: uma página não pode ir para baixo de si mesma.
pub fn flatten_options(forest: &[PageNode], exclude: Option<Uuid>) -> Vec<ParentOption> {
    let mut out = Vec::new();
    walk(forest, exclude, 0, &mut out);
    out
}

fn walk(nodes: &[PageNode], exclude: Option<Uuid>, depth: usize, out: &mut Vec<ParentOption>) {
    for node in nodes {
        if Some(node.page.id) == exclude {
            continue;
        }
        out.push(ParentOption {
            id: node.page.id,
            name: node.page.name.clone(),
            depth,
        });
        if let Some(children) = &node.children {
            walk(children, exclude, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn page(name: &str, parent: Option<&Page>, order_index: i32, age_secs: i64) -> Page {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Page {
            id: Uuid::new_v4(),
            name: name.to_string(),
            url: format!("/{}", name.to_lowercase()),
            icon: None,
            parent_id: parent.map(|p| p.id),
            order_index,
            is_active: true,
            created_at: base + Duration::seconds(age_secs),
            updated_at: base,
        }
    }

    fn names(nodes: &[PageNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.page.name.as_str()).collect()
    }

    fn count(nodes: &[PageNode]) -> usize {
        nodes
            .iter()
            .map(|n| 1 + n.children.as_deref().map(count).unwrap_or(0))
            .sum()
    }

    #[test]
    fn roots_are_ordered_by_index_then_creation() {
        let a = page("A", None, 2, 0);
        let b = page("B", None, 1, 5);
        let c = page("C", None, 1, 1);
        let forest = build_forest(vec![a, b, c]);
        assert_eq!(names(&forest), vec!["C", "B", "A"]);
    }

    #[test]
    fn children_nest_once_under_their_parent() {
        let root = page("Settings", None, 0, 0);
        let child = page("Roles", Some(&root), 1, 0);
        let sibling = page("Users", Some(&root), 0, 0);
        let grandchild = page("Permissions", Some(&child), 0, 0);

        let forest = build_forest(vec![grandchild, child, root, sibling]);

        assert_eq!(names(&forest), vec!["Settings"]);
        let kids = forest[0].children.as_ref().unwrap();
        assert_eq!(names(kids), vec!["Users", "Roles"]);
        assert!(kids[0].children.is_none());
        assert_eq!(names(kids[1].children.as_ref().unwrap()), vec!["Permissions"]);
        assert_eq!(count(&forest), 4);
    }

    #[test]
    fn orphans_and_cycles_are_excluded() {
        let root = page("Home", None, 0, 0);
        let ghost = page("Ghost", None, 0, 0);
        let orphan = page("Orphan", Some(&ghost), 0, 0);

        let mut x = page("X", None, 0, 0);
        let mut y = page("Y", None, 0, 0);
        x.parent_id = Some(y.id);
        y.parent_id = Some(x.id);

        let forest = build_forest(vec![root, orphan, x, y]);
        assert_eq!(names(&forest), vec!["Home"]);
        assert_eq!(count(&forest), 1);
    }

    #[test]
    fn leaf_children_serialize_as_absent() {
        let forest = build_forest(vec![page("Solo", None, 0, 0)]);
        let json = serde_json::to_value(&forest).unwrap();
        assert!(json[0].get("children").is_none());
        assert_eq!(json[0]["orderIndex"], 0);
    }

    #[test]
    fn filter_keeps_ancestors_of_matches_only() {
        let root = page("Settings", None, 0, 0);
        let roles = page("Roles", Some(&root), 0, 0);
        let users = page("Users", Some(&root), 1, 0);
        let other = page("Dashboard", None, 1, 0);

        let forest = build_forest(vec![root, roles, users, other]);
        let filtered = filter_forest(forest, "ROL");

        assert_eq!(names(&filtered), vec!["Settings"]);
        assert_eq!(names(filtered[0].children.as_ref().unwrap()), vec!["Roles"]);
    }

    #[test]
    fn matching_ancestor_does_not_keep_descendants() {
        let root = page("Settings", None, 0, 0);
        let roles = page("Roles", Some(&root), 0, 0);
        let filtered = filter_forest(build_forest(vec![root, roles]), "settings");

        assert_eq!(names(&filtered), vec!["Settings"]);
        assert!(filtered[0].children.is_none());
    }

    #[test]
    fn blank_search_is_identity() {
        let forest = build_forest(vec![page("A", None, 0, 0), page("B", None, 1, 0)]);
        assert_eq!(count(&filter_forest(forest, "  ")), 2);
    }

    #[test]
    fn inactive_pages_take_their_subtree_with_them() {
        let mut root = page("Admin", None, 0, 0);
        root.is_active = false;
        let child = page("Roles", Some(&root), 0, 0);
        let visible = page("Home", None, 1, 0);

        let forest = prune_inactive(build_forest(vec![root, child, visible]));
        assert_eq!(names(&forest), vec!["Home"]);
    }

    #[test]
    fn parent_options_skip_the_page_and_its_subtree() {
        let root = page("Settings", None, 0, 0);
        let roles = page("Roles", Some(&root), 0, 0);
        let perms = page("Permissions", Some(&roles), 0, 0);
        let home = page("Home", None, 1, 0);
        let roles_id = roles.id;

        let forest = build_forest(vec![root, roles, perms, home]);

        let all = flatten_options(&forest, None);
        assert_eq!(
            all.iter().map(|o| (o.name.as_str(), o.depth)).collect::<Vec<_>>(),
            vec![("Settings", 0), ("Roles", 1), ("Permissions", 2), ("Home", 0)]
        );

        let options = flatten_options(&forest, Some(roles_id));
        assert_eq!(
            options.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            vec!["Settings", "Home"]
        );
    }
}
