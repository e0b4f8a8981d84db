use std::collections::BTreeSet;

use crate::schema::SchemaModel;
use crate::state::LayoutState;

/// Resolve the active view into the set of visible table names.
///
/// `None` means "all visible": either no view is active, or the active
/// view's table set is empty or entirely invalid. Degrading to "all" is a
/// deliberate recovery rule so a stale view never blanks the diagram.
pub fn visible_tables(schema: &SchemaModel, state: &LayoutState) -> Option<BTreeSet<String>> {
    let active_id = state.active_view.as_deref()?;
    let view = state.views.iter().find(|view| view.id == active_id)?;
    let resolved: BTreeSet<String> = view
        .tables
        .iter()
        .filter(|table| schema.entity(table).is_some())
        .cloned()
        .collect();
    if resolved.is_empty() {
        return None;
    }
    Some(resolved)
}

pub fn is_visible(visible: &Option<BTreeSet<String>>, entity: &str) -> bool {
    match visible {
        Some(set) => set.contains(entity),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ViewDef;

    fn schema() -> SchemaModel {
        SchemaModel::from_json(
            r#"{ "entities": [{ "name": "a" }, { "name": "b" }, { "name": "c" }] }"#,
        )
        .unwrap()
    }

    fn state_with_view(tables: Vec<&str>, active: bool) -> LayoutState {
        let mut state = LayoutState::default();
        state.views.push(ViewDef {
            id: "v1".to_string(),
            name: "View 1".to_string(),
            tables: tables.into_iter().map(String::from).collect(),
        });
        if active {
            state.active_view = Some("v1".to_string());
        }
        state
    }

    #[test]
    fn no_active_view_shows_all() {
        let visible = visible_tables(&schema(), &state_with_view(vec!["a"], false));
        assert!(visible.is_none());
        assert!(is_visible(&visible, "c"));
    }

    #[test]
    fn active_view_filters() {
        let visible = visible_tables(&schema(), &state_with_view(vec!["a", "b"], true));
        assert!(is_visible(&visible, "a"));
        assert!(!is_visible(&visible, "c"));
    }

    #[test]
    fn empty_table_set_degrades_to_all() {
        let visible = visible_tables(&schema(), &state_with_view(vec![], true));
        assert!(visible.is_none());
    }

    #[test]
    fn fully_invalid_table_set_degrades_to_all() {
        let visible = visible_tables(&schema(), &state_with_view(vec!["ghost", "gone"], true));
        assert!(visible.is_none());
    }

    #[test]
    fn partially_invalid_table_set_keeps_valid_entries() {
        let visible = visible_tables(&schema(), &state_with_view(vec!["a", "ghost"], true));
        assert!(is_visible(&visible, "a"));
        assert!(!is_visible(&visible, "b"));
    }
}
