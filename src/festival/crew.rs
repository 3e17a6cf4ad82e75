use serde::{Deserialize, Serialize};

use crate::festival::models::CrewMember;

/// Rows shown before the caller asks to reveal the full roster.
pub const PREVIEW_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewSortKey {
    #[default]
    Name,
    Role,
    Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrewQuery {
    /// Free-text filter; empty keeps every member.
    pub query: String,
    pub sort_by: CrewSortKey,
    pub order: SortOrder,
    pub reveal_all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewView {
    pub members: Vec<CrewMember>,
    /// Matches hidden by the preview truncation.
    pub hidden: usize,
    pub total_matched: usize,
}

/// Pure and deterministic; re-run on every keystroke or toggle. Matching is
/// a case-insensitive substring test against name, localized name, and
/// role. The sort is stable, so ties keep roster order.
pub fn filter_and_sort(members: &[CrewMember], query: &CrewQuery) -> CrewView {
    let needle = query.query.to_lowercase();

    let mut matched: Vec<CrewMember> = members
        .iter()
        .filter(|m| {
            needle.is_empty()
                || m.full_name.to_lowercase().contains(&needle)
                || m.full_name_th
                    .as_deref()
                    .is_some_and(|th| th.to_lowercase().contains(&needle))
                || m.role.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        let ordering = match query.sort_by {
            CrewSortKey::Name => a.full_name.cmp(&b.full_name),
            CrewSortKey::Role => a.role.cmp(&b.role),
            CrewSortKey::Age => a.age.cmp(&b.age),
        };
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total_matched = matched.len();
    if !query.reveal_all {
        matched.truncate(PREVIEW_LIMIT);
    }
    let hidden = total_matched - matched.len();

    CrewView {
        members: matched,
        hidden,
        total_matched,
    }
}
