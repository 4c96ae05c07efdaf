//! Sidebar: filter menu, tag list and the empty-trash affordance

use serde::Serialize;

use crate::store::{FilterCounts, FilterCriteria, TaskFilter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    pub filter: TaskFilter,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagEntry {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidebar {
    pub filters: Vec<FilterEntry>,
    pub tags: Vec<TagEntry>,
    pub show_empty_trash: bool,
}

impl Sidebar {
    pub fn new(criteria: &FilterCriteria, counts: &FilterCounts, tags: &[String]) -> Self {
        let filters = TaskFilter::ALL
            .iter()
            .map(|&filter| FilterEntry {
                filter,
                label: filter.label(),
                count: counts.get(filter),
                active: criteria.filter == filter,
            })
            .collect();

        let tags = tags
            .iter()
            .map(|name| TagEntry {
                name: name.clone(),
                active: criteria.tag.as_deref() == Some(name.as_str()),
            })
            .collect();

        Self {
            filters,
            tags,
            show_empty_trash: criteria.filter == TaskFilter::Trash,
        }
    }
}
