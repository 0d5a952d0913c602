//! Presentation order and grouping of the metric collection.
//!
//! [`ViewModel::derive`] is a pure function of the canonical collection: it
//! sorts (newest period first, then name) and optionally groups by section,
//! without touching the store. Every [`ViewItem`] carries the canonical
//! `store_index` of its record, so actions taken on a displayed item are
//! translated back to the store through [`ViewModel::store_index`].
//!
//! The UI layer is reached through the [`Renderer`] trait;
//! [`RenderOnChange`] plugs a renderer into the store so the view is
//! re-derived after every mutation.

pub mod terminal;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{trace, warn};

use crate::error::Result;
use crate::period::{display_label, Period};
use crate::record::MetricRecord;
use crate::store::StoreObserver;

/// Default title of the bucket for records without a known section.
pub const DEFAULT_FALLBACK_SECTION: &str = "Прочее";

/// How the view is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    /// Partition records by section.
    pub grouped: bool,

    /// Known sections in display order. Empty means every tag is known.
    pub sections: Vec<String>,

    /// Title of the bucket for missing or unknown sections.
    pub fallback_section: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            grouped: true,
            sections: Vec::new(),
            fallback_section: DEFAULT_FALLBACK_SECTION.to_string(),
        }
    }
}

/// Session-local collapse/expand state of section groups. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: HashSet<String>,
}

impl CollapseState {
    /// Create a state with every group expanded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a group's state and return whether it is now collapsed.
    pub fn toggle(&mut self, section: &str) -> bool {
        if self.collapsed.remove(section) {
            false
        } else {
            self.collapsed.insert(section.to_string());
            true
        }
    }

    /// Collapse a group.
    pub fn collapse(&mut self, section: &str) {
        self.collapsed.insert(section.to_string());
    }

    /// Expand a group.
    pub fn expand(&mut self, section: &str) {
        self.collapsed.remove(section);
    }

    /// Whether a group is collapsed.
    #[must_use]
    pub fn is_collapsed(&self, section: &str) -> bool {
        self.collapsed.contains(section)
    }
}

/// One displayed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewItem {
    /// 1-based display number.
    pub position: usize,
    /// Position of the record in the canonical collection.
    pub store_index: usize,
    /// Record name.
    pub name: String,
    /// Record value.
    pub value: String,
    /// Record period.
    pub period: Period,
    /// Display label of the period.
    pub period_label: String,
    /// Record section tag, as stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A section bucket of the grouped view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGroup {
    /// Group title; the fallback bucket uses the fallback title.
    pub title: String,
    /// Whether this is the fallback bucket.
    pub fallback: bool,
    /// Number of records in the group, collapsed or not.
    pub count: usize,
    /// Whether the group is collapsed in this session.
    pub collapsed: bool,
    /// All items of the group in display order.
    pub items: Vec<ViewItem>,
}

impl SectionGroup {
    /// Items to display: none when collapsed.
    #[must_use]
    pub fn visible_items(&self) -> &[ViewItem] {
        if self.collapsed {
            &[]
        } else {
            &self.items
        }
    }
}

/// Derived, read-only projection of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewModel {
    /// The collection is empty; show the placeholder.
    Empty,
    /// A single sorted list.
    Flat {
        /// Items in display order.
        items: Vec<ViewItem>,
    },
    /// Sorted lists per section.
    Grouped {
        /// Groups in display order.
        groups: Vec<SectionGroup>,
    },
}

/// Display ordering: period descending, then name ascending.
///
/// Names compare case-insensitively first, then exactly, so the order is
/// total for distinct names.
#[must_use]
pub fn display_order(a: &MetricRecord, b: &MetricRecord) -> Ordering {
    b.period
        .cmp(&a.period)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

impl ViewModel {
    /// Derive the view of `records`.
    #[must_use]
    pub fn derive(
        records: &[MetricRecord],
        options: &ViewOptions,
        collapse: &CollapseState,
    ) -> Self {
        if records.is_empty() {
            return Self::Empty;
        }

        // Stable sort keeps storage order for full ties.
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| display_order(&records[a], &records[b]));

        if !options.grouped {
            let items = order
                .into_iter()
                .enumerate()
                .map(|(i, index)| view_item(i + 1, index, &records[index]))
                .collect();
            return Self::Flat { items };
        }

        let mut named: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut fallback = Vec::new();
        for index in order {
            match bucket(&records[index], options) {
                Some(title) => named.entry(title.to_string()).or_default().push(index),
                None => fallback.push(index),
            }
        }

        let mut buckets: Vec<(String, bool, Vec<usize>)> = Vec::new();
        if options.sections.is_empty() {
            buckets.extend(named.into_iter().map(|(title, idx)| (title, false, idx)));
        } else {
            for title in &options.sections {
                if let Some(idx) = named.remove(title) {
                    buckets.push((title.clone(), false, idx));
                }
            }
        }
        if !fallback.is_empty() {
            buckets.push((options.fallback_section.clone(), true, fallback));
        }

        let mut position = 0;
        let groups = buckets
            .into_iter()
            .map(|(title, is_fallback, indices)| {
                let items: Vec<ViewItem> = indices
                    .into_iter()
                    .map(|index| {
                        position += 1;
                        view_item(position, index, &records[index])
                    })
                    .collect();
                SectionGroup {
                    collapsed: collapse.is_collapsed(&title),
                    count: items.len(),
                    title,
                    fallback: is_fallback,
                    items,
                }
            })
            .collect();

        Self::Grouped { groups }
    }

    /// Whether the view shows the empty placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// All items in display order, including those of collapsed groups.
    pub fn items(&self) -> Box<dyn Iterator<Item = &ViewItem> + '_> {
        match self {
            Self::Empty => Box::new(std::iter::empty()),
            Self::Flat { items } => Box::new(items.iter()),
            Self::Grouped { groups } => Box::new(groups.iter().flat_map(|g| g.items.iter())),
        }
    }

    /// Number of items in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items().count()
    }

    /// Translate a 1-based display position to a canonical store index.
    #[must_use]
    pub fn store_index(&self, position: usize) -> Option<usize> {
        self.items()
            .find(|item| item.position == position)
            .map(|item| item.store_index)
    }
}

/// The known section a record belongs to, or `None` for the fallback bucket.
fn bucket<'a>(record: &'a MetricRecord, options: &ViewOptions) -> Option<&'a str> {
    let section = record.section()?;
    if section.trim().is_empty() || section == options.fallback_section {
        return None;
    }
    if !options.sections.is_empty() && !options.sections.iter().any(|s| s == section) {
        return None;
    }
    Some(section)
}

fn view_item(position: usize, store_index: usize, record: &MetricRecord) -> ViewItem {
    ViewItem {
        position,
        store_index,
        name: record.name.clone(),
        value: record.value.clone(),
        period: record.period,
        period_label: display_label(&record.period),
        section: record.section.clone(),
    }
}

/// A UI layer that displays view models.
pub trait Renderer {
    /// Display the view model, replacing whatever was shown before.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn render(&mut self, view: &ViewModel) -> Result<()>;
}

/// Store observer that re-derives and re-renders the view on every change.
#[derive(Debug)]
pub struct RenderOnChange<R> {
    renderer: R,
    options: ViewOptions,
    collapse: CollapseState,
}

impl<R: Renderer> RenderOnChange<R> {
    /// Create an observer rendering through `renderer`.
    #[must_use]
    pub fn new(renderer: R, options: ViewOptions, collapse: CollapseState) -> Self {
        Self {
            renderer,
            options,
            collapse,
        }
    }
}

impl<R: Renderer> StoreObserver for RenderOnChange<R> {
    fn store_changed(&mut self, records: &[MetricRecord]) {
        let view = ViewModel::derive(records, &self.options, &self.collapse);
        trace!(items = view.len(), "Re-rendering view");
        if let Err(e) = self.renderer.render(&view) {
            warn!(error = %e, "Failed to render view");
        }
    }
}
