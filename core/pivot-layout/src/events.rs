//! FILENAME: core/pivot-layout/src/events.rs
//! Event types for layout change notifications.
//!
//! Listeners run synchronously, after the operation that emitted the event
//! has fully completed. Events borrow the engine state they describe.

use std::collections::BTreeMap;

use crate::definition::{Pagination, SortParam};
use crate::hierarchy::Hierarchy;
use crate::layout::LayoutResult;
use crate::viewport::ScrollOffset;

#[derive(Debug, Clone, Copy)]
pub enum LayoutEvent<'a> {
    /// Both hierarchies were rebuilt from the dataset.
    HierarchyRebuilt {
        rows: &'a Hierarchy,
        columns: &'a Hierarchy,
    },
    /// A layout pass is about to run.
    BeforeLayout {
        rows: &'a Hierarchy,
        columns: &'a Hierarchy,
    },
    /// A layout pass finished; geometry is current.
    AfterLayout {
        rows: &'a Hierarchy,
        columns: &'a Hierarchy,
        layout: &'a LayoutResult,
    },
    /// The collapse state changed. Carries the full explicit map.
    CollapseChanged {
        rows: &'a Hierarchy,
        collapsed_rows: &'a BTreeMap<String, bool>,
        hierarchy_collapse: bool,
    },
    SortChanged {
        rows: &'a Hierarchy,
        columns: &'a Hierarchy,
        sort_params: &'a [SortParam],
    },
    PaginationChanged {
        rows: &'a Hierarchy,
        pagination: Option<Pagination>,
        page_count: usize,
    },
    ScrollChanged {
        rows: &'a Hierarchy,
        columns: &'a Hierarchy,
        scroll: ScrollOffset,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutEventKind {
    HierarchyRebuilt,
    BeforeLayout,
    AfterLayout,
    CollapseChanged,
    SortChanged,
    PaginationChanged,
    ScrollChanged,
}

impl LayoutEvent<'_> {
    pub fn kind(&self) -> LayoutEventKind {
        match self {
            LayoutEvent::HierarchyRebuilt { .. } => LayoutEventKind::HierarchyRebuilt,
            LayoutEvent::BeforeLayout { .. } => LayoutEventKind::BeforeLayout,
            LayoutEvent::AfterLayout { .. } => LayoutEventKind::AfterLayout,
            LayoutEvent::CollapseChanged { .. } => LayoutEventKind::CollapseChanged,
            LayoutEvent::SortChanged { .. } => LayoutEventKind::SortChanged,
            LayoutEvent::PaginationChanged { .. } => LayoutEventKind::PaginationChanged,
            LayoutEvent::ScrollChanged { .. } => LayoutEventKind::ScrollChanged,
        }
    }
}

/// Callback type for receiving layout events.
pub type EventListener = Box<dyn FnMut(&LayoutEvent<'_>)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    filter: Option<LayoutEventKind>,
    listener: EventListener,
}

#[derive(Default)]
pub struct EventRegistry {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens to every event.
    pub fn subscribe(&mut self, listener: EventListener) -> SubscriptionId {
        self.add(None, listener)
    }

    /// Listens to one kind of event.
    pub fn subscribe_to(&mut self, kind: LayoutEventKind, listener: EventListener) -> SubscriptionId {
        self.add(Some(kind), listener)
    }

    fn add(&mut self, filter: Option<LayoutEventKind>, listener: EventListener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription { id, filter, listener });
        id
    }

    /// Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Delivers `event` to matching listeners in subscription order.
    pub fn emit(&mut self, event: &LayoutEvent<'_>) {
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.filter.map_or(true, |f| f == kind) {
                (subscription.listener)(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
