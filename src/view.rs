use crate::client::GradebookSource;
use crate::expansion::ViewExpansion;
use crate::model::GradebookData;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    /// Every student's tree for one course.
    Course { course_id: String },
    /// One student's tree for one course.
    Student {
        student_id: String,
        course_id: String,
    },
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Course { .. } => "course",
            ViewKind::Student { .. } => "student",
        }
    }

    pub fn course_id(&self) -> &str {
        match self {
            ViewKind::Course { course_id } | ViewKind::Student { course_id, .. } => course_id,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        match self {
            ViewKind::Course { .. } => None,
            ViewKind::Student { student_id, .. } => Some(student_id),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(GradebookData),
    Unavailable,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradebookView {
    pub id: String,
    pub kind: ViewKind,
    pub load: LoadState,
    pub expansion: ViewExpansion,
    pub opened_at: DateTime<Utc>,
}

impl GradebookView {
    pub fn subject_count(&self) -> usize {
        match &self.load {
            LoadState::Ready(data) => data.trees.len(),
            _ => 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: HashMap<String, GradebookView>,
}

impl ViewRegistry {
    pub fn mount(&mut self, kind: ViewKind) -> String {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(view_id = %id, kind = kind.as_str(), course_id = kind.course_id(), "mount view");
        self.views.insert(
            id.clone(),
            GradebookView {
                id: id.clone(),
                kind,
                load: LoadState::Loading,
                expansion: ViewExpansion::default(),
                opened_at: Utc::now(),
            },
        );
        id
    }

    /// Stores a fetch outcome. Returns false (and drops the outcome) when
    /// the view was unmounted while the fetch was in flight.
    pub fn apply_fetch(&mut self, view_id: &str, outcome: anyhow::Result<GradebookData>) -> bool {
        let Some(view) = self.views.get_mut(view_id) else {
            tracing::debug!(view_id, "view unmounted before fetch completed; dropping result");
            return false;
        };
        view.load = match outcome {
            Ok(data) if data.is_empty() => {
                tracing::info!(view_id, "gradebook is empty");
                LoadState::Unavailable
            }
            Ok(data) => LoadState::Ready(data),
            Err(e) => {
                tracing::warn!(view_id, error = %format!("{e:#}"), "gradebook fetch failed");
                LoadState::Unavailable
            }
        };
        true
    }

    pub fn unmount(&mut self, view_id: &str) -> bool {
        let removed = self.views.remove(view_id).is_some();
        if removed {
            tracing::debug!(view_id, "unmount view");
        }
        removed
    }

    pub fn get(&self, view_id: &str) -> Option<&GradebookView> {
        self.views.get(view_id)
    }

    pub fn get_mut(&mut self, view_id: &str) -> Option<&mut GradebookView> {
        self.views.get_mut(view_id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Views in the order they were opened.
    pub fn list(&self) -> Vec<&GradebookView> {
        let mut out: Vec<&GradebookView> = self.views.values().collect();
        out.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

pub fn fetch(source: &dyn GradebookSource, kind: &ViewKind) -> anyhow::Result<GradebookData> {
    match kind {
        ViewKind::Course { course_id } => source.course_gradebooks(course_id),
        ViewKind::Student {
            student_id,
            course_id,
        } => source.student_gradebook(student_id, course_id),
    }
}

/// Mounts a view and performs its one-shot fetch.
pub fn open(registry: &mut ViewRegistry, source: &dyn GradebookSource, kind: ViewKind) -> String {
    let view_id = registry.mount(kind.clone());
    let outcome = fetch(source, &kind);
    registry.apply_fetch(&view_id, outcome);
    view_id
}
