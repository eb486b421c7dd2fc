use crate::model::GradebookData;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectKey {
    pub subject_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemesterKey {
    pub subject_id: String,
    pub semester_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuarterKey {
    pub subject_id: String,
    pub semester_id: String,
    pub quarter_id: String,
}

impl SubjectKey {
    pub fn new(subject_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
        }
    }
}

impl SemesterKey {
    pub fn new(subject_id: &str, semester_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            semester_id: semester_id.to_string(),
        }
    }
}

impl QuarterKey {
    pub fn new(subject_id: &str, semester_id: &str, quarter_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            semester_id: semester_id.to_string(),
            quarter_id: quarter_id.to_string(),
        }
    }
}

/// Any node that can be toggled in a gradebook view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
    Subject(SubjectKey),
    Semester(SemesterKey),
    Quarter(QuarterKey),
}

/// Boolean map for one tree level. Keys never seen are collapsed.
#[derive(Debug, Clone)]
pub struct ExpansionState<K> {
    expanded: HashMap<K, bool>,
}

impl<K> Default for ExpansionState<K> {
    fn default() -> Self {
        Self {
            expanded: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> ExpansionState<K> {
    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.get(key).copied().unwrap_or(false)
    }

    /// Flips the node and returns its new state.
    pub fn toggle(&mut self, key: K) -> bool {
        let slot = self.expanded.entry(key).or_insert(false);
        *slot = !*slot;
        *slot
    }

    pub fn set(&mut self, key: K, expanded: bool) {
        self.expanded.insert(key, expanded);
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.values().filter(|v| **v).count()
    }
}

/// The three per-level stores owned by one view. Collapsing a parent leaves
/// its descendants' entries untouched, so re-expanding restores them.
#[derive(Debug, Clone, Default)]
pub struct ViewExpansion {
    pub subjects: ExpansionState<SubjectKey>,
    pub semesters: ExpansionState<SemesterKey>,
    pub quarters: ExpansionState<QuarterKey>,
}

impl ViewExpansion {
    pub fn is_expanded(&self, node: &NodeKey) -> bool {
        match node {
            NodeKey::Subject(k) => self.subjects.is_expanded(k),
            NodeKey::Semester(k) => self.semesters.is_expanded(k),
            NodeKey::Quarter(k) => self.quarters.is_expanded(k),
        }
    }

    pub fn toggle(&mut self, node: NodeKey) -> bool {
        match node {
            NodeKey::Subject(k) => self.subjects.toggle(k),
            NodeKey::Semester(k) => self.semesters.toggle(k),
            NodeKey::Quarter(k) => self.quarters.toggle(k),
        }
    }

    /// Marks every node of the loaded trees expanded.
    pub fn expand_all(&mut self, data: &GradebookData) {
        for tree in &data.trees {
            let subject = tree.subject_id.as_str();
            self.subjects.set(SubjectKey::new(subject), true);
            for semester in &tree.semesters {
                self.semesters
                    .set(SemesterKey::new(subject, &semester.id), true);
                for quarter in &semester.quarters {
                    self.quarters
                        .set(QuarterKey::new(subject, &semester.id, &quarter.id), true);
                }
            }
        }
    }
}
