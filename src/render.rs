use crate::calc::{format_points, group_by_category, percentage, NOT_APPLICABLE};
use crate::expansion::{QuarterKey, SemesterKey, SubjectKey, ViewExpansion};
use crate::model::{Course, GradeCell, GradeTree, GradebookData, Quarter, Semester};
use crate::view::LoadState;
use serde::Serialize;
use std::fmt::Write as _;

pub const NO_GRADEBOOK: &str = "No Gradebook Available";
pub const NO_ASSESSMENTS: &str = "No assessments found for this course";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum GradebookDisplay {
    Loading,
    Unavailable {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Ready {
        grading_system: String,
        subjects: Vec<SubjectBlock>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GradeDisplay {
    #[serde(rename_all = "camelCase")]
    Letter {
        grade: String,
        letter_grade: String,
        gpa: String,
    },
    Points { points: String, remarks: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBlock {
    pub subject_id: String,
    pub title: String,
    pub course: Course,
    pub grade: GradeDisplay,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semesters: Option<Vec<SemesterBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterBlock {
    pub semester_id: String,
    pub title: String,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarters: Option<Vec<QuarterBlock>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterBlock {
    pub quarter_id: String,
    pub title: String,
    pub grade: GradeDisplay,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryTable>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTable {
    pub category: String,
    pub rows: Vec<AssessmentRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRow {
    pub assessment_id: String,
    pub title: String,
    pub category: String,
    pub student_points: Option<f64>,
    pub max_points: Option<f64>,
    pub score: String,
    pub percentage: String,
}

fn opt_text(v: Option<&str>) -> String {
    v.unwrap_or(NOT_APPLICABLE).to_string()
}

fn grade_display(cell: &GradeCell) -> GradeDisplay {
    match cell {
        GradeCell::Letter(g) => GradeDisplay::Letter {
            grade: format_points(g.grade),
            letter_grade: opt_text(g.letter.as_deref()),
            gpa: g
                .gpa
                .filter(|v| v.is_finite())
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        },
        GradeCell::Points(g) => GradeDisplay::Points {
            points: format_points(g.points),
            remarks: opt_text(g.remarks.as_deref()),
        },
    }
}

fn render_quarter(
    subject_id: &str,
    semester_id: &str,
    quarter: &Quarter,
    exp: &ViewExpansion,
) -> QuarterBlock {
    let expanded = exp
        .quarters
        .is_expanded(&QuarterKey::new(subject_id, semester_id, &quarter.id));
    let categories = expanded.then(|| {
        group_by_category(Some(quarter.assessments.as_slice()))
            .into_iter()
            .map(|group| CategoryTable {
                category: group.category.to_string(),
                rows: group
                    .assessments
                    .into_iter()
                    .map(|a| AssessmentRow {
                        assessment_id: a.id.clone(),
                        title: a.title.clone(),
                        category: a.category.clone(),
                        student_points: a.student_points,
                        max_points: a.max_points,
                        score: format!(
                            "{}/{}",
                            format_points(a.student_points),
                            format_points(a.max_points)
                        ),
                        percentage: percentage(a.student_points, a.max_points).to_string(),
                    })
                    .collect(),
            })
            .collect()
    });
    QuarterBlock {
        quarter_id: quarter.id.clone(),
        title: quarter.title.clone(),
        grade: grade_display(&quarter.grade),
        expanded,
        categories,
    }
}

fn render_semester(subject_id: &str, semester: &Semester, exp: &ViewExpansion) -> SemesterBlock {
    let expanded = exp
        .semesters
        .is_expanded(&SemesterKey::new(subject_id, &semester.id));
    let quarters = expanded.then(|| {
        semester
            .quarters
            .iter()
            .map(|q| render_quarter(subject_id, &semester.id, q, exp))
            .collect()
    });
    SemesterBlock {
        semester_id: semester.id.clone(),
        title: semester.title.clone(),
        expanded,
        quarters,
    }
}

fn render_subject(tree: &GradeTree, exp: &ViewExpansion) -> SubjectBlock {
    let expanded = exp.subjects.is_expanded(&SubjectKey::new(&tree.subject_id));
    let (semesters, empty_message) = match (expanded, tree.semesters.is_empty()) {
        (false, _) => (None, None),
        (true, true) => (Some(Vec::new()), Some(NO_ASSESSMENTS.to_string())),
        (true, false) => (
            Some(
                tree.semesters
                    .iter()
                    .map(|s| render_semester(&tree.subject_id, s, exp))
                    .collect(),
            ),
            None,
        ),
    };
    SubjectBlock {
        subject_id: tree.subject_id.clone(),
        title: tree.title.clone(),
        course: tree.course.clone(),
        grade: grade_display(&tree.grade),
        expanded,
        semesters,
        empty_message,
    }
}

pub fn render_data(data: &GradebookData, exp: &ViewExpansion) -> GradebookDisplay {
    if data.is_empty() {
        return GradebookDisplay::Unavailable {
            message: NO_GRADEBOOK.to_string(),
        };
    }
    GradebookDisplay::Ready {
        grading_system: data.grading_system.as_str().to_string(),
        subjects: data.trees.iter().map(|t| render_subject(t, exp)).collect(),
    }
}

/// Builds the display for a view. Pure: reads only the data already held.
pub fn render(load: &LoadState, exp: &ViewExpansion) -> GradebookDisplay {
    match load {
        LoadState::Loading => GradebookDisplay::Loading,
        LoadState::Unavailable => GradebookDisplay::Unavailable {
            message: NO_GRADEBOOK.to_string(),
        },
        LoadState::Ready(data) => render_data(data, exp),
    }
}

fn marker(expanded: bool) -> &'static str {
    if expanded {
        "[-]"
    } else {
        "[+]"
    }
}

fn grade_text(grade: &GradeDisplay) -> String {
    match grade {
        GradeDisplay::Letter {
            grade,
            letter_grade,
            gpa,
        } => format!("grade {} | letter {} | gpa {}", grade, letter_grade, gpa),
        GradeDisplay::Points { points, remarks } => {
            format!("points {} | remarks {}", points, remarks)
        }
    }
}

/// Plain-text rendering for terminals.
pub fn to_text(display: &GradebookDisplay) -> String {
    let mut out = String::new();
    match display {
        GradebookDisplay::Loading => out.push_str("Loading...\n"),
        GradebookDisplay::Unavailable { message } => {
            let _ = writeln!(out, "{}", message);
        }
        GradebookDisplay::Ready { subjects, .. } => {
            for subject in subjects {
                let _ = writeln!(
                    out,
                    "{} {}  ({})",
                    marker(subject.expanded),
                    subject.title,
                    grade_text(&subject.grade)
                );
                if let Some(msg) = &subject.empty_message {
                    let _ = writeln!(out, "    {}", msg);
                }
                for semester in subject.semesters.iter().flatten() {
                    let _ = writeln!(out, "  {} {}", marker(semester.expanded), semester.title);
                    for quarter in semester.quarters.iter().flatten() {
                        let _ = writeln!(
                            out,
                            "    {} {}  ({})",
                            marker(quarter.expanded),
                            quarter.title,
                            grade_text(&quarter.grade)
                        );
                        let Some(categories) = &quarter.categories else {
                            continue;
                        };
                        if categories.is_empty() {
                            let _ = writeln!(out, "        (no assessments)");
                        }
                        for table in categories {
                            let _ = writeln!(out, "      {}", table.category);
                            for row in &table.rows {
                                let _ = writeln!(
                                    out,
                                    "        {:<28} {:>9} {:>7}",
                                    row.title, row.score, row.percentage
                                );
                            }
                        }
                    }
                }
            }
        }
    }
    out
}
