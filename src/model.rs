use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const NORMAL_GRADING: &str = "normalGrading";

/// Per-course display flag. Anything other than `normalGrading` (including a
/// missing or misconfigured value) selects the points/remarks shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradingSystem {
    Normal,
    Standard(String),
}

impl GradingSystem {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(NORMAL_GRADING) => GradingSystem::Normal,
            Some(other) => GradingSystem::Standard(other.to_string()),
            None => GradingSystem::Standard(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GradingSystem::Normal => NORMAL_GRADING,
            GradingSystem::Standard(raw) => raw.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LetterGrade {
    pub grade: Option<f64>,
    pub letter: Option<String>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointsGrade {
    pub points: Option<f64>,
    pub remarks: Option<String>,
}

/// The two mutually exclusive grade shapes. Which one a node carries is
/// decided once per tree by its [`GradingSystem`].
#[derive(Debug, Clone, PartialEq)]
pub enum GradeCell {
    Letter(LetterGrade),
    Points(PointsGrade),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub category: String,
    pub student_points: Option<f64>,
    pub max_points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quarter {
    pub id: String,
    pub title: String,
    pub grade: GradeCell,
    pub assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Semester {
    pub id: String,
    pub title: String,
    pub quarters: Vec<Quarter>,
}

/// One subject row: a student's tree in the course view, or the course
/// itself in the student view. `subject_id` keys the top-level expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeTree {
    pub subject_id: String,
    pub title: String,
    pub course: Course,
    pub grade: GradeCell,
    pub semesters: Vec<Semester>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradebookData {
    pub grading_system: GradingSystem,
    pub trees: Vec<GradeTree>,
}

impl GradebookData {
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Wire shapes. Decoding is lenient: absent or null members fall back to
// defaults and numbers may arrive as strings.

fn de_opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

fn de_opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// Nested records the backend may send unpopulated, as a bare id.
trait FromBareId: Sized {
    fn from_bare_id(id: String) -> Option<Self>;
}

/// Objects decode normally; a bare string or number is taken as the record's
/// id; anything else is dropped instead of failing the whole payload.
fn de_opt_record<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromBareId,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
        Some(Value::String(s)) => T::from_bare_id(s),
        Some(Value::Number(n)) => T::from_bare_id(n.to_string()),
        _ => None,
    })
}

fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireCourse {
    #[serde(alias = "_id", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireStudent {
    #[serde(alias = "_id", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireStandardGrade {
    #[serde(deserialize_with = "de_opt_f64")]
    pub points: Option<f64>,
    #[serde(deserialize_with = "de_opt_string")]
    pub remarks: Option<String>,
}

impl FromBareId for WireCourse {
    fn from_bare_id(id: String) -> Option<Self> {
        Some(Self {
            id: Some(id),
            ..Default::default()
        })
    }
}

impl FromBareId for WireStudent {
    fn from_bare_id(id: String) -> Option<Self> {
        Some(Self {
            id: Some(id),
            ..Default::default()
        })
    }
}

impl FromBareId for WireStandardGrade {
    fn from_bare_id(_id: String) -> Option<Self> {
        None
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireAssessment {
    #[serde(alias = "_id", deserialize_with = "de_opt_string")]
    pub assessment_id: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub assessment_title: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub student_points: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub max_points: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireQuarter {
    #[serde(deserialize_with = "de_opt_string")]
    pub quarter_id: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub quarter_title: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub grade: Option<f64>,
    #[serde(deserialize_with = "de_opt_string")]
    pub letter_grade: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub gpa: Option<f64>,
    #[serde(deserialize_with = "de_opt_record")]
    pub standard_grade: Option<WireStandardGrade>,
    #[serde(deserialize_with = "null_as_empty")]
    pub assessments: Vec<WireAssessment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireSemester {
    #[serde(deserialize_with = "de_opt_string")]
    pub semester_id: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub semester_title: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub quarters: Vec<WireQuarter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireGradeTree {
    #[serde(deserialize_with = "de_opt_record")]
    pub student: Option<WireStudent>,
    #[serde(deserialize_with = "de_opt_string")]
    pub student_id: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub student_name: Option<String>,
    #[serde(deserialize_with = "de_opt_record")]
    pub course: Option<WireCourse>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub course_grade: Option<f64>,
    /// The single-student endpoint names the overall grade `grade`.
    #[serde(deserialize_with = "de_opt_f64")]
    pub grade: Option<f64>,
    #[serde(deserialize_with = "de_opt_string")]
    pub letter_grade: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub gpa: Option<f64>,
    #[serde(deserialize_with = "de_opt_record")]
    pub standard_grade: Option<WireStandardGrade>,
    #[serde(deserialize_with = "de_opt_string")]
    pub grading_system: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub semesters: Vec<WireSemester>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireCourseGradebooks {
    #[serde(deserialize_with = "null_as_empty")]
    pub gradebook: Vec<WireGradeTree>,
    #[serde(deserialize_with = "de_opt_string")]
    pub grading_system: Option<String>,
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn select_grade(
    system: &GradingSystem,
    grade: Option<f64>,
    letter: Option<&str>,
    gpa: Option<f64>,
    standard: Option<&WireStandardGrade>,
) -> GradeCell {
    match system {
        GradingSystem::Normal => GradeCell::Letter(LetterGrade {
            grade,
            letter: non_empty(letter).map(str::to_string),
            gpa,
        }),
        GradingSystem::Standard(_) => GradeCell::Points(PointsGrade {
            points: standard.and_then(|s| s.points),
            remarks: standard
                .and_then(|s| non_empty(s.remarks.as_deref()))
                .map(str::to_string),
        }),
    }
}

impl WireAssessment {
    fn into_model(self, idx: usize) -> Assessment {
        Assessment {
            id: self.assessment_id.unwrap_or_else(|| format!("assessment-{}", idx + 1)),
            title: self.assessment_title.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            student_points: self.student_points,
            max_points: self.max_points,
        }
    }
}

impl WireQuarter {
    fn into_model(self, idx: usize, system: &GradingSystem) -> Quarter {
        let grade = select_grade(
            system,
            self.grade,
            self.letter_grade.as_deref(),
            self.gpa,
            self.standard_grade.as_ref(),
        );
        Quarter {
            id: self.quarter_id.unwrap_or_else(|| format!("quarter-{}", idx + 1)),
            title: self.quarter_title.unwrap_or_default(),
            grade,
            assessments: self
                .assessments
                .into_iter()
                .enumerate()
                .map(|(i, a)| a.into_model(i))
                .collect(),
        }
    }
}

impl WireSemester {
    fn into_model(self, idx: usize, system: &GradingSystem) -> Semester {
        Semester {
            id: self.semester_id.unwrap_or_else(|| format!("semester-{}", idx + 1)),
            title: self.semester_title.unwrap_or_default(),
            quarters: self
                .quarters
                .into_iter()
                .enumerate()
                .map(|(i, q)| q.into_model(i, system))
                .collect(),
        }
    }
}

impl WireGradeTree {
    fn student_key(&self) -> Option<String> {
        self.student
            .as_ref()
            .and_then(|s| non_empty(s.id.as_deref()))
            .or_else(|| non_empty(self.student_id.as_deref()))
            .map(str::to_string)
    }

    fn student_display_name(&self) -> Option<String> {
        if let Some(name) = non_empty(self.student_name.as_deref()) {
            return Some(name.to_string());
        }
        let s = self.student.as_ref()?;
        match (
            non_empty(s.last_name.as_deref()),
            non_empty(s.first_name.as_deref()),
        ) {
            (Some(last), Some(first)) => Some(format!("{}, {}", last, first)),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        }
    }

    /// Converts one tree. `subject_id` must already be unique within the
    /// gradebook it belongs to; see [`unique_subject_id`].
    pub fn into_model(self, subject_id: String, title: String, system: &GradingSystem) -> GradeTree {
        let course = self.course.unwrap_or_default();
        let grade = select_grade(
            system,
            self.course_grade.or(self.grade),
            self.letter_grade.as_deref(),
            self.gpa,
            self.standard_grade.as_ref(),
        );
        GradeTree {
            subject_id,
            title,
            course: Course {
                id: course.id.unwrap_or_default(),
                title: course.title.unwrap_or_default(),
                description: course.description.unwrap_or_default(),
                thumbnail: non_empty(course.thumbnail.as_deref()).map(str::to_string),
            },
            grade,
            semesters: self
                .semesters
                .into_iter()
                .enumerate()
                .map(|(i, s)| s.into_model(i, system))
                .collect(),
        }
    }
}

/// Suffixes repeated ids (`st1`, `st1#2`, ...) so expansion keys of two
/// subjects never collide.
fn unique_subject_id(base: String, used: &mut HashSet<String>) -> String {
    let mut id = base.clone();
    let mut n = 1;
    while !used.insert(id.clone()) {
        n += 1;
        id = format!("{}#{}", base, n);
    }
    id
}

impl WireCourseGradebooks {
    /// Course view (instructor dashboard): one subject per student.
    pub fn into_model(self) -> GradebookData {
        let system = GradingSystem::parse(self.grading_system.as_deref());
        let mut used: HashSet<String> = HashSet::new();
        let trees = self
            .gradebook
            .into_iter()
            .enumerate()
            .map(|(idx, tree)| {
                let subject_id = unique_subject_id(
                    tree.student_key()
                        .unwrap_or_else(|| format!("student-{}", idx + 1)),
                    &mut used,
                );
                let title = tree
                    .student_display_name()
                    .unwrap_or_else(|| format!("Student {}", idx + 1));
                tree.into_model(subject_id, title, &system)
            })
            .collect();
        GradebookData {
            grading_system: system,
            trees,
        }
    }
}

/// Student view: the single tree is its own subject, keyed by course id.
/// Without an explicit flag the payload is read as `normalGrading`, which is
/// the shape that endpoint documents (`grade`/`letterGrade`).
pub fn student_gradebook_from_wire(tree: WireGradeTree, course_id: &str) -> GradebookData {
    let system = match tree.grading_system.as_deref() {
        Some(raw) => GradingSystem::parse(Some(raw)),
        None => GradingSystem::Normal,
    };
    let subject_id = tree
        .course
        .as_ref()
        .and_then(|c| non_empty(c.id.as_deref()))
        .unwrap_or(course_id)
        .to_string();
    let title = tree
        .course
        .as_ref()
        .and_then(|c| non_empty(c.title.as_deref()))
        .unwrap_or("Course")
        .to_string();
    let tree = tree.into_model(subject_id, title, &system);
    GradebookData {
        grading_system: system,
        trees: vec![tree],
    }
}
