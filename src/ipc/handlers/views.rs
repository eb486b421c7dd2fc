use crate::expansion::{NodeKey, QuarterKey, SemesterKey, SubjectKey};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::render;
use crate::view::{self, GradebookView, ViewKind};
use serde_json::json;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn view_ref<'a>(state: &'a AppState, req: &Request) -> Result<&'a GradebookView, serde_json::Value> {
    let view_id = required_str(req, "viewId")?;
    state.views.get(&view_id).ok_or_else(|| {
        err(
            &req.id,
            "not_found",
            "view not found",
            Some(json!({ "viewId": view_id })),
        )
    })
}

fn view_summary(v: &GradebookView) -> serde_json::Value {
    json!({
        "viewId": v.id,
        "kind": v.kind.as_str(),
        "courseId": v.kind.course_id(),
        "studentId": v.kind.student_id(),
        "status": v.load.as_str(),
        "expandedSubjects": v.expansion.subjects.expanded_count(),
        "openedAt": v.opened_at.to_rfc3339(),
    })
}

fn parse_view_kind(req: &Request) -> Result<ViewKind, serde_json::Value> {
    let course_id = required_str(req, "courseId")?;
    let kind = req
        .params
        .get("kind")
        .and_then(|v| v.as_str())
        .unwrap_or("course");
    match kind {
        "course" => Ok(ViewKind::Course { course_id }),
        "student" => {
            let student_id = required_str(req, "studentId")?;
            Ok(ViewKind::Student {
                student_id,
                course_id,
            })
        }
        other => Err(err(
            &req.id,
            "bad_params",
            "kind must be 'course' or 'student'",
            Some(json!({ "kind": other })),
        )),
    }
}

fn parse_node_key(req: &Request) -> Result<NodeKey, serde_json::Value> {
    let Some(level) = req.params.get("level").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing level", None));
    };
    let subject_id = required_str(req, "subjectId")?;
    match level {
        "subject" => Ok(NodeKey::Subject(SubjectKey { subject_id })),
        "semester" => Ok(NodeKey::Semester(SemesterKey {
            subject_id,
            semester_id: required_str(req, "semesterId")?,
        })),
        "quarter" => Ok(NodeKey::Quarter(QuarterKey {
            subject_id,
            semester_id: required_str(req, "semesterId")?,
            quarter_id: required_str(req, "quarterId")?,
        })),
        other => Err(err(
            &req.id,
            "bad_params",
            "level must be one of subject, semester, quarter",
            Some(json!({ "level": other })),
        )),
    }
}

fn handle_views_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let views: Vec<serde_json::Value> = state.views.list().into_iter().map(view_summary).collect();
    ok(&req.id, json!({ "views": views }))
}

fn handle_view_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_view_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(source) = state.backend.as_deref() else {
        return err(&req.id, "no_backend", "select a backend first", None);
    };

    let view_id = view::open(&mut state.views, source, kind);
    match state.views.get(&view_id) {
        Some(v) => ok(
            &req.id,
            json!({
                "viewId": v.id,
                "status": v.load.as_str(),
                "subjectCount": v.subject_count(),
            }),
        ),
        None => err(&req.id, "not_found", "view closed during open", None),
    }
}

fn handle_view_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let v = match view_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let display = render::render(&v.load, &v.expansion);
    match serde_json::to_value(&display) {
        Ok(value) => ok(&req.id, value),
        Err(e) => err(&req.id, "render_failed", e.to_string(), None),
    }
}

fn handle_view_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view_id = match required_str(req, "viewId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let node = match parse_node_key(req) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let Some(v) = state.views.get_mut(&view_id) else {
        return err(
            &req.id,
            "not_found",
            "view not found",
            Some(json!({ "viewId": view_id })),
        );
    };
    let expanded = v.expansion.toggle(node);
    ok(&req.id, json!({ "expanded": expanded }))
}

fn handle_view_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view_id = match required_str(req, "viewId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if !state.views.unmount(&view_id) {
        return err(
            &req.id,
            "not_found",
            "view not found",
            Some(json!({ "viewId": view_id })),
        );
    }
    ok(&req.id, json!({ "closed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "views.list" => Some(handle_views_list(state, req)),
        "view.open" => Some(handle_view_open(state, req)),
        "view.render" => Some(handle_view_render(state, req)),
        "view.toggle" => Some(handle_view_toggle(state, req)),
        "view.close" => Some(handle_view_close(state, req)),
        _ => None,
    }
}
