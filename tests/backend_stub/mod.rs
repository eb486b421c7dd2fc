#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

/// Canned LMS backend serving the two gradebook endpoints.
pub struct BackendStub {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BackendStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start backend stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/api");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let (status, body) = route(request.url());
            let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("content-type header");
            let _ = request.respond(
                tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header),
            );
        });

        Self {
            base_url,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for BackendStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn route(url: &str) -> (u16, String) {
    match url {
        "/api/gradebook/getGradebooksOfCourseFormatted/bio101" => (200, course_payload().to_string()),
        "/api/gradebook/getGradebooksOfCourseFormatted/standards101" => {
            let mut payload = course_payload();
            payload["gradingSystem"] = json!("standardsBased");
            (200, payload.to_string())
        }
        "/api/gradebook/getGradebooksOfCourseFormatted/empty" => (
            200,
            json!({ "gradebook": [], "gradingSystem": "normalGrading" }).to_string(),
        ),
        "/api/gradebook/getGradebooksOfCourseFormatted/broken" => {
            (500, json!({ "message": "database exploded" }).to_string())
        }
        "/api/gradebook/getGradebooksOfCourseFormatted/garbled" => (200, "<html>".to_string()),
        "/api/gradebook/getGradebook/st1/bio101" => (200, student_payload().to_string()),
        _ => (404, json!({ "message": "not found" }).to_string()),
    }
}

pub fn course_payload() -> Value {
    json!({
        "gradingSystem": "normalGrading",
        "gradebook": [
            {
                "student": { "_id": "st1", "firstName": "Sam", "lastName": "Lee" },
                "course": { "_id": "bio101", "title": "Biology", "description": "Intro", "thumbnail": null },
                "courseGrade": 94.6,
                "letterGrade": "A",
                "gpa": 4.0,
                "standardGrade": { "points": 4, "remarks": "Mastery" },
                "semesters": [{
                    "semesterId": "S1",
                    "semesterTitle": "Fall",
                    "quarters": [{
                        "quarterId": "Q1",
                        "quarterTitle": "Q1",
                        "grade": 92,
                        "letterGrade": "A-",
                        "standardGrade": { "points": 3, "remarks": "Meets" },
                        "assessments": [
                            { "assessmentId": "a1", "assessmentTitle": "Worksheet 1", "category": "Homework", "studentPoints": 5, "maxPoints": 5 },
                            { "assessmentId": "a2", "assessmentTitle": "Unit Exam", "category": "Exam", "studentPoints": 18, "maxPoints": 20 }
                        ]
                    }]
                }]
            },
            {
                "student": { "_id": "st2", "firstName": "Kim", "lastName": "Park" },
                "course": { "_id": "bio101", "title": "Biology" },
                "courseGrade": null,
                "semesters": null
            }
        ]
    })
}

pub fn student_payload() -> Value {
    json!({
        "course": { "_id": "bio101", "title": "Biology" },
        "grade": 94.6,
        "letterGrade": "A",
        "semesters": [{
            "semesterId": "S1",
            "semesterTitle": "Fall",
            "quarters": [{
                "quarterId": "Q1",
                "quarterTitle": "Q1",
                "grade": 92,
                "letterGrade": "A-",
                "assessments": [
                    { "assessmentId": "a1", "assessmentTitle": "Worksheet 1", "category": "Homework", "studentPoints": 5, "maxPoints": 5 },
                    { "assessmentId": "a3", "assessmentTitle": "Lab Safety", "category": "Lab", "studentPoints": 1, "maxPoints": 0 }
                ]
            }]
        }]
    })
}
