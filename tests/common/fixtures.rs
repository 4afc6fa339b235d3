//! Test fixtures
//!
//! Unistats payloads and store documents for the University of Sussex.

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Credential the gateway sends to Unistats
pub const UNISTATS_AUTH: &str = "dW5pbmluamE6c2VjcmV0";

pub const SUSSEX: &str = "10007806";

/// Contents of the `uni` collection
pub fn supplement_documents() -> Value {
    json!([
        {
            "pubukprn": SUSSEX,
            "url": "https://www.sussex.ac.uk",
            "color": "#003B4C",
            "lat": 50.8671,
            "lon": -0.0879,
            "averageRent": 130.5,
            "uniLocationType": "campus",
            "uniType": "russell",
            "nearestTrainStation": "Falmer"
        }
    ])
}

fn authorised(route: &str) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header(
            "authorization",
            format!("Basic {}", UNISTATS_AUTH).as_str(),
        ))
}

/// `Institution/{SUSSEX}.json`
pub async fn mount_sussex(server: &MockServer) {
    authorised(&format!("/Institution/{}.json", SUSSEX))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UKPRN": 10007806,
            "Name": "University of Sussex",
            "StudentUnionUrl": "https://www.sussexstudent.com"
        })))
        .mount(server)
        .await;
}

/// `Institutions.json`
pub async fn mount_institutions(server: &MockServer) {
    authorised("/Institutions.json")
        .and(query_param("pageSize", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "UKPRN": 10007806, "Name": "University of Sussex", "StudentUnionUrl": "x" },
            { "UKPRN": "10007850", "Name": "University of Bath" }
        ])))
        .mount(server)
        .await;
}

/// `Institution/{SUSSEX}/Courses.json`
pub async fn mount_courses(server: &MockServer) {
    authorised(&format!("/Institution/{}/Courses.json", SUSSEX))
        .and(query_param("pageSize", "300"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Title": "Computer Science", "KisCourseId": "G400", "KisMode": 1 },
            { "Title": "Law", "KisCourseId": 11025, "KisMode": "2" }
        ])))
        .mount(server)
        .await;
}

/// `Institution/{SUSSEX}/Course/G400/1.json`
pub async fn mount_course_detail(server: &MockServer) {
    authorised(&format!("/Institution/{}/Course/G400/1.json", SUSSEX))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Computer Science",
            "KisAimLabel": "MComp",
            "CoursePageUrl": "https://www.sussex.ac.uk/study/cs",
            "LengthInYears": 4,
            "SandwichAvailable": 2,
            "YearAbroad": 0,
            "Honours": 1
        })))
        .mount(server)
        .await;
}

/// Every Unistats endpoint fails
pub async fn mount_outage(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(server)
        .await;
}
