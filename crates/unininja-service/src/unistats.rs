//! Unistats API client
//!
//! Thin, authenticated GET wrapper over the four Unistats KIS endpoints the
//! gateway uses. Every call carries the same static Basic credential read
//! once from configuration.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use unininja_core::{
    CourseDetailRecord, CourseId, CourseSummary, CourseSummaryRecord, InstitutionRecord,
    Pubukprn, StudyMode, University,
};

use crate::error::{ServiceError, ServiceResult};

/// Default Unistats KIS API root
pub const DEFAULT_BASE_URL: &str = "https://data.unistats.ac.uk/api/v4/KIS";

/// Page size for the institution listing
pub const INSTITUTIONS_PAGE_SIZE: u32 = 1000;

/// Page size for an institution's course listing
pub const COURSES_PAGE_SIZE: u32 = 300;

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read access to Unistats, as needed by the resolvers
#[async_trait]
pub trait UnistatsApi: Send + Sync {
    /// All institutions, identifier and name only
    async fn fetch_university_list(&self) -> ServiceResult<Vec<University>>;

    /// One institution with its student union URL
    async fn fetch_university(&self, pubukprn: &Pubukprn) -> ServiceResult<University>;

    /// Courses offered by an institution
    async fn fetch_courses(&self, pubukprn: &Pubukprn) -> ServiceResult<Vec<CourseSummary>>;

    /// Raw detail record for one course in one study mode
    async fn fetch_course_detail(
        &self,
        pubukprn: &Pubukprn,
        kiscourseid: &CourseId,
        mode: &StudyMode,
    ) -> ServiceResult<CourseDetailRecord>;
}

/// Unistats client configuration
#[derive(Debug, Clone)]
pub struct UnistatsConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Base64 `user:password` credential sent as `Authorization: Basic <auth>`
    pub auth: SecretString,

    /// Per-call timeout
    pub timeout: Duration,
}

impl UnistatsConfig {
    /// Create a configuration for the public Unistats API
    pub fn new(auth: SecretString) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`UnistatsApi`]
#[derive(Debug, Clone)]
pub struct UnistatsClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: SecretString,
}

impl UnistatsClient {
    /// Build a client from configuration
    pub fn new(config: UnistatsConfig) -> ServiceResult<Self> {
        url::Url::parse(&config.base_url).map_err(|e| {
            ServiceError::InvalidArgument(format!("Invalid Unistats base URL: {}", e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::upstream(&config.base_url, e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: SecretString::new(format!("Basic {}", config.auth.expose_secret())),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "calling Unistats");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, self.auth_header.expose_secret().as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "Unistats request failed");
                ServiceError::upstream(path, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Unistats answered with an error status");
            return Err(ServiceError::upstream(path, format!("status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ServiceError::upstream(path, e))?;

        serde_json::from_slice(&body).map_err(|e| {
            warn!(%url, error = %e, "Unistats returned a body that is not the expected JSON");
            ServiceError::upstream(path, e)
        })
    }
}

#[async_trait]
impl UnistatsApi for UnistatsClient {
    #[instrument(skip(self))]
    async fn fetch_university_list(&self) -> ServiceResult<Vec<University>> {
        let records: Vec<InstitutionRecord> = self
            .get_json(&format!("Institutions.json?pageSize={}", INSTITUTIONS_PAGE_SIZE))
            .await?;

        let universities = records
            .into_iter()
            .filter_map(|record| match University::from_institution(record, None) {
                Ok(university) => Some(University::new(university.pubukprn, university.name)),
                Err(e) => {
                    warn!(error = %e, "skipping institution without a usable UKPRN");
                    None
                }
            })
            .collect();

        Ok(universities)
    }

    #[instrument(skip_all, fields(pubukprn = %pubukprn))]
    async fn fetch_university(&self, pubukprn: &Pubukprn) -> ServiceResult<University> {
        let path = format!("Institution/{}.json", pubukprn);
        let record: InstitutionRecord = self.get_json(&path).await?;

        // A bad identifier here is Unistats' fault, not the caller's.
        University::from_institution(record, Some(pubukprn)).map_err(|e| {
            warn!(error = %e, "Unistats returned an unusable institution record");
            ServiceError::upstream(path, e)
        })
    }

    #[instrument(skip_all, fields(pubukprn = %pubukprn))]
    async fn fetch_courses(&self, pubukprn: &Pubukprn) -> ServiceResult<Vec<CourseSummary>> {
        let records: Vec<CourseSummaryRecord> = self
            .get_json(&format!(
                "Institution/{}/Courses.json?pageSize={}",
                pubukprn, COURSES_PAGE_SIZE
            ))
            .await?;

        Ok(records.into_iter().map(CourseSummary::from).collect())
    }

    #[instrument(skip_all, fields(pubukprn = %pubukprn, kiscourseid = %kiscourseid, mode = %mode))]
    async fn fetch_course_detail(
        &self,
        pubukprn: &Pubukprn,
        kiscourseid: &CourseId,
        mode: &StudyMode,
    ) -> ServiceResult<CourseDetailRecord> {
        self.get_json(&format!(
            "Institution/{}/Course/{}/{}.json",
            pubukprn, kiscourseid, mode
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> UnistatsClient {
        let config = UnistatsConfig::new(SecretString::new("dGVzdDp0ZXN0".to_string()))
            .with_base_url(server.uri())
            .with_timeout(Duration::from_secs(2));
        UnistatsClient::new(config).unwrap()
    }

    fn sussex() -> Pubukprn {
        Pubukprn::new("10007806").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_university_list_sends_credential_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Institutions.json"))
            .and(query_param("pageSize", "1000"))
            .and(header("authorization", "Basic dGVzdDp0ZXN0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"UKPRN": 10007806, "Name": "University of Sussex", "StudentUnionUrl": "x"},
                {"UKPRN": "10007784", "Name": "University College London"},
                {"Name": "No identifier"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let universities = client_for(&server).fetch_university_list().await.unwrap();

        assert_eq!(universities.len(), 2);
        assert_eq!(universities[0].pubukprn.as_str(), "10007806");
        assert_eq!(universities[0].name.as_deref(), Some("University of Sussex"));
        assert_eq!(universities[0].union_url, None);
        assert_eq!(universities[1].pubukprn.as_str(), "10007784");
    }

    #[tokio::test]
    async fn test_fetch_university() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Institution/10007806.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UKPRN": "10007806",
                "Name": "University of Sussex",
                "StudentUnionUrl": "https://www.sussexstudent.com"
            })))
            .mount(&server)
            .await;

        let university = client_for(&server).fetch_university(&sussex()).await.unwrap();

        assert_eq!(university.pubukprn, sussex());
        assert_eq!(
            university.union_url.as_deref(),
            Some("https://www.sussexstudent.com")
        );
    }

    #[tokio::test]
    async fn test_fetch_courses_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Institution/10007806/Courses.json"))
            .and(query_param("pageSize", "300"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"Title": "Computer Science", "KisCourseId": "37310", "KisMode": 1}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Institution/10007806/Course/37310/1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "Computer Science",
                "KisAimLabel": "MComp",
                "LengthInYears": "4",
                "SandwichAvailable": 1
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let courses = client.fetch_courses(&sussex()).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].kiscourseid.as_deref(), Some("37310"));
        assert_eq!(courses[0].is_full_time.as_deref(), Some("1"));

        let detail = client
            .fetch_course_detail(
                &sussex(),
                &CourseId::new("37310").unwrap(),
                &StudyMode::new("1").unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(detail.kis_aim_label.as_deref(), Some("MComp"));
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_university(&sussex()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_upstream_ukprn_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Institution/10007806.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UKPRN": "1000 7806",
                "Name": "University of Sussex"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_university(&sussex()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamUnavailable { .. }));
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
        assert!(!err.public_message().contains("1000 7806"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_courses(&sussex()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamUnavailable { .. }));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = UnistatsConfig::new(SecretString::new("x".to_string())).with_base_url("not a url");
        assert!(UnistatsClient::new(config).is_err());
    }
}
