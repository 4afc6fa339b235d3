//! University and course aggregation
//!
//! Combines Unistats records with the document store's supplements into the
//! shapes the GraphQL schema serves.

use std::sync::Arc;
use tracing::{debug, warn};
use unininja_core::{Course, CourseId, CourseSummary, Pubukprn, StudyMode, University};
use unininja_db::StoreSession;

use crate::error::ServiceResult;
use crate::unistats::UnistatsApi;

/// Resolution logic behind the GraphQL query fields
#[derive(Clone)]
pub struct CatalogueService {
    unistats: Arc<dyn UnistatsApi>,
}

impl CatalogueService {
    /// Create a catalogue over a Unistats client
    pub fn new(unistats: Arc<dyn UnistatsApi>) -> Self {
        Self { unistats }
    }

    /// One university, enriched with its store supplement.
    ///
    /// The supplement is looked up with the identifier Unistats returned. A
    /// missing document only leaves the supplementary fields empty; an
    /// upstream or store failure fails the whole field.
    pub async fn university(
        &self,
        session: &dyn StoreSession,
        pubukprn: &Pubukprn,
    ) -> ServiceResult<University> {
        let university = self.unistats.fetch_university(pubukprn).await?;

        let supplement = session
            .find_university_supplement(&university.pubukprn)
            .await
            .map_err(|e| {
                warn!(pubukprn = %university.pubukprn, error = %e, "supplement lookup failed");
                e
            })?;

        if supplement.is_none() {
            debug!(pubukprn = %university.pubukprn, "no supplement document");
        }

        Ok(university.with_supplement(supplement))
    }

    /// Every institution, identifier and name only.
    ///
    /// Entries are not enriched, which keeps this to a single upstream call
    /// and no store lookups.
    pub async fn universities(&self) -> ServiceResult<Vec<University>> {
        self.unistats.fetch_university_list().await
    }

    /// Course listing of one institution, as Unistats returns it
    pub async fn course_list(&self, pubukprn: &Pubukprn) -> ServiceResult<Vec<CourseSummary>> {
        self.unistats.fetch_courses(pubukprn).await
    }

    /// Detail of one course in one study mode
    pub async fn course(
        &self,
        pubukprn: &Pubukprn,
        kiscourseid: &CourseId,
        mode: &StudyMode,
    ) -> ServiceResult<Course> {
        let detail = self
            .unistats
            .fetch_course_detail(pubukprn, kiscourseid, mode)
            .await?;

        Ok(Course::from_detail(kiscourseid, mode, detail))
    }
}
