//! GraphQL schema types
//!
//! Thin wrappers around the core domain types. Field names are part of the
//! public contract, spelling included.

use async_graphql::{Context, Object, Result, ID};
use unininja_core::{Course, CourseSummary, University};

use super::{services, to_field_error};

/// GraphQL representation of a University
#[derive(Clone)]
pub struct GqlUniversity(pub University);

#[Object(name = "University")]
impl GqlUniversity {
    /// UK Provider Reference Number
    async fn pubukprn(&self) -> ID {
        ID(self.0.pubukprn.to_string())
    }

    async fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Students' union website
    #[graphql(name = "unionURL")]
    async fn union_url(&self) -> Option<&str> {
        self.0.union_url.as_deref()
    }

    async fn url(&self) -> Option<&str> {
        self.0.url()
    }

    /// Brand colour
    async fn color(&self) -> Option<&str> {
        self.0.color()
    }

    async fn lat(&self) -> Option<f64> {
        self.0.lat()
    }

    async fn lon(&self) -> Option<f64> {
        self.0.lon()
    }

    async fn average_rent(&self) -> Option<f64> {
        self.0.average_rent()
    }

    async fn uni_location_type(&self) -> Option<&str> {
        self.0.uni_location_type()
    }

    async fn uni_type(&self) -> Option<&str> {
        self.0.uni_type()
    }

    async fn nearest_train_station(&self) -> Option<&str> {
        self.0.nearest_train_station()
    }

    /// Courses offered by this university, fetched only when selected
    async fn courses(&self, ctx: &Context<'_>) -> Result<Option<Vec<GqlCourse>>> {
        let courses = services(ctx)?
            .catalogue()
            .course_list(&self.0.pubukprn)
            .await
            .map_err(to_field_error)?;

        Ok(Some(courses.into_iter().map(GqlCourse::from).collect()))
    }
}

/// GraphQL representation of a Course
#[derive(Clone)]
pub struct GqlCourse(pub Course);

impl From<CourseSummary> for GqlCourse {
    fn from(summary: CourseSummary) -> Self {
        Self(Course::from(summary))
    }
}

#[Object(name = "Course")]
impl GqlCourse {
    /// Course title, followed by the degree label when Unistats has one
    async fn title(&self) -> Option<&str> {
        self.0.title.as_deref()
    }

    /// KIS course identifier
    async fn kiscourseid(&self) -> Option<&str> {
        self.0.kiscourseid.as_deref()
    }

    /// KIS study mode
    async fn is_full_time(&self) -> Option<&str> {
        self.0.is_full_time.as_deref()
    }

    #[graphql(name = "courseURL")]
    async fn course_url(&self) -> Option<&str> {
        self.0.course_url.as_deref()
    }

    /// Length in whole years
    async fn years(&self) -> Option<i32> {
        self.0.years
    }

    async fn placement_year_avaliable(&self) -> Option<bool> {
        self.0.placement_year_avaliable
    }

    async fn year_abroad_avaliable(&self) -> Option<bool> {
        self.0.year_abroad_avaliable
    }

    async fn degree_label(&self) -> Option<&str> {
        self.0.degree_label.as_deref()
    }

    /// Honours degree; null when Unistats gives no recognisable yes/no value
    async fn is_hons(&self) -> Option<bool> {
        self.0.is_hons
    }
}
