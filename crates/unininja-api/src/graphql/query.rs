//! GraphQL query resolvers

use async_graphql::{Context, Object, Result, ID};
use std::str::FromStr;
use unininja_core::{CourseId, DomainError, Pubukprn, StudyMode};
use unininja_service::ServiceError;

use super::types::{GqlCourse, GqlUniversity};
use super::{services, session, to_field_error};

/// Root Query type for GraphQL
pub struct Query;

/// Parse a required argument, naming it in the error when absent or invalid
fn required<T>(name: &str, value: Option<&str>) -> Result<T>
where
    T: FromStr<Err = DomainError>,
{
    let value = value.ok_or_else(|| {
        to_field_error(ServiceError::InvalidArgument(format!(
            "Argument \"{}\" is required",
            name
        )))
    })?;

    value.parse::<T>().map_err(|e| {
        to_field_error(ServiceError::InvalidArgument(format!(
            "Argument \"{}\" is invalid: {}",
            name, e
        )))
    })
}

fn id_arg(id: &Option<ID>) -> Option<&str> {
    id.as_ref().map(|id| id.as_str())
}

#[Object]
impl Query {
    /// One university, merged with its UniNinja supplement
    async fn university(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "UK Provider Reference Number")] pubukprn: Option<ID>,
    ) -> Result<Option<GqlUniversity>> {
        let pubukprn: Pubukprn = required("pubukprn", id_arg(&pubukprn))?;
        let session = session(ctx)?;

        let university = services(ctx)?
            .catalogue()
            .university(session.as_ref(), &pubukprn)
            .await
            .map_err(to_field_error)?;

        Ok(Some(GqlUniversity(university)))
    }

    /// Every university Unistats knows about
    async fn universities(&self, ctx: &Context<'_>) -> Result<Option<Vec<GqlUniversity>>> {
        let universities = services(ctx)?
            .catalogue()
            .universities()
            .await
            .map_err(to_field_error)?;

        Ok(Some(universities.into_iter().map(GqlUniversity).collect()))
    }

    /// Courses offered by one university
    async fn course_list(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "UK Provider Reference Number")] pubukprn: Option<ID>,
    ) -> Result<Option<Vec<GqlCourse>>> {
        let pubukprn: Pubukprn = required("pubukprn", id_arg(&pubukprn))?;

        let courses = services(ctx)?
            .catalogue()
            .course_list(&pubukprn)
            .await
            .map_err(to_field_error)?;

        Ok(Some(courses.into_iter().map(GqlCourse::from).collect()))
    }

    /// Detail of one course in one study mode
    async fn course(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "UK Provider Reference Number")] pubukprn: Option<ID>,
        #[graphql(desc = "KIS course identifier")] kiscourseid: Option<ID>,
        #[graphql(desc = "KIS study mode")] is_full_time: Option<String>,
    ) -> Result<Option<GqlCourse>> {
        let pubukprn: Pubukprn = required("pubukprn", id_arg(&pubukprn))?;
        let kiscourseid: CourseId = required("kiscourseid", id_arg(&kiscourseid))?;
        let mode: StudyMode = required("isFullTime", is_full_time.as_deref())?;

        let course = services(ctx)?
            .catalogue()
            .course(&pubukprn, &kiscourseid, &mode)
            .await
            .map_err(to_field_error)?;

        Ok(Some(GqlCourse(course)))
    }
}
