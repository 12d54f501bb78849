//! Environment query service: basic creation, detail lookup, listing and
//! cascading deletion.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::environment::{
    DEFAULT_MAP_FORMAT_ID, Environment, EnvironmentDetail, EnvironmentFilter, NewEnvironment,
};
use super::error::Error;
use super::ids::EnvironmentId;
use super::ports::{
    BasicEnvironmentRequest, EnvironmentQuery, EnvironmentRepository, PoiRepository,
    ZoneRepository,
};

/// Domain service implementing [`EnvironmentQuery`].
#[derive(Clone)]
pub struct EnvironmentQueryService<E, Z, P> {
    environments: Arc<E>,
    zones: Arc<Z>,
    pois: Arc<P>,
    clock: Arc<dyn Clock>,
    map_format_id: i64,
}

impl<E, Z, P> EnvironmentQueryService<E, Z, P> {
    /// Create a new query service.
    pub fn new(environments: Arc<E>, zones: Arc<Z>, pois: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            environments,
            zones,
            pois,
            clock,
            map_format_id: DEFAULT_MAP_FORMAT_ID,
        }
    }

    /// Rendering format for maps created by [`EnvironmentQuery::create_basic`].
    #[must_use]
    pub fn with_map_format_id(mut self, map_format_id: i64) -> Self {
        self.map_format_id = map_format_id;
        self
    }
}

#[async_trait]
impl<E, Z, P> EnvironmentQuery for EnvironmentQueryService<E, Z, P>
where
    E: EnvironmentRepository,
    Z: ZoneRepository,
    P: PoiRepository,
{
    async fn create_basic(&self, request: BasicEnvironmentRequest) -> Result<Environment, Error> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_format("environment name must not be empty"));
        }

        let map_id = self.environments.create_map(self.map_format_id).await?;
        let environment = self
            .environments
            .create_environment(&NewEnvironment {
                name: name.to_owned(),
                address: request.address,
                description: request.description,
                is_public: request.is_public,
                surface: request.surface,
                map_id: Some(map_id),
                created_at: self.clock.utc(),
            })
            .await?;

        if let Some(user_id) = request.user_id.filter(|_| !environment.is_public) {
            self.environments
                .create_association(environment.id, user_id)
                .await?;
        }
        info!(env_id = %environment.id, %map_id, "pending environment created");
        Ok(environment)
    }

    async fn get(&self, id: EnvironmentId) -> Result<EnvironmentDetail, Error> {
        let environment = self
            .environments
            .get_environment(id)
            .await?
            .ok_or(Error::not_found(id))?;
        let delimiter = self.environments.get_delimiter(id).await?;
        let zones = self.zones.list_zones(id).await?;
        let pois = self.pois.list_pois(id).await?;
        Ok(EnvironmentDetail {
            environment,
            delimiter,
            zones,
            pois,
        })
    }

    async fn list(&self, filter: EnvironmentFilter) -> Result<Vec<Environment>, Error> {
        Ok(self.environments.list_environments(&filter).await?)
    }

    async fn delete(&self, id: EnvironmentId) -> Result<(), Error> {
        if !self.environments.delete_environment(id).await? {
            return Err(Error::not_found(id));
        }
        info!(env_id = %id, "environment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockEnvironmentRepository, MockPoiRepository, MockZoneRepository};
    use crate::domain::{
        Association, AssociationId, Delimiter, DelimiterStatus, MapId, UserId, Visibility,
    };

    struct FixtureClock;

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 1, 12, 14, 0, 0)
                .single()
                .expect("valid fixture timestamp")
        }
    }

    type TestService =
        EnvironmentQueryService<MockEnvironmentRepository, MockZoneRepository, MockPoiRepository>;

    fn make_service(environments: MockEnvironmentRepository) -> TestService {
        let mut zones = MockZoneRepository::new();
        zones.expect_list_zones().returning(|_| Ok(Vec::new()));
        let mut pois = MockPoiRepository::new();
        pois.expect_list_pois().returning(|_| Ok(Vec::new()));
        EnvironmentQueryService::new(
            Arc::new(environments),
            Arc::new(zones),
            Arc::new(pois),
            Arc::new(FixtureClock),
        )
    }

    fn echo_created(environments: &mut MockEnvironmentRepository) {
        environments
            .expect_create_map()
            .times(1)
            .return_once(|_| Ok(MapId::new(4)));
        environments
            .expect_create_environment()
            .times(1)
            .return_once(|new| {
                Ok(Environment {
                    id: EnvironmentId::new(10),
                    name: new.name.clone(),
                    address: new.address.clone(),
                    description: new.description.clone(),
                    is_public: new.is_public,
                    surface: new.surface,
                    map_id: new.map_id,
                    revision: 1,
                    created_at: new.created_at,
                    updated_at: new.created_at,
                })
            });
    }

    fn request(is_public: bool) -> BasicEnvironmentRequest {
        BasicEnvironmentRequest {
            name: "  Depot  ".to_owned(),
            address: None,
            description: None,
            is_public,
            surface: None,
            user_id: Some(UserId::new(3)),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_basic_links_owner_of_private_environment() {
        let mut environments = MockEnvironmentRepository::new();
        echo_created(&mut environments);
        environments
            .expect_create_association()
            .withf(|env_id, user_id| {
                *env_id == EnvironmentId::new(10) && *user_id == UserId::new(3)
            })
            .times(1)
            .return_once(|env_id, user_id| {
                Ok(Association {
                    id: AssociationId::new(1),
                    env_id,
                    user_id,
                })
            });

        let environment = make_service(environments)
            .create_basic(request(false))
            .await
            .expect("creation succeeds");

        assert_eq!(environment.name, "Depot");
        assert_eq!(environment.map_id, Some(MapId::new(4)));
    }

    #[rstest]
    #[tokio::test]
    async fn create_basic_skips_owner_of_public_environment() {
        let mut environments = MockEnvironmentRepository::new();
        echo_created(&mut environments);
        environments.expect_create_association().times(0);

        make_service(environments)
            .create_basic(request(true))
            .await
            .expect("creation succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn create_basic_rejects_blank_name() {
        let mut environments = MockEnvironmentRepository::new();
        environments.expect_create_map().times(0);
        let blank = BasicEnvironmentRequest {
            name: "   ".to_owned(),
            ..request(false)
        };

        let error = make_service(environments)
            .create_basic(blank)
            .await
            .expect_err("blank name");

        assert!(matches!(error, Error::InvalidFormat { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn get_assembles_detail() {
        let mut environments = MockEnvironmentRepository::new();
        environments
            .expect_get_environment()
            .times(1)
            .return_once(|id| {
                Ok(Some(Environment {
                    id,
                    name: "Depot".to_owned(),
                    address: None,
                    description: None,
                    is_public: true,
                    surface: None,
                    map_id: None,
                    revision: 2,
                    created_at: FixtureClock.utc(),
                    updated_at: FixtureClock.utc(),
                }))
            });
        environments
            .expect_get_delimiter()
            .times(1)
            .return_once(|env_id| {
                Ok(Some(Delimiter {
                    env_id,
                    coordinates: vec![vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]],
                }))
            });

        let detail = make_service(environments)
            .get(EnvironmentId::new(10))
            .await
            .expect("environment exists");

        assert_eq!(detail.environment.revision, 2);
        assert!(detail.delimiter.is_some());
        assert!(detail.zones.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn get_unknown_environment_is_not_found() {
        let mut environments = MockEnvironmentRepository::new();
        environments
            .expect_get_environment()
            .times(1)
            .return_once(|_| Ok(None));
        environments.expect_get_delimiter().times(0);

        let error = make_service(environments)
            .get(EnvironmentId::new(10))
            .await
            .expect_err("missing");

        assert_eq!(error, Error::not_found(EnvironmentId::new(10)));
    }

    #[rstest]
    #[tokio::test]
    async fn list_forwards_filter() {
        let mut environments = MockEnvironmentRepository::new();
        environments
            .expect_list_environments()
            .withf(|filter| {
                filter.status == DelimiterStatus::Pending
                    && filter.visibility == Some(Visibility::Private)
            })
            .times(1)
            .return_once(|_| Ok(Vec::new()));

        let filter = EnvironmentFilter {
            status: DelimiterStatus::Pending,
            search: None,
            visibility: Some(Visibility::Private),
        };
        let listed = make_service(environments)
            .list(filter)
            .await
            .expect("listing succeeds");

        assert!(listed.is_empty());
    }

    #[rstest]
    #[case::present(true)]
    #[case::absent(false)]
    #[tokio::test]
    async fn delete_reports_missing_rows(#[case] existed: bool) {
        let mut environments = MockEnvironmentRepository::new();
        environments
            .expect_delete_environment()
            .times(1)
            .return_once(move |_| Ok(existed));

        let result = make_service(environments)
            .delete(EnvironmentId::new(10))
            .await;

        assert_eq!(result.is_ok(), existed);
    }
}
