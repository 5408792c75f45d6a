//! Building repository.

use crate::entities::{Building, BuildingFilter, CreateBuildingRequest, UpdateBuildingRequest};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const BUILDING_COLUMNS: &str = "id, public_id, owner_id, company_id, name, address, building_type, floors_above, floors_below, parking_spaces, cleaning_areas, special_notes, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct BuildingRepository {
    pool: SqlitePool,
}

impl BuildingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateBuildingRequest) -> DatabaseResult<Building> {
        let now = timestamp_now();
        let public_id = new_public_id();

        sqlx::query(
            r#"
            INSERT INTO buildings (
                public_id, owner_id, company_id, name, address, building_type, floors_above,
                floors_below, parking_spaces, cleaning_areas, special_notes, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.owner_id)
        .bind(&request.company_id)
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.building_type)
        .bind(request.floors_above)
        .bind(request.floors_below)
        .bind(request.parking_spaces)
        .bind(serde_json::to_string(&request.cleaning_areas)?)
        .bind(&request.special_notes)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("building", &public_id))
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Building>> {
        let query = format!("SELECT {BUILDING_COLUMNS} FROM buildings WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(building_from_row).transpose()
    }

    pub async fn list(&self, filter: &BuildingFilter, page: Page) -> DatabaseResult<Vec<Building>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {BUILDING_COLUMNS} FROM buildings WHERE 1 = 1"));

        if let Some(owner_id) = &filter.owner_id {
            builder.push(" AND owner_id = ").push_bind(owner_id.clone());
        }
        if let Some(company_id) = &filter.company_id {
            builder.push(" AND company_id = ").push_bind(company_id.clone());
        }
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        builder
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(building_from_row).collect()
    }

    pub async fn update(
        &self,
        public_id: &str,
        request: &UpdateBuildingRequest,
    ) -> DatabaseResult<Building> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE buildings SET updated_at = ");
        builder.push_bind(timestamp_now());

        if let Some(name) = &request.name {
            builder.push(", name = ").push_bind(name.clone());
        }
        if let Some(address) = &request.address {
            builder.push(", address = ").push_bind(address.clone());
        }
        if let Some(company_id) = &request.company_id {
            builder.push(", company_id = ").push_bind(company_id.clone());
        }
        if let Some(building_type) = &request.building_type {
            builder.push(", building_type = ").push_bind(building_type.clone());
        }
        if let Some(floors_above) = request.floors_above {
            builder.push(", floors_above = ").push_bind(floors_above);
        }
        if let Some(floors_below) = request.floors_below {
            builder.push(", floors_below = ").push_bind(floors_below);
        }
        if let Some(parking_spaces) = request.parking_spaces {
            builder.push(", parking_spaces = ").push_bind(parking_spaces);
        }
        if let Some(areas) = &request.cleaning_areas {
            builder
                .push(", cleaning_areas = ")
                .push_bind(serde_json::to_string(areas)?);
        }
        if let Some(notes) = &request.special_notes {
            builder.push(", special_notes = ").push_bind(notes.clone());
        }
        if let Some(is_active) = request.is_active {
            builder.push(", is_active = ").push_bind(is_active);
        }

        builder.push(" WHERE public_id = ").push_bind(public_id.to_string());
        let result = builder.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("building", public_id));
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("building", public_id))
    }
}

fn building_from_row(row: &SqliteRow) -> DatabaseResult<Building> {
    let cleaning_areas: String = row.try_get("cleaning_areas")?;

    Ok(Building {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        owner_id: row.try_get("owner_id")?,
        company_id: row.try_get("company_id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        building_type: row.try_get("building_type")?,
        floors_above: row.try_get("floors_above")?,
        floors_below: row.try_get("floors_below")?,
        parking_spaces: row.try_get("parking_spaces")?,
        cleaning_areas: serde_json::from_str(&cleaning_areas)?,
        special_notes: row.try_get("special_notes")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::{ClientProfile, CreateUserRequest, RoleProfile};
    use crate::{initialize_in_memory, UserRepository};

    pub(crate) async fn seed_owner(pool: &SqlitePool, login_id: &str) -> String {
        UserRepository::new(pool.clone())
            .create(&CreateUserRequest {
                login_id: login_id.to_string(),
                account_email: format!("{login_id}@cleanit.temp"),
                password_hash: "hash".to_string(),
                name: login_id.to_string(),
                phone: None,
                contact_email: None,
                address: None,
                profile: RoleProfile::Client(ClientProfile::default()),
                is_verified: false,
            })
            .await
            .unwrap()
            .public_id
    }

    pub(crate) fn building_request(owner_id: &str, name: &str) -> CreateBuildingRequest {
        CreateBuildingRequest {
            owner_id: owner_id.to_string(),
            company_id: None,
            name: name.to_string(),
            address: "1 Main St".to_string(),
            building_type: Some("office".to_string()),
            floors_above: 5,
            floors_below: 2,
            parking_spaces: 0,
            cleaning_areas: vec!["lobby".to_string(), "restrooms".to_string()],
            special_notes: None,
        }
    }

    #[tokio::test]
    async fn test_building_round_trip() {
        let pool = initialize_in_memory().await.unwrap();
        let owner = seed_owner(&pool, "owner").await;
        let repo = BuildingRepository::new(pool);

        let building = repo.create(&building_request(&owner, "Tower")).await.unwrap();
        assert_eq!(building.total_floors(), 7);
        assert!(!building.has_parking());
        assert_eq!(building.cleaning_areas, vec!["lobby", "restrooms"]);

        let found = repo.find_by_public_id(&building.public_id).await.unwrap().unwrap();
        assert_eq!(found, building);
    }

    #[tokio::test]
    async fn test_update_and_filter() {
        let pool = initialize_in_memory().await.unwrap();
        let owner = seed_owner(&pool, "owner").await;
        let other = seed_owner(&pool, "other").await;
        let repo = BuildingRepository::new(pool);

        let building = repo.create(&building_request(&owner, "A")).await.unwrap();
        repo.create(&building_request(&other, "B")).await.unwrap();

        let updated = repo
            .update(
                &building.public_id,
                &UpdateBuildingRequest {
                    parking_spaces: Some(12),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.has_parking());
        assert!(!updated.is_active);
        assert_eq!(updated.name, "A");

        let mine = repo
            .list(
                &BuildingFilter {
                    owner_id: Some(owner.clone()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert!(mine.is_empty());

        let mine = repo
            .list(
                &BuildingFilter {
                    owner_id: Some(owner),
                    include_inactive: true,
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        assert!(matches!(
            repo.update("missing", &UpdateBuildingRequest::default()).await,
            Err(DatabaseError::NotFound(_))
        ));
    }
}
