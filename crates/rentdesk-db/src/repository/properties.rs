//! Property listing operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewProperty, Property, PropertyPatch, PropertyType};
use crate::repository::Database;
use crate::utils::{contains_pattern, fold_case, format_timestamp};

const PROPERTY_SELECT: &str = r#"
    SELECT p.id, p.title, p.property_type, p.location, p.area, p.maps_link, p.rent, p.deposit,
           p.features, p.owner_details, p.images, p.created_by, p.created_at, p.updated_at,
           u.name AS owner_name, u.email AS owner_email, u.role AS owner_role
    FROM properties p
    LEFT JOIN users u ON u.id = p.created_by
"#;

/// Query parameters for listing properties
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
    /// Filter by listing type
    pub property_type: Option<PropertyType>,
    /// Case-insensitive substring of the area
    pub area: Option<String>,
    /// Case-insensitive substring of title, location or area
    pub search: Option<String>,
    /// Filter by creator
    pub created_by: Option<String>,
    /// Pagination offset
    pub offset: i64,
    /// Pagination limit
    pub limit: i64,
}

/// Aggregate listing counts
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PropertyCounts {
    pub total: i64,
    pub today: i64,
    pub residential: i64,
    pub commercial: i64,
}

/// Append the WHERE clause for `query` to `builder`
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &PropertyQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(property_type) = query.property_type {
        builder
            .push(" AND p.property_type = ")
            .push_bind(property_type.as_str());
    }
    // Matched against the case-folded shadow columns, since SQLite's LIKE
    // only folds ASCII
    if let Some(area) = &query.area {
        builder
            .push(" AND p.area_fold LIKE ")
            .push_bind(contains_pattern(&fold_case(area)))
            .push(" ESCAPE '\\'");
    }
    if let Some(search) = &query.search {
        let pattern = contains_pattern(&fold_case(search));
        builder
            .push(" AND (p.title_fold LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.location_fold LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.area_fold LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(created_by) = &query.created_by {
        builder
            .push(" AND p.created_by = ")
            .push_bind(created_by.clone());
    }
}

impl Database {
    // ==================== Property Operations ====================

    /// Insert a new property
    pub async fn insert_property(&self, property: NewProperty) -> Result<Property, DbError> {
        let now = format_timestamp(Utc::now());
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO properties (id, title, property_type, location, area, maps_link, rent, deposit, features, owner_details, images, created_by, created_at, updated_at, title_fold, location_fold, area_fold)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&property.title)
        .bind(property.property_type.as_str())
        .bind(&property.location)
        .bind(&property.area)
        .bind(&property.maps_link)
        .bind(property.rent)
        .bind(property.deposit)
        .bind(serde_json::to_string(&property.features)?)
        .bind(&property.owner_details)
        .bind(serde_json::to_string(&property.images)?)
        .bind(&property.created_by)
        .bind(&now)
        .bind(&now)
        .bind(fold_case(&property.title))
        .bind(fold_case(&property.location))
        .bind(fold_case(&property.area))
        .execute(&self.pool)
        .await?;

        self.get_property(&id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Property: {}", id)))
    }

    /// Get a property by ID, with its owner joined
    pub async fn get_property(&self, id: &str) -> Result<Option<Property>, DbError> {
        let sql = format!("{} WHERE p.id = ?", PROPERTY_SELECT);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| Property::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List properties with filtering and pagination, newest first
    ///
    /// Returns the requested page and the total number of matching rows.
    pub async fn list_properties(
        &self,
        query: &PropertyQuery,
    ) -> Result<(Vec<Property>, i64), DbError> {
        let mut count_query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS count FROM properties p");
        push_filters(&mut count_query, query);

        let mut list_query: QueryBuilder<Sqlite> = QueryBuilder::new(PROPERTY_SELECT);
        push_filters(&mut list_query, query);
        list_query
            .push(" ORDER BY p.created_at DESC, p.rowid DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let (rows, count_row) = tokio::try_join!(
            list_query.build().fetch_all(&self.pool),
            count_query.build().fetch_one(&self.pool),
        )?;

        let items = rows
            .iter()
            .map(|row| Property::try_from(row).map_err(DbError::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, count_row.get("count")))
    }

    /// Apply an allow-listed patch, returning the updated property if it exists
    pub async fn update_property(
        &self,
        id: &str,
        patch: PropertyPatch,
    ) -> Result<Option<Property>, DbError> {
        let PropertyPatch {
            title,
            property_type,
            location,
            area,
            maps_link,
            rent,
            deposit,
            features,
            owner_details,
            images,
        } = patch;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE properties SET updated_at = ");
        query.push_bind(format_timestamp(Utc::now()));

        if let Some(title) = title {
            query
                .push(", title_fold = ")
                .push_bind(fold_case(&title))
                .push(", title = ")
                .push_bind(title);
        }
        if let Some(property_type) = property_type {
            query.push(", property_type = ").push_bind(property_type.as_str());
        }
        if let Some(location) = location {
            query
                .push(", location_fold = ")
                .push_bind(fold_case(&location))
                .push(", location = ")
                .push_bind(location);
        }
        if let Some(area) = area {
            query
                .push(", area_fold = ")
                .push_bind(fold_case(&area))
                .push(", area = ")
                .push_bind(area);
        }
        if let Some(maps_link) = maps_link {
            query.push(", maps_link = ").push_bind(maps_link);
        }
        if let Some(rent) = rent {
            query.push(", rent = ").push_bind(rent);
        }
        if let Some(deposit) = deposit {
            query.push(", deposit = ").push_bind(deposit);
        }
        if let Some(features) = features {
            query
                .push(", features = ")
                .push_bind(serde_json::to_string(&features)?);
        }
        if let Some(owner_details) = owner_details {
            query.push(", owner_details = ").push_bind(owner_details);
        }
        if let Some(images) = images {
            query
                .push(", images = ")
                .push_bind(serde_json::to_string(&images)?);
        }
        query.push(" WHERE id = ").push_bind(id.to_string());

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_property(id).await
    }

    /// Delete a property
    pub async fn delete_property(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get total property count
    pub async fn count_properties(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM properties")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    /// Count properties created at or after `since`
    pub async fn count_properties_since(&self, since: DateTime<Utc>) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM properties WHERE created_at >= ?")
            .bind(format_timestamp(since))
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    /// Count properties of one type
    pub async fn count_properties_by_type(
        &self,
        property_type: PropertyType,
    ) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM properties WHERE property_type = ?")
            .bind(property_type.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    /// Get aggregate counts; the four counts run concurrently
    pub async fn property_counts(&self, today_start: DateTime<Utc>) -> Result<PropertyCounts, DbError> {
        let (total, today, residential, commercial) = tokio::try_join!(
            self.count_properties(),
            self.count_properties_since(today_start),
            self.count_properties_by_type(PropertyType::Residential),
            self.count_properties_by_type(PropertyType::Commercial),
        )?;

        Ok(PropertyCounts {
            total,
            today,
            residential,
            commercial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, UserRole};
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    async fn owner(db: &Database, email: &str, role: UserRole) -> String {
        db.insert_user(NewUser {
            name: "Owner".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
        })
        .await
        .unwrap()
        .id
    }

    fn listing(title: &str, area: &str, property_type: PropertyType, created_by: &str) -> NewProperty {
        NewProperty {
            title: title.to_string(),
            property_type,
            location: "MG Road".to_string(),
            area: area.to_string(),
            maps_link: None,
            rent: 25000.0,
            deposit: None,
            features: vec!["parking".to_string()],
            owner_details: None,
            images: vec!["/uploads/a.jpg".to_string()],
            created_by: created_by.to_string(),
        }
    }

    async fn backdate(db: &Database, id: &str, when: DateTime<Utc>) {
        sqlx::query("UPDATE properties SET created_at = ? WHERE id = ?")
            .bind(format_timestamp(when))
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_get_with_owner() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Residential).await;

        let created = db
            .insert_property(listing("2BHK", "Indiranagar", PropertyType::Residential, &user_id))
            .await
            .unwrap();

        let fetched = db.get_property(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "2BHK");
        assert_eq!(fetched.features, vec!["parking"]);
        assert_eq!(fetched.images, vec!["/uploads/a.jpg"]);
        assert_eq!(fetched.deposit, None);
        let owner = fetched.owner.unwrap();
        assert_eq!(owner.email, "o@example.com");
        assert_eq!(owner.role, UserRole::Residential);
    }

    #[tokio::test]
    async fn test_unknown_owner_role_is_a_decode_error() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Residential).await;
        let created = db
            .insert_property(listing("Flat", "HSR", PropertyType::Residential, &user_id))
            .await
            .unwrap();

        sqlx::query("UPDATE users SET role = 'landlord' WHERE id = ?")
            .bind(&user_id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.get_property(&created.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Connection(sqlx::Error::ColumnDecode { ref index, .. }) if index == "owner_role"
        ));
    }

    #[tokio::test]
    async fn test_orphaned_property_has_no_owner() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Commercial).await;
        let created = db
            .insert_property(listing("Shop", "Jayanagar", PropertyType::Commercial, &user_id))
            .await
            .unwrap();

        db.delete_user(&user_id).await.unwrap();

        let fetched = db.get_property(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.created_by, user_id);
        assert!(fetched.owner.is_none());
    }

    #[tokio::test]
    async fn test_pagination_last_page() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Residential).await;
        for i in 0..45 {
            db.insert_property(listing(&format!("Flat {i}"), "HSR", PropertyType::Residential, &user_id))
                .await
                .unwrap();
        }

        let (items, total) = db
            .list_properties(&PropertyQuery {
                offset: 40,
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(total, 45);
        assert_eq!(items.len(), 5);
        // Newest first, so the last page holds the oldest listings
        assert_eq!(items.last().unwrap().title, "Flat 0");
    }

    #[tokio::test]
    async fn test_filters() {
        let db = test_db().await;
        let alice = owner(&db, "alice@example.com", UserRole::Admin).await;
        let bob = owner(&db, "bob@example.com", UserRole::Commercial).await;

        db.insert_property(listing("Sunny Flat", "Koramangala", PropertyType::Residential, &alice))
            .await
            .unwrap();
        db.insert_property(listing("Office Space", "Whitefield", PropertyType::Commercial, &bob))
            .await
            .unwrap();
        db.insert_property(listing("50%_Deal", "whitefield east", PropertyType::Commercial, &bob))
            .await
            .unwrap();

        let (items, total) = db
            .list_properties(&PropertyQuery {
                area: Some("WHITEFIELD".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);

        let (_, total) = db
            .list_properties(&PropertyQuery {
                search: Some("sunny".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);

        // Wildcards in the search term are matched literally
        let (items, _) = db
            .list_properties(&PropertyQuery {
                search: Some("%_".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "50%_Deal");

        let (items, _) = db
            .list_properties(&PropertyQuery {
                property_type: Some(PropertyType::Residential),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Sunny Flat");

        let (items, total) = db
            .list_properties(&PropertyQuery {
                created_by: Some(bob.clone()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(items.iter().all(|p| p.created_by == bob));
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Residential).await;
        let created = db
            .insert_property(listing("ÉCOLE Flat", "Ørestad", PropertyType::Residential, &user_id))
            .await
            .unwrap();

        let search = |search: Option<&str>, area: Option<&str>| PropertyQuery {
            search: search.map(str::to_string),
            area: area.map(str::to_string),
            limit: 20,
            ..Default::default()
        };

        let (_, total) = db.list_properties(&search(Some("école"), None)).await.unwrap();
        assert_eq!(total, 1);
        let (_, total) = db.list_properties(&search(None, Some("ørestad"))).await.unwrap();
        assert_eq!(total, 1);

        // Renamed listings are found by their new text only
        db.update_property(
            &created.id,
            PropertyPatch {
                title: Some("Maison ÉTÉ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let (_, total) = db.list_properties(&search(Some("été"), None)).await.unwrap();
        assert_eq!(total, 1);
        let (_, total) = db.list_properties(&search(Some("école"), None)).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_update_property_patch() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Residential).await;
        let mut new = listing("Flat", "HSR", PropertyType::Residential, &user_id);
        new.deposit = Some(50000.0);
        let created = db.insert_property(new).await.unwrap();

        let updated = db
            .update_property(
                &created.id,
                PropertyPatch {
                    title: Some("Renovated Flat".to_string()),
                    rent: Some(30000.0),
                    deposit: Some(None),
                    features: Some(vec!["gym".to_string(), "lift".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Renovated Flat");
        assert_eq!(updated.rent, 30000.0);
        assert_eq!(updated.deposit, None);
        assert_eq!(updated.features, vec!["gym", "lift"]);
        assert_eq!(updated.area, "HSR");
        assert_eq!(updated.images, created.images);

        assert!(
            db.update_property("missing", PropertyPatch::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_property() {
        let db = test_db().await;
        let user_id = owner(&db, "o@example.com", UserRole::Residential).await;
        let created = db
            .insert_property(listing("Flat", "HSR", PropertyType::Residential, &user_id))
            .await
            .unwrap();

        assert!(db.delete_property(&created.id).await.unwrap());
        assert!(!db.delete_property(&created.id).await.unwrap());
        assert!(db.get_property(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_property_counts() {
        let db = test_db().await;
        let user_id = owner(&db, "a@example.com", UserRole::Admin).await;
        let today_start = Utc::now() - Duration::hours(1);

        // N = 3 residential and M = 2 commercial today
        for _ in 0..3 {
            db.insert_property(listing("R", "HSR", PropertyType::Residential, &user_id))
                .await
                .unwrap();
        }
        for _ in 0..2 {
            db.insert_property(listing("C", "HSR", PropertyType::Commercial, &user_id))
                .await
                .unwrap();
        }
        // K = 4 older listings (1 residential, 3 commercial)
        let older = [
            PropertyType::Residential,
            PropertyType::Commercial,
            PropertyType::Commercial,
            PropertyType::Commercial,
        ];
        for property_type in older {
            let p = db
                .insert_property(listing("Old", "HSR", property_type, &user_id))
                .await
                .unwrap();
            backdate(&db, &p.id, today_start - Duration::days(2)).await;
        }

        let counts = db.property_counts(today_start).await.unwrap();
        assert_eq!(
            counts,
            PropertyCounts {
                total: 9,
                today: 5,
                residential: 4,
                commercial: 5,
            }
        );
    }
}
