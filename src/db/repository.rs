//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. The
//! occupancy aggregation (cafe update + history snapshot) and the review
//! commit (insert + counters + average) are each a single transaction.

use chrono::{Duration, Local, NaiveTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Cafe, Checkin, CheckinStatus, CreateCafeRequest, CreateCheckinRequest,
    CreateLiveUpdateRequest, CreateReservationRequest, CreateReviewRequest, CreateUserRequest,
    LiveUpdate, OccupancyReport, OccupancySnapshot, Reservation, Review, UpdateCafeRequest,
    UpdateReservationRequest, UpdateUserRequest, User, UserPreferences,
};
use crate::occupancy::{SeatTotals, TableConfig};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== CAFE OPERATIONS ====================

    /// List all cafes.
    pub async fn list_cafes(&self) -> Result<Vec<Cafe>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM cafes ORDER BY name",
            CAFE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(cafe_from_row).collect())
    }

    /// Get a cafe by ID.
    pub async fn get_cafe(&self, id: &str) -> Result<Option<Cafe>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM cafes WHERE id = ?", CAFE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(cafe_from_row))
    }

    /// Create a new cafe. A valid table_config in the request seeds the
    /// occupancy level and the first history snapshot.
    pub async fn create_cafe(&self, request: &CreateCafeRequest) -> Result<Cafe, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let totals = match &request.table_config {
            Some(value) => interpret_table_config(&id, value)?,
            None => None,
        };
        let occupancy_level = totals.map(|t| t.level());

        let cafe_photos_json = serde_json::to_string(&request.cafe_photos)?;
        let menu_photos_json = serde_json::to_string(&request.menu_photos)?;
        let amenities_json = serde_json::to_string(&request.amenities)?;
        let working_hours_json = serde_json::to_string(&request.working_hours)?;
        let table_config_json = request
            .table_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO cafes (
                id, owner_sub, name, description, phone_number, address, city,
                latitude, longitude, website_link, menu_link, instagram_url,
                cafe_photos, menu_photos, amenities, working_hours,
                table_config, occupancy_level, avg_rating, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.owner_sub)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.phone_number)
        .bind(&request.address)
        .bind(&request.city)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&request.website_link)
        .bind(&request.menu_link)
        .bind(&request.instagram_url)
        .bind(&cafe_photos_json)
        .bind(&menu_photos_json)
        .bind(&amenities_json)
        .bind(&working_hours_json)
        .bind(&table_config_json)
        .bind(occupancy_level)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if let Some(totals) = totals {
            insert_history_snapshot(&mut tx, &id, totals, table_config_json.as_deref(), &now)
                .await?;
        }

        tx.commit().await?;

        Ok(Cafe {
            id,
            owner_sub: request.owner_sub.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            phone_number: request.phone_number.clone(),
            address: request.address.clone(),
            city: request.city.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            website_link: request.website_link.clone(),
            menu_link: request.menu_link.clone(),
            instagram_url: request.instagram_url.clone(),
            cafe_photos: request.cafe_photos.clone(),
            menu_photos: request.menu_photos.clone(),
            amenities: request.amenities.clone(),
            working_hours: request.working_hours.clone(),
            table_config: request.table_config.clone(),
            occupancy_level,
            avg_rating: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Partially update a cafe. A table_config value triggers the occupancy
    /// aggregation: the recomputed level and a history snapshot are written
    /// in the same transaction as the field update. An unrecognized config
    /// shape is stored verbatim with a diagnostic; the other fields still
    /// apply and the level stays unchanged.
    pub async fn update_cafe(
        &self,
        id: &str,
        request: &UpdateCafeRequest,
    ) -> Result<Cafe, AppError> {
        let existing = self
            .get_cafe(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cafe {} not found", id)))?;

        let now = Utc::now().to_rfc3339();

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let description = request.description.clone().or(existing.description.clone());
        let phone_number = request
            .phone_number
            .clone()
            .or(existing.phone_number.clone());
        let address = request.address.as_ref().unwrap_or(&existing.address);
        let city = request.city.as_ref().unwrap_or(&existing.city);
        let latitude = request.latitude.unwrap_or(existing.latitude);
        let longitude = request.longitude.unwrap_or(existing.longitude);
        let website_link = request
            .website_link
            .clone()
            .or(existing.website_link.clone());
        let menu_link = request.menu_link.clone().or(existing.menu_link.clone());
        let instagram_url = request
            .instagram_url
            .clone()
            .or(existing.instagram_url.clone());
        let cafe_photos = request
            .cafe_photos
            .clone()
            .unwrap_or(existing.cafe_photos.clone());
        let menu_photos = request
            .menu_photos
            .clone()
            .unwrap_or(existing.menu_photos.clone());
        let amenities = request
            .amenities
            .clone()
            .unwrap_or(existing.amenities.clone());
        let working_hours = request
            .working_hours
            .clone()
            .unwrap_or(existing.working_hours.clone());

        let totals = match &request.table_config {
            Some(value) => interpret_table_config(id, value)?,
            None => None,
        };
        let table_config = request
            .table_config
            .clone()
            .or(existing.table_config.clone());
        let occupancy_level = totals.map(|t| t.level()).or(existing.occupancy_level);

        let cafe_photos_json = serde_json::to_string(&cafe_photos)?;
        let menu_photos_json = serde_json::to_string(&menu_photos)?;
        let amenities_json = serde_json::to_string(&amenities)?;
        let working_hours_json = serde_json::to_string(&working_hours)?;
        let table_config_json = table_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"UPDATE cafes SET
                name = ?, description = ?, phone_number = ?, address = ?, city = ?,
                latitude = ?, longitude = ?, website_link = ?, menu_link = ?,
                instagram_url = ?, cafe_photos = ?, menu_photos = ?, amenities = ?,
                working_hours = ?, table_config = ?, occupancy_level = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(name)
        .bind(&description)
        .bind(&phone_number)
        .bind(address)
        .bind(city)
        .bind(latitude)
        .bind(longitude)
        .bind(&website_link)
        .bind(&menu_link)
        .bind(&instagram_url)
        .bind(&cafe_photos_json)
        .bind(&menu_photos_json)
        .bind(&amenities_json)
        .bind(&working_hours_json)
        .bind(&table_config_json)
        .bind(occupancy_level)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(totals) = totals {
            let submitted_json = request
                .table_config
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            insert_history_snapshot(&mut tx, id, totals, submitted_json.as_deref(), &now).await?;
        }

        tx.commit().await?;

        Ok(Cafe {
            id: id.to_string(),
            owner_sub: existing.owner_sub,
            name: name.clone(),
            description,
            phone_number,
            address: address.clone(),
            city: city.clone(),
            latitude,
            longitude,
            website_link,
            menu_link,
            instagram_url,
            cafe_photos,
            menu_photos,
            amenities,
            working_hours,
            table_config,
            occupancy_level,
            avg_rating: existing.avg_rating,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a cafe. Child rows (reviews, checkins, reservations, live
    /// updates, history snapshots) go with it via foreign key cascade.
    pub async fn delete_cafe(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cafes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Cafe {} not found", id)));
        }

        Ok(())
    }

    // ==================== OCCUPANCY OPERATIONS ====================

    /// Apply a dedicated occupancy report: recompute the cafe's level from
    /// the seat tallies and append a history snapshot, atomically.
    pub async fn record_occupancy(&self, report: &OccupancyReport) -> Result<i64, AppError> {
        self.get_cafe(&report.cafe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cafe {} not found", report.cafe_id)))?;

        let totals = SeatTotals::new(
            report.two_table_seats + report.four_table_seats,
            report.two_seats_occupied + report.four_seats_occupied,
        );
        let level = totals.level();
        let now = Utc::now().to_rfc3339();
        let table_config_json = report
            .table_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE cafes SET occupancy_level = ?, updated_at = ? WHERE id = ?")
            .bind(level)
            .bind(&now)
            .bind(&report.cafe_id)
            .execute(&mut *tx)
            .await?;

        insert_history_snapshot(
            &mut tx,
            &report.cafe_id,
            totals,
            table_config_json.as_deref(),
            &now,
        )
        .await?;

        tx.commit().await?;

        Ok(level)
    }

    /// History snapshots for a cafe from the last 24 hours, oldest first.
    pub async fn occupancy_history(
        &self,
        cafe_id: &str,
    ) -> Result<Vec<OccupancySnapshot>, AppError> {
        let since = (Utc::now() - Duration::hours(24)).to_rfc3339();

        let rows = sqlx::query(
            r#"SELECT id, cafe_id, occupancy_level, total_capacity, total_occupied,
                      table_config, created_at
               FROM occupancy_history
               WHERE cafe_id = ? AND created_at >= ?
               ORDER BY created_at ASC"#,
        )
        .bind(cafe_id)
        .bind(&since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(snapshot_from_row).collect())
    }

    // ==================== USER OPERATIONS ====================

    /// Create a user. Idempotent on the identity subject: an existing
    /// profile is returned unchanged.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        if let Some(existing) = self.get_user(&request.subject).await? {
            return Ok(existing);
        }

        let now = Utc::now().to_rfc3339();
        let preferences = UserPreferences::default();
        let preferences_json = serde_json::to_string(&preferences)?;

        sqlx::query(
            r#"INSERT INTO users (
                subject, username, email, preferences, total_checkins,
                total_reviews, push_notifications, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 0, 0, 0, ?, ?)"#,
        )
        .bind(&request.subject)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&preferences_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            subject: request.subject.clone(),
            username: request.username.clone(),
            email: request.email.clone(),
            preferences,
            total_checkins: 0,
            total_reviews: 0,
            push_notifications: false,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Get a user by identity subject.
    pub async fn get_user(&self, subject: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE subject = ?",
            USER_COLUMNS
        ))
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Update a user's preferences. Provided keys overwrite stored ones.
    pub async fn update_user(
        &self,
        subject: &str,
        request: &UpdateUserRequest,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(subject)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", subject)))?;

        let now = Utc::now().to_rfc3339();

        let preferences = UserPreferences {
            work_friendly: request.work_friendly.or(existing.preferences.work_friendly),
            noise_preference: request
                .noise_preference
                .clone()
                .or(existing.preferences.noise_preference.clone()),
            vibe_preferences: request
                .vibe_preferences
                .clone()
                .unwrap_or(existing.preferences.vibe_preferences.clone()),
            visit_purpose: request
                .visit_purpose
                .clone()
                .unwrap_or(existing.preferences.visit_purpose.clone()),
            dietary_preferences: request
                .dietary_preferences
                .clone()
                .unwrap_or(existing.preferences.dietary_preferences.clone()),
            amenities: request
                .amenities
                .clone()
                .unwrap_or(existing.preferences.amenities.clone()),
        };
        let push_notifications = request
            .push_notifications
            .unwrap_or(existing.push_notifications);
        let preferences_json = serde_json::to_string(&preferences)?;

        sqlx::query(
            "UPDATE users SET preferences = ?, push_notifications = ?, updated_at = ? WHERE subject = ?",
        )
        .bind(&preferences_json)
        .bind(push_notifications as i32)
        .bind(&now)
        .bind(subject)
        .execute(&self.pool)
        .await?;

        Ok(User {
            subject: subject.to_string(),
            username: existing.username,
            email: existing.email,
            preferences,
            total_checkins: existing.total_checkins,
            total_reviews: existing.total_reviews,
            push_notifications,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    // ==================== CHECKIN OPERATIONS ====================

    /// Record a check-in and bump the user's counter in one transaction.
    pub async fn create_checkin(
        &self,
        request: &CreateCheckinRequest,
    ) -> Result<Checkin, AppError> {
        self.get_user(&request.user_sub)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_sub)))?;
        self.get_cafe(&request.cafe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cafe {} not found", request.cafe_id)))?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO checkins (id, cafe_id, user_sub, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&request.cafe_id)
            .bind(&request.user_sub)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET total_checkins = total_checkins + 1 WHERE subject = ?")
            .bind(&request.user_sub)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Checkin {
            id,
            cafe_id: request.cafe_id.clone(),
            user_sub: request.user_sub.clone(),
            created_at: now,
        })
    }

    /// Whether the user has checked in at the cafe today, with the latest
    /// check-in time if so.
    pub async fn checkin_status(
        &self,
        user_sub: &str,
        cafe_id: &str,
    ) -> Result<CheckinStatus, AppError> {
        let start_of_day = start_of_local_day();

        let row = sqlx::query(
            r#"SELECT created_at FROM checkins
               WHERE user_sub = ? AND cafe_id = ? AND created_at >= ?
               ORDER BY created_at DESC LIMIT 1"#,
        )
        .bind(user_sub)
        .bind(cafe_id)
        .bind(&start_of_day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(CheckinStatus {
            checked_in_today: row.is_some(),
            last_checkin: row.map(|r| r.get("created_at")),
        })
    }

    /// Cafe IDs the user checked into today.
    pub async fn today_checkins(&self, user_sub: &str) -> Result<Vec<String>, AppError> {
        let start_of_day = start_of_local_day();

        let rows = sqlx::query(
            "SELECT DISTINCT cafe_id FROM checkins WHERE user_sub = ? AND created_at >= ?",
        )
        .bind(user_sub)
        .bind(&start_of_day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("cafe_id")).collect())
    }

    // ==================== REVIEW OPERATIONS ====================

    /// Create a review. Requires a same-day check-in at the cafe and no
    /// prior review for the day. The insert, the user's counter and the
    /// cafe's average rating commit together.
    ///
    /// The two daily checks are query-then-insert with no locking; two
    /// concurrent requests can both pass them.
    pub async fn create_review(&self, request: &CreateReviewRequest) -> Result<Review, AppError> {
        let user = self
            .get_user(&request.user_sub)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_sub)))?;
        self.get_cafe(&request.cafe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cafe {} not found", request.cafe_id)))?;

        let start_of_day = start_of_local_day();

        let checkin = sqlx::query(
            "SELECT id FROM checkins WHERE user_sub = ? AND cafe_id = ? AND created_at >= ? LIMIT 1",
        )
        .bind(&request.user_sub)
        .bind(&request.cafe_id)
        .bind(&start_of_day)
        .fetch_optional(&self.pool)
        .await?;

        if checkin.is_none() {
            return Err(AppError::Forbidden(
                "Check-in required to leave a review".to_string(),
            ));
        }

        let existing_review = sqlx::query(
            "SELECT id FROM reviews WHERE user_sub = ? AND cafe_id = ? AND created_at >= ? LIMIT 1",
        )
        .bind(&request.user_sub)
        .bind(&request.cafe_id)
        .bind(&start_of_day)
        .fetch_optional(&self.pool)
        .await?;

        if existing_review.is_some() {
            return Err(AppError::Conflict(
                "A review for this cafe was already submitted today".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO reviews (id, cafe_id, user_sub, rating, review_text, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.cafe_id)
        .bind(&request.user_sub)
        .bind(request.rating)
        .bind(&request.review_text)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET total_reviews = total_reviews + 1 WHERE subject = ?")
            .bind(&request.user_sub)
            .execute(&mut *tx)
            .await?;

        // Average includes the row inserted above (same transaction)
        let avg_row = sqlx::query("SELECT AVG(rating) AS avg_rating FROM reviews WHERE cafe_id = ?")
            .bind(&request.cafe_id)
            .fetch_one(&mut *tx)
            .await?;
        let avg_rating: Option<f64> = avg_row.get("avg_rating");

        sqlx::query("UPDATE cafes SET avg_rating = ?, updated_at = ? WHERE id = ?")
            .bind(avg_rating.unwrap_or(0.0))
            .bind(&now)
            .bind(&request.cafe_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Review {
            id,
            cafe_id: request.cafe_id.clone(),
            user_sub: request.user_sub.clone(),
            rating: request.rating,
            review_text: request.review_text.clone(),
            created_at: now,
            username: Some(user.username),
        })
    }

    /// Reviews for a cafe, newest first, with reviewer usernames.
    pub async fn cafe_reviews(&self, cafe_id: &str) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query(
            r#"SELECT r.id, r.cafe_id, r.user_sub, r.rating, r.review_text, r.created_at,
                      u.username
               FROM reviews r
               LEFT JOIN users u ON u.subject = r.user_sub
               WHERE r.cafe_id = ?
               ORDER BY r.created_at DESC"#,
        )
        .bind(cafe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let username: Option<String> = row.get("username");
                Review {
                    id: row.get("id"),
                    cafe_id: row.get("cafe_id"),
                    user_sub: row.get("user_sub"),
                    rating: row.get("rating"),
                    review_text: row.get("review_text"),
                    created_at: row.get("created_at"),
                    username: Some(username.unwrap_or_else(|| "Unknown".to_string())),
                }
            })
            .collect())
    }

    // ==================== RESERVATION OPERATIONS ====================

    /// Create a reservation with status "pending".
    pub async fn create_reservation(
        &self,
        request: &CreateReservationRequest,
    ) -> Result<Reservation, AppError> {
        let user = self
            .get_user(&request.user_sub)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_sub)))?;
        let cafe = self
            .get_cafe(&request.cafe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cafe {} not found", request.cafe_id)))?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO reservations (
                id, cafe_id, user_sub, reservation_date, reservation_time,
                party_size, special_request, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.cafe_id)
        .bind(&request.user_sub)
        .bind(&request.reservation_date)
        .bind(&request.reservation_time)
        .bind(request.party_size)
        .bind(&request.special_request)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Reservation {
            id,
            cafe_id: request.cafe_id.clone(),
            user_sub: request.user_sub.clone(),
            reservation_date: request.reservation_date.clone(),
            reservation_time: request.reservation_time.clone(),
            party_size: request.party_size,
            special_request: request.special_request.clone(),
            status: "pending".to_string(),
            created_at: now.clone(),
            updated_at: now,
            cafe_name: Some(cafe.name),
            user_name: Some(user.username),
        })
    }

    /// Reservations made by a user, newest first.
    pub async fn user_reservations(&self, user_sub: &str) -> Result<Vec<Reservation>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE r.user_sub = ? ORDER BY r.created_at DESC",
            RESERVATION_SELECT
        ))
        .bind(user_sub)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(reservation_from_row).collect())
    }

    /// Reservations at a cafe, newest first.
    pub async fn cafe_reservations(&self, cafe_id: &str) -> Result<Vec<Reservation>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE r.cafe_id = ? ORDER BY r.created_at DESC",
            RESERVATION_SELECT
        ))
        .bind(cafe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(reservation_from_row).collect())
    }

    /// Partially update a reservation (status changes, rescheduling).
    pub async fn update_reservation(
        &self,
        id: &str,
        request: &UpdateReservationRequest,
    ) -> Result<Reservation, AppError> {
        let row = sqlx::query(&format!("{} WHERE r.id = ?", RESERVATION_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let existing = row
            .as_ref()
            .map(reservation_from_row)
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))?;

        let now = Utc::now().to_rfc3339();

        let status = request.status.as_ref().unwrap_or(&existing.status);
        let reservation_date = request
            .reservation_date
            .as_ref()
            .unwrap_or(&existing.reservation_date);
        let reservation_time = request
            .reservation_time
            .as_ref()
            .unwrap_or(&existing.reservation_time);
        let party_size = request.party_size.unwrap_or(existing.party_size);
        let special_request = request
            .special_request
            .clone()
            .or(existing.special_request.clone());

        sqlx::query(
            r#"UPDATE reservations SET
                status = ?, reservation_date = ?, reservation_time = ?,
                party_size = ?, special_request = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(status)
        .bind(reservation_date)
        .bind(reservation_time)
        .bind(party_size)
        .bind(&special_request)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Reservation {
            id: id.to_string(),
            cafe_id: existing.cafe_id,
            user_sub: existing.user_sub,
            reservation_date: reservation_date.clone(),
            reservation_time: reservation_time.clone(),
            party_size,
            special_request,
            status: status.clone(),
            created_at: existing.created_at,
            updated_at: now,
            cafe_name: existing.cafe_name,
            user_name: existing.user_name,
        })
    }

    /// Delete a reservation (cancellation).
    pub async fn delete_reservation(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reservation {} not found", id)));
        }

        Ok(())
    }

    // ==================== LIVE UPDATE OPERATIONS ====================

    /// Create a live update from a pre-uploaded image URL. Expires 24 hours
    /// after creation.
    pub async fn create_live_update(
        &self,
        request: &CreateLiveUpdateRequest,
    ) -> Result<LiveUpdate, AppError> {
        self.get_user(&request.user_sub)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_sub)))?;
        self.get_cafe(&request.cafe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cafe {} not found", request.cafe_id)))?;

        let id = uuid::Uuid::new_v4().to_string();
        let created = Utc::now();
        let created_at = created.to_rfc3339();
        let expires_at = (created + Duration::hours(24)).to_rfc3339();

        sqlx::query(
            r#"INSERT INTO live_updates (
                id, cafe_id, user_sub, image_url, vibe, visit_purpose, created_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.cafe_id)
        .bind(&request.user_sub)
        .bind(&request.image_url)
        .bind(&request.vibe)
        .bind(&request.visit_purpose)
        .bind(&created_at)
        .bind(&expires_at)
        .execute(&self.pool)
        .await?;

        Ok(LiveUpdate {
            id,
            cafe_id: request.cafe_id.clone(),
            user_sub: request.user_sub.clone(),
            image_url: request.image_url.clone(),
            vibe: request.vibe.clone(),
            visit_purpose: request.visit_purpose.clone(),
            created_at,
            expires_at,
            cafe_name: None,
        })
    }

    /// Active (non-expired) live updates for a cafe, newest first.
    pub async fn cafe_live_updates(&self, cafe_id: &str) -> Result<Vec<LiveUpdate>, AppError> {
        let now = Utc::now().to_rfc3339();

        let rows = sqlx::query(
            r#"SELECT id, cafe_id, user_sub, image_url, vibe, visit_purpose,
                      created_at, expires_at
               FROM live_updates
               WHERE cafe_id = ? AND expires_at > ?
               ORDER BY created_at DESC"#,
        )
        .bind(cafe_id)
        .bind(&now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| live_update_from_row(row, None))
            .collect())
    }

    /// Active live updates posted by a user, newest first, with cafe names.
    pub async fn user_live_updates(&self, user_sub: &str) -> Result<Vec<LiveUpdate>, AppError> {
        let now = Utc::now().to_rfc3339();

        let rows = sqlx::query(
            r#"SELECT l.id, l.cafe_id, l.user_sub, l.image_url, l.vibe, l.visit_purpose,
                      l.created_at, l.expires_at, c.name AS cafe_name
               FROM live_updates l
               JOIN cafes c ON c.id = l.cafe_id
               WHERE l.user_sub = ? AND l.expires_at > ?
               ORDER BY l.created_at DESC"#,
        )
        .bind(user_sub)
        .bind(&now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let cafe_name: String = row.get("cafe_name");
                live_update_from_row(row, Some(cafe_name))
            })
            .collect())
    }
}

/// Interpret a submitted table_config value. A recognized shape is range
/// checked (hard error on violation) and aggregated; an unrecognized shape
/// yields `None` with a diagnostic so the caller can proceed without
/// touching the occupancy level.
fn interpret_table_config(
    cafe_id: &str,
    value: &serde_json::Value,
) -> Result<Option<SeatTotals>, AppError> {
    match TableConfig::from_value(value) {
        Some(config) => {
            config.validate()?;
            Ok(Some(config.totals()))
        }
        None => {
            tracing::warn!(
                cafe_id = %cafe_id,
                "Unrecognized table_config shape; storing verbatim and skipping occupancy recomputation"
            );
            Ok(None)
        }
    }
}

/// Append an occupancy history snapshot inside the caller's transaction.
async fn insert_history_snapshot(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    cafe_id: &str,
    totals: SeatTotals,
    table_config_json: Option<&str>,
    now: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO occupancy_history (
            id, cafe_id, occupancy_level, total_capacity, total_occupied,
            table_config, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(cafe_id)
    .bind(totals.level())
    .bind(totals.capacity)
    .bind(totals.occupied)
    .bind(table_config_json)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// UTC timestamp of the most recent server-local midnight. Daily limits
/// (one review per day, the check-in gate) reset at this boundary.
fn start_of_local_day() -> String {
    let midnight = Local::now()
        .with_time(NaiveTime::MIN)
        .earliest()
        .unwrap_or_else(Local::now);
    midnight.with_timezone(&Utc).to_rfc3339()
}

// Helper functions for row conversion

const CAFE_COLUMNS: &str = "id, owner_sub, name, description, phone_number, address, city, \
     latitude, longitude, website_link, menu_link, instagram_url, cafe_photos, menu_photos, \
     amenities, working_hours, table_config, occupancy_level, avg_rating, created_at, updated_at";

const USER_COLUMNS: &str = "subject, username, email, preferences, total_checkins, \
     total_reviews, push_notifications, created_at, updated_at";

const RESERVATION_SELECT: &str =
    "SELECT r.id, r.cafe_id, r.user_sub, r.reservation_date, r.reservation_time, \
     r.party_size, r.special_request, r.status, r.created_at, r.updated_at, \
     c.name AS cafe_name, u.username AS user_name \
     FROM reservations r \
     LEFT JOIN cafes c ON c.id = r.cafe_id \
     LEFT JOIN users u ON u.subject = r.user_sub";

fn cafe_from_row(row: &sqlx::sqlite::SqliteRow) -> Cafe {
    let cafe_photos: String = row.get("cafe_photos");
    let menu_photos: String = row.get("menu_photos");
    let amenities: String = row.get("amenities");
    let working_hours: String = row.get("working_hours");
    let table_config: Option<String> = row.get("table_config");

    Cafe {
        id: row.get("id"),
        owner_sub: row.get("owner_sub"),
        name: row.get("name"),
        description: row.get("description"),
        phone_number: row.get("phone_number"),
        address: row.get("address"),
        city: row.get("city"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        website_link: row.get("website_link"),
        menu_link: row.get("menu_link"),
        instagram_url: row.get("instagram_url"),
        cafe_photos: parse_json_array(&cafe_photos),
        menu_photos: parse_json_array(&menu_photos),
        amenities: parse_json_array(&amenities),
        working_hours: serde_json::from_str(&working_hours).unwrap_or_default(),
        table_config: table_config.and_then(|s| serde_json::from_str(&s).ok()),
        occupancy_level: row.get("occupancy_level"),
        avg_rating: row.get("avg_rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let preferences: String = row.get("preferences");
    let push_notifications: i32 = row.get("push_notifications");

    User {
        subject: row.get("subject"),
        username: row.get("username"),
        email: row.get("email"),
        preferences: serde_json::from_str(&preferences).unwrap_or_default(),
        total_checkins: row.get("total_checkins"),
        total_reviews: row.get("total_reviews"),
        push_notifications: push_notifications != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn reservation_from_row(row: &sqlx::sqlite::SqliteRow) -> Reservation {
    Reservation {
        id: row.get("id"),
        cafe_id: row.get("cafe_id"),
        user_sub: row.get("user_sub"),
        reservation_date: row.get("reservation_date"),
        reservation_time: row.get("reservation_time"),
        party_size: row.get("party_size"),
        special_request: row.get("special_request"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        cafe_name: row.get("cafe_name"),
        user_name: row.get("user_name"),
    }
}

fn live_update_from_row(row: &sqlx::sqlite::SqliteRow, cafe_name: Option<String>) -> LiveUpdate {
    LiveUpdate {
        id: row.get("id"),
        cafe_id: row.get("cafe_id"),
        user_sub: row.get("user_sub"),
        image_url: row.get("image_url"),
        vibe: row.get("vibe"),
        visit_purpose: row.get("visit_purpose"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        cafe_name,
    }
}

fn snapshot_from_row(row: &sqlx::sqlite::SqliteRow) -> OccupancySnapshot {
    let table_config: Option<String> = row.get("table_config");

    OccupancySnapshot {
        id: row.get("id"),
        cafe_id: row.get("cafe_id"),
        occupancy_level: row.get("occupancy_level"),
        total_capacity: row.get("total_capacity"),
        total_occupied: row.get("total_occupied"),
        table_config: table_config.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
