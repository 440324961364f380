use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use moveline_core::domain::booking::{
    Booking, BookingId, BookingSchedule, BookingStatus, CustomerDetails, ServiceDescriptor,
};
use moveline_core::domain::schedule::Slot;
use moveline_core::domain::service::{Route, ServiceCategory};
use moveline_core::domain::session::CallId;
use moveline_core::pricing::QuoteBreakdown;

use super::{BookingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO bookings (
                id, customer_name, customer_phone, customer_email,
                move_date, slot, category, crew_size, service_label,
                pickup_address, delivery_address, distance_miles, drive_time_minutes,
                hourly_rate, hours, subtotal, travel_fee, service_charge, total,
                status, source, originating_call_id, calendar_synced, created_at, updated_at
             ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
             )",
        )
        .bind(&booking.id.0)
        .bind(&booking.customer.name)
        .bind(&booking.customer.phone)
        .bind(&booking.customer.email)
        .bind(booking.schedule.date.format("%Y-%m-%d").to_string())
        .bind(booking.schedule.slot.as_str())
        .bind(booking.service.category.as_str())
        .bind(booking.service.crew_size as i64)
        .bind(&booking.service.label)
        .bind(&booking.route.pickup)
        .bind(&booking.route.delivery)
        .bind(booking.route.distance_miles.to_string())
        .bind(booking.route.drive_time_minutes)
        .bind(booking.price.hourly_rate.to_string())
        .bind(booking.price.hours as i64)
        .bind(booking.price.subtotal.to_string())
        .bind(booking.price.travel_fee.to_string())
        .bind(booking.price.service_charge.to_string())
        .bind(booking.price.total.to_string())
        .bind(booking.status.as_str())
        .bind(&booking.source)
        .bind(&booking.originating_call_id.0)
        .bind(booking.calendar_synced as i64)
        .bind(booking.created_at.to_rfc3339())
        .bind(booking.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                Err(RepositoryError::Duplicate(format!(
                    "slot {} on {} already holds a confirmed booking",
                    booking.schedule.slot.as_str(),
                    booking.schedule.date
                )))
            }
            Err(error) => Err(RepositoryError::Database(error)),
        }
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(decode_booking).transpose()
    }

    async fn holds_slot(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE move_date = ?1 AND slot = ?2 AND status = 'confirmed'",
        )
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(slot.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn set_calendar_synced(
        &self,
        id: &BookingId,
        synced: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE bookings SET calendar_synced = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(synced as i64)
            .bind(Utc::now().to_rfc3339())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn decode_booking(row: sqlx::sqlite::SqliteRow) -> Result<Booking, RepositoryError> {
    let category_raw: String = row.get("category");
    let category = ServiceCategory::parse(&category_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown category `{category_raw}`")))?;
    let slot_raw: String = row.get("slot");
    let slot = Slot::parse(&slot_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown slot `{slot_raw}`")))?;
    let status_raw: String = row.get("status");
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown status `{status_raw}`")))?;

    Ok(Booking {
        id: BookingId(row.get("id")),
        customer: CustomerDetails {
            name: row.get("customer_name"),
            phone: row.get("customer_phone"),
            email: row.get("customer_email"),
        },
        schedule: BookingSchedule { date: decode_date(&row, "move_date")?, slot },
        service: ServiceDescriptor {
            category,
            crew_size: row.get::<i64, _>("crew_size") as u32,
            label: row.get("service_label"),
        },
        route: Route {
            pickup: row.get("pickup_address"),
            delivery: row.get("delivery_address"),
            distance_miles: decode_decimal(&row, "distance_miles")?,
            drive_time_minutes: row.get("drive_time_minutes"),
        },
        price: QuoteBreakdown {
            category,
            crew_size: row.get::<i64, _>("crew_size") as u32,
            hours: row.get::<i64, _>("hours") as u32,
            distance_miles: decode_decimal(&row, "distance_miles")?,
            hourly_rate: decode_decimal(&row, "hourly_rate")?,
            subtotal: decode_decimal(&row, "subtotal")?,
            travel_fee: decode_decimal(&row, "travel_fee")?,
            service_charge: decode_decimal(&row, "service_charge")?,
            total: decode_decimal(&row, "total")?,
        },
        status,
        source: row.get("source"),
        originating_call_id: CallId(row.get("originating_call_id")),
        calendar_synced: row.get::<i64, _>("calendar_synced") != 0,
        created_at: decode_timestamp(&row, "created_at")?,
        updated_at: decode_timestamp(&row, "updated_at")?,
    })
}

fn decode_decimal(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.get(column);
    raw.parse::<Decimal>()
        .map_err(|error| RepositoryError::Decode(format!("column {column}: {error}")))
}

fn decode_date(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<NaiveDate, RepositoryError> {
    let raw: String = row.get(column);
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|error| RepositoryError::Decode(format!("column {column}: {error}")))
}

fn decode_timestamp(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: String = row.get(column);
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("column {column}: {error}")))
}
