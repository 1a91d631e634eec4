//! Guest bookings against accommodations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    AuditStamp, AuditTrail, AuditedEntity, EntityDefinition, EntityService, FieldViolations,
    ResourceKind, UserId,
};

/// Booking settlement state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting host confirmation; new bookings start here.
    #[default]
    Pending,
    /// Confirmed by the host.
    Confirmed,
    /// Cancelled by either party.
    Cancelled,
}

impl BookingStatus {
    /// Stable label used in search keywords.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A guest's reservation of an accommodation for a date range.
///
/// ## Invariants
/// - `check_out` is strictly after `check_in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: Uuid,
    accommodation_id: Uuid,
    guest_id: UserId,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: u32,
    total_cents: i64,
    status: BookingStatus,
    audit: AuditTrail,
}

impl Booking {
    /// Stable record identifier.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Accommodation being reserved.
    pub const fn accommodation_id(&self) -> Uuid {
        self.accommodation_id
    }

    /// Guest that owns the booking.
    pub const fn guest_id(&self) -> UserId {
        self.guest_id
    }

    /// First night of the stay.
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Morning of departure.
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Party size.
    pub const fn guests(&self) -> u32 {
        self.guests
    }

    /// Total price in minor currency units.
    pub const fn total_cents(&self) -> i64 {
        self.total_cents
    }

    /// Settlement state.
    pub const fn status(&self) -> BookingStatus {
        self.status
    }
}

impl AuditedEntity for Booking {
    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.guest_id)
    }

    fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditTrail {
        &mut self.audit
    }
}

/// Payload accepted when reserving an accommodation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    /// Accommodation being reserved.
    pub accommodation_id: Uuid,
    /// Guest that will own the booking.
    pub guest_id: UserId,
    /// First night of the stay.
    pub check_in: NaiveDate,
    /// Morning of departure; must be after `check_in`.
    pub check_out: NaiveDate,
    /// Party size.
    pub guests: u32,
    /// Total price in minor currency units.
    pub total_cents: i64,
}

/// Partial update for a booking; absent fields stay untouched.
///
/// Stay dates must be supplied together so the range stays validated as a
/// pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBooking {
    /// Replacement first night.
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    /// Replacement departure morning.
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    /// Replacement party size.
    #[serde(default)]
    pub guests: Option<u32>,
    /// Replacement settlement state.
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

/// Structured filter over bookings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    /// Restrict to one accommodation's bookings.
    #[serde(default)]
    pub accommodation_id: Option<Uuid>,
    /// Restrict to one guest's bookings.
    #[serde(default)]
    pub guest_id: Option<UserId>,
    /// Restrict to one settlement state.
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// Keep only stays overlapping the window starting here.
    #[serde(default)]
    pub overlapping_from: Option<NaiveDate>,
    /// Keep only stays overlapping the window ending here (exclusive).
    #[serde(default)]
    pub overlapping_until: Option<NaiveDate>,
    /// Settlement-state keyword from free-text search; unknown keywords
    /// match nothing.
    #[serde(default)]
    pub status_keyword: Option<String>,
}

/// Free-text booking search: an accommodation id or a status keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSearch {
    /// Accommodation UUID or settlement-state keyword.
    pub text: String,
}

/// Capability set wiring bookings into the orchestrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookingDefinition;

impl EntityDefinition for BookingDefinition {
    type Entity = Booking;
    type CreatePayload = CreateBooking;
    type UpdatePayload = UpdateBooking;
    type Filter = BookingFilter;
    type SearchQuery = BookingSearch;

    const RESOURCE: ResourceKind = ResourceKind::Booking;

    fn validate_create(&self, payload: &CreateBooking) -> Result<(), FieldViolations> {
        let mut violations = FieldViolations::new();
        check_stay(&mut violations, payload.check_in, payload.check_out);
        check_guests(&mut violations, payload.guests);
        if payload.total_cents < 0 {
            violations.push("totalCents", "must not be negative");
        }
        violations.into_result()
    }

    fn validate_update(&self, payload: &UpdateBooking) -> Result<(), FieldViolations> {
        let mut violations = FieldViolations::new();
        match (payload.check_in, payload.check_out) {
            (Some(check_in), Some(check_out)) => {
                check_stay(&mut violations, check_in, check_out);
            }
            (Some(_), None) | (None, Some(_)) => {
                violations.push("checkIn", "checkIn and checkOut must be updated together");
            }
            (None, None) => {}
        }
        if let Some(guests) = payload.guests {
            check_guests(&mut violations, guests);
        }
        violations.into_result()
    }

    fn create_owner(&self, payload: &CreateBooking) -> Option<UserId> {
        Some(payload.guest_id)
    }

    fn construct(&self, payload: CreateBooking, id: Uuid, created: AuditStamp) -> Booking {
        Booking {
            id,
            accommodation_id: payload.accommodation_id,
            guest_id: payload.guest_id,
            check_in: payload.check_in,
            check_out: payload.check_out,
            guests: payload.guests,
            total_cents: payload.total_cents,
            status: BookingStatus::Pending,
            audit: AuditTrail::new(created),
        }
    }

    fn apply_update(&self, entity: &mut Booking, payload: UpdateBooking) {
        if let Some(check_in) = payload.check_in {
            entity.check_in = check_in;
        }
        if let Some(check_out) = payload.check_out {
            entity.check_out = check_out;
        }
        if let Some(guests) = payload.guests {
            entity.guests = guests;
        }
        if let Some(status) = payload.status {
            entity.status = status;
        }
    }

    fn search_filter(&self, query: &BookingSearch) -> BookingFilter {
        let text = query.text.trim();
        if let Ok(accommodation_id) = Uuid::parse_str(text) {
            return BookingFilter {
                accommodation_id: Some(accommodation_id),
                ..BookingFilter::default()
            };
        }
        BookingFilter {
            status_keyword: Some(text.to_lowercase()),
            ..BookingFilter::default()
        }
    }

    fn matches(&self, entity: &Booking, filter: &BookingFilter) -> bool {
        if filter
            .accommodation_id
            .is_some_and(|id| id != entity.accommodation_id)
        {
            return false;
        }
        if filter.guest_id.is_some_and(|guest| guest != entity.guest_id) {
            return false;
        }
        if filter.status.is_some_and(|status| status != entity.status) {
            return false;
        }
        if filter
            .overlapping_from
            .is_some_and(|from| entity.check_out <= from)
        {
            return false;
        }
        if filter
            .overlapping_until
            .is_some_and(|until| entity.check_in >= until)
        {
            return false;
        }
        if filter
            .status_keyword
            .as_deref()
            .is_some_and(|keyword| entity.status.as_str() != keyword)
        {
            return false;
        }
        true
    }
}

fn check_stay(violations: &mut FieldViolations, check_in: NaiveDate, check_out: NaiveDate) {
    if check_out <= check_in {
        violations.push("checkOut", "must be after checkIn");
    }
}

fn check_guests(violations: &mut FieldViolations, guests: u32) {
    if guests == 0 {
        violations.push("guests", "must be at least 1");
    }
}

/// Orchestrated service over bookings.
pub type BookingService<S, H> = EntityService<BookingDefinition, S, H>;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
    }

    #[fixture]
    fn payload() -> CreateBooking {
        CreateBooking {
            accommodation_id: Uuid::new_v4(),
            guest_id: UserId::random(),
            check_in: date(2026, 9, 1),
            check_out: date(2026, 9, 5),
            guests: 2,
            total_cents: 50_000,
        }
    }

    fn stamp() -> AuditStamp {
        AuditStamp::new(Utc::now(), UserId::random())
    }

    #[rstest]
    fn valid_payload_passes(payload: CreateBooking) {
        assert!(BookingDefinition.validate_create(&payload).is_ok());
    }

    #[rstest]
    fn inverted_stay_is_rejected(mut payload: CreateBooking) {
        payload.check_out = payload.check_in;
        let violations = BookingDefinition
            .validate_create(&payload)
            .expect_err("payload rejected");
        assert!(
            violations
                .as_slice()
                .iter()
                .any(|violation| violation.field == "checkOut")
        );
    }

    #[rstest]
    fn new_bookings_start_pending(payload: CreateBooking) {
        let booking = BookingDefinition.construct(payload, Uuid::new_v4(), stamp());
        assert_eq!(booking.status(), BookingStatus::Pending);
    }

    #[rstest]
    fn update_requires_both_stay_dates() {
        let update = UpdateBooking {
            check_in: Some(date(2026, 9, 2)),
            ..UpdateBooking::default()
        };
        let violations = BookingDefinition
            .validate_update(&update)
            .expect_err("lone date rejected");
        assert!(
            violations
                .as_slice()
                .iter()
                .any(|violation| violation.field == "checkIn")
        );
    }

    #[rstest]
    #[case(date(2026, 9, 4), date(2026, 9, 6), true)]
    #[case(date(2026, 9, 5), date(2026, 9, 8), false)]
    #[case(date(2026, 8, 20), date(2026, 9, 1), false)]
    #[case(date(2026, 8, 30), date(2026, 9, 2), true)]
    fn overlap_filter_uses_half_open_ranges(
        payload: CreateBooking,
        #[case] from: NaiveDate,
        #[case] until: NaiveDate,
        #[case] expected: bool,
    ) {
        let booking = BookingDefinition.construct(payload, Uuid::new_v4(), stamp());
        let filter = BookingFilter {
            overlapping_from: Some(from),
            overlapping_until: Some(until),
            ..BookingFilter::default()
        };
        assert_eq!(BookingDefinition.matches(&booking, &filter), expected);
    }

    #[rstest]
    fn search_text_parses_accommodation_ids(payload: CreateBooking) {
        let accommodation_id = payload.accommodation_id;
        let booking = BookingDefinition.construct(payload, Uuid::new_v4(), stamp());

        let filter = BookingDefinition.search_filter(&BookingSearch {
            text: accommodation_id.to_string(),
        });
        assert!(BookingDefinition.matches(&booking, &filter));
    }

    #[rstest]
    fn unknown_status_keyword_matches_nothing(payload: CreateBooking) {
        let booking = BookingDefinition.construct(payload, Uuid::new_v4(), stamp());
        let filter = BookingDefinition.search_filter(&BookingSearch {
            text: "Unknown".to_owned(),
        });
        assert!(!BookingDefinition.matches(&booking, &filter));

        let known = BookingDefinition.search_filter(&BookingSearch {
            text: "Pending".to_owned(),
        });
        assert!(BookingDefinition.matches(&booking, &known));
    }
}
