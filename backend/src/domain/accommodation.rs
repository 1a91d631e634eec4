//! Accommodation catalogue entries and their capability set.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::EntityStore;
use crate::domain::{
    Actor, AuditStamp, AuditTrail, AuditedEntity, EntityDefinition, EntityService,
    FieldViolations, LifecycleHooks, PermissionAction, ResourceKind, ServiceResult, UserId,
};

/// Maximum accepted length for an accommodation name.
pub const NAME_MAX: usize = 120;
/// Maximum accepted length for an accommodation slug.
pub const SLUG_MAX: usize = 64;
/// Maximum accepted length for an accommodation description.
pub const DESCRIPTION_MAX: usize = 4000;

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_regex() -> &'static Regex {
    SLUG_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed shape.
        let pattern = "^[a-z0-9]+(-[a-z0-9]+)*$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("slug regex failed to compile: {error}"))
    })
}

/// Whether an accommodation appears in the public catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Listed publicly.
    Published,
    /// Hidden from the catalogue; new listings start here.
    #[default]
    Hidden,
}

/// Denormalised review aggregate maintained by review lifecycle hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating over active reviews, absent while there are none.
    pub average: Option<f64>,
    /// Number of active reviews.
    pub count: u32,
}

impl RatingSummary {
    /// Aggregate for an accommodation without reviews.
    pub const fn empty() -> Self {
        Self {
            average: None,
            count: 0,
        }
    }

    /// Compute the aggregate from a set of star ratings.
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self::empty();
        }
        let count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
        let sum: u32 = ratings.iter().map(|rating| u32::from(*rating)).sum();
        Self {
            average: Some(f64::from(sum) / f64::from(count)),
            count,
        }
    }
}

/// A rentable property listed by a host.
///
/// ## Invariants
/// - Field constraints are enforced by [`AccommodationDefinition`] before
///   construction; the struct itself stores validated data only.
/// - `rating` mirrors the set of active reviews and is maintained by review
///   lifecycle hooks, never written directly by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    id: Uuid,
    host_id: UserId,
    name: String,
    slug: String,
    description: String,
    location: String,
    nightly_rate_cents: i64,
    max_guests: u32,
    visibility: Visibility,
    rating: RatingSummary,
    audit: AuditTrail,
}

impl Accommodation {
    /// Stable record identifier.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Host that owns the listing.
    pub const fn host_id(&self) -> UserId {
        self.host_id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// URL-safe identifier.
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Long-form description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Free-form location label.
    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Price per night in minor currency units.
    pub const fn nightly_rate_cents(&self) -> i64 {
        self.nightly_rate_cents
    }

    /// Largest party the listing accepts.
    pub const fn max_guests(&self) -> u32 {
        self.max_guests
    }

    /// Catalogue visibility.
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Denormalised review aggregate.
    pub const fn rating(&self) -> RatingSummary {
        self.rating
    }

    pub(crate) fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub(crate) fn apply_rating(&mut self, rating: RatingSummary) {
        self.rating = rating;
    }
}

impl AuditedEntity for Accommodation {
    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.host_id)
    }

    fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditTrail {
        &mut self.audit
    }
}

/// Payload accepted when listing a new accommodation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccommodation {
    /// Host that will own the listing.
    pub host_id: UserId,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Free-form location label.
    pub location: String,
    /// Price per night in minor currency units.
    pub nightly_rate_cents: i64,
    /// Largest party the listing accepts.
    pub max_guests: u32,
    /// Initial catalogue visibility; defaults to hidden.
    #[serde(default)]
    pub visibility: Visibility,
}

/// Partial update for an accommodation; absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccommodation {
    /// Replacement display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement location label.
    #[serde(default)]
    pub location: Option<String>,
    /// Replacement nightly rate.
    #[serde(default)]
    pub nightly_rate_cents: Option<i64>,
    /// Replacement guest capacity.
    #[serde(default)]
    pub max_guests: Option<u32>,
}

/// Structured filter over accommodations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationFilter {
    /// Restrict to one host's listings.
    #[serde(default)]
    pub host_id: Option<UserId>,
    /// Restrict to one visibility state.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Case-insensitive substring match on the location label.
    #[serde(default)]
    pub location_contains: Option<String>,
    /// Minimum guest capacity.
    #[serde(default)]
    pub min_guests: Option<u32>,
    /// Case-insensitive text match over name and description.
    #[serde(default)]
    pub text: Option<String>,
}

/// Free-text catalogue search with an optional structured filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationSearch {
    /// Text matched over name and description.
    pub text: String,
    /// Additional structured constraints.
    #[serde(default)]
    pub filter: AccommodationFilter,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Capability set wiring accommodations into the orchestrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccommodationDefinition;

impl EntityDefinition for AccommodationDefinition {
    type Entity = Accommodation;
    type CreatePayload = CreateAccommodation;
    type UpdatePayload = UpdateAccommodation;
    type Filter = AccommodationFilter;
    type SearchQuery = AccommodationSearch;

    const RESOURCE: ResourceKind = ResourceKind::Accommodation;

    fn validate_create(&self, payload: &CreateAccommodation) -> Result<(), FieldViolations> {
        let mut violations = FieldViolations::new();
        check_name(&mut violations, &payload.name);
        check_slug(&mut violations, &payload.slug);
        check_description(&mut violations, &payload.description);
        check_location(&mut violations, &payload.location);
        check_rate(&mut violations, payload.nightly_rate_cents);
        check_guests(&mut violations, payload.max_guests);
        violations.into_result()
    }

    fn validate_update(&self, payload: &UpdateAccommodation) -> Result<(), FieldViolations> {
        let mut violations = FieldViolations::new();
        if let Some(name) = payload.name.as_deref() {
            check_name(&mut violations, name);
        }
        if let Some(description) = payload.description.as_deref() {
            check_description(&mut violations, description);
        }
        if let Some(location) = payload.location.as_deref() {
            check_location(&mut violations, location);
        }
        if let Some(rate) = payload.nightly_rate_cents {
            check_rate(&mut violations, rate);
        }
        if let Some(guests) = payload.max_guests {
            check_guests(&mut violations, guests);
        }
        violations.into_result()
    }

    fn create_owner(&self, payload: &CreateAccommodation) -> Option<UserId> {
        Some(payload.host_id)
    }

    fn construct(
        &self,
        payload: CreateAccommodation,
        id: Uuid,
        created: AuditStamp,
    ) -> Accommodation {
        Accommodation {
            id,
            host_id: payload.host_id,
            name: payload.name,
            slug: payload.slug,
            description: payload.description,
            location: payload.location,
            nightly_rate_cents: payload.nightly_rate_cents,
            max_guests: payload.max_guests,
            visibility: payload.visibility,
            rating: RatingSummary::empty(),
            audit: AuditTrail::new(created),
        }
    }

    fn apply_update(&self, entity: &mut Accommodation, payload: UpdateAccommodation) {
        if let Some(name) = payload.name {
            entity.name = name;
        }
        if let Some(description) = payload.description {
            entity.description = description;
        }
        if let Some(location) = payload.location {
            entity.location = location;
        }
        if let Some(rate) = payload.nightly_rate_cents {
            entity.nightly_rate_cents = rate;
        }
        if let Some(guests) = payload.max_guests {
            entity.max_guests = guests;
        }
    }

    fn search_filter(&self, query: &AccommodationSearch) -> AccommodationFilter {
        let mut filter = query.filter.clone();
        let text = query.text.trim();
        if !text.is_empty() {
            filter.text = Some(text.to_owned());
        }
        filter
    }

    fn matches(&self, entity: &Accommodation, filter: &AccommodationFilter) -> bool {
        if filter.host_id.is_some_and(|host| host != entity.host_id) {
            return false;
        }
        if filter
            .visibility
            .is_some_and(|visibility| visibility != entity.visibility)
        {
            return false;
        }
        if let Some(location) = filter.location_contains.as_deref()
            && !contains_ignore_case(&entity.location, location)
        {
            return false;
        }
        if filter.min_guests.is_some_and(|min| entity.max_guests < min) {
            return false;
        }
        if let Some(text) = filter.text.as_deref()
            && !contains_ignore_case(&entity.name, text)
            && !contains_ignore_case(&entity.description, text)
        {
            return false;
        }
        true
    }
}

fn check_name(violations: &mut FieldViolations, name: &str) {
    if name.trim().is_empty() {
        violations.push("name", "must not be blank");
    } else if name.chars().count() > NAME_MAX {
        violations.push("name", format!("must be at most {NAME_MAX} characters"));
    }
}

fn check_slug(violations: &mut FieldViolations, slug: &str) {
    if slug.is_empty() {
        violations.push("slug", "must not be blank");
    } else if slug.chars().count() > SLUG_MAX {
        violations.push("slug", format!("must be at most {SLUG_MAX} characters"));
    } else if !slug_regex().is_match(slug) {
        violations.push(
            "slug",
            "must be lowercase letters, digits, and single hyphens",
        );
    }
}

fn check_description(violations: &mut FieldViolations, description: &str) {
    if description.chars().count() > DESCRIPTION_MAX {
        violations.push(
            "description",
            format!("must be at most {DESCRIPTION_MAX} characters"),
        );
    }
}

fn check_location(violations: &mut FieldViolations, location: &str) {
    if location.trim().is_empty() {
        violations.push("location", "must not be blank");
    }
}

fn check_rate(violations: &mut FieldViolations, rate: i64) {
    if rate <= 0 {
        violations.push("nightlyRateCents", "must be positive");
    }
}

fn check_guests(violations: &mut FieldViolations, guests: u32) {
    if guests == 0 {
        violations.push("maxGuests", "must be at least 1");
    }
}

/// Orchestrated service over accommodations.
pub type AccommodationService<S, H> = EntityService<AccommodationDefinition, S, H>;

impl<S, H> EntityService<AccommodationDefinition, S, H>
where
    S: EntityStore<Entity = Accommodation, Filter = AccommodationFilter>,
    H: LifecycleHooks<AccommodationDefinition>,
{
    /// Toggle catalogue visibility under the dedicated permission action.
    pub async fn set_visibility(
        &self,
        actor: &Actor,
        id: Uuid,
        visibility: Visibility,
    ) -> ServiceResult<Accommodation> {
        self.update_with(actor, id, PermissionAction::UpdateVisibility, |listing| {
            listing.set_visibility(visibility);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn payload() -> CreateAccommodation {
        CreateAccommodation {
            host_id: UserId::random(),
            name: "Mossy Owl Cabin".to_owned(),
            slug: "mossy-owl-cabin".to_owned(),
            description: "A quiet cabin at the forest edge.".to_owned(),
            location: "Black Forest".to_owned(),
            nightly_rate_cents: 12_500,
            max_guests: 4,
            visibility: Visibility::Published,
        }
    }

    fn stamp() -> AuditStamp {
        AuditStamp::new(Utc::now(), UserId::random())
    }

    #[rstest]
    fn valid_payload_passes(payload: CreateAccommodation) {
        assert!(AccommodationDefinition.validate_create(&payload).is_ok());
    }

    #[rstest]
    #[case::blank_name(|p: &mut CreateAccommodation| p.name = "  ".to_owned(), "name")]
    #[case::bad_slug(|p: &mut CreateAccommodation| p.slug = "Mossy Owl".to_owned(), "slug")]
    #[case::blank_location(|p: &mut CreateAccommodation| p.location = String::new(), "location")]
    #[case::free_stay(|p: &mut CreateAccommodation| p.nightly_rate_cents = 0, "nightlyRateCents")]
    #[case::no_guests(|p: &mut CreateAccommodation| p.max_guests = 0, "maxGuests")]
    fn invalid_payloads_report_the_field(
        mut payload: CreateAccommodation,
        #[case] mutate: fn(&mut CreateAccommodation),
        #[case] field: &str,
    ) {
        mutate(&mut payload);
        let violations = AccommodationDefinition
            .validate_create(&payload)
            .expect_err("payload rejected");
        assert!(
            violations
                .as_slice()
                .iter()
                .any(|violation| violation.field == field),
            "expected a violation on {field}"
        );
    }

    #[rstest]
    fn validation_aggregates_all_violations(mut payload: CreateAccommodation) {
        payload.name = String::new();
        payload.slug = "UPPER".to_owned();
        payload.max_guests = 0;
        let violations = AccommodationDefinition
            .validate_create(&payload)
            .expect_err("payload rejected");
        assert_eq!(violations.as_slice().len(), 3);
    }

    #[rstest]
    fn construct_starts_active_with_empty_rating(payload: CreateAccommodation) {
        let listing = AccommodationDefinition.construct(payload, Uuid::new_v4(), stamp());
        assert!(!listing.is_archived());
        assert_eq!(listing.rating(), RatingSummary::empty());
    }

    #[rstest]
    fn apply_update_touches_only_provided_fields(payload: CreateAccommodation) {
        let mut listing = AccommodationDefinition.construct(payload, Uuid::new_v4(), stamp());
        let original_location = listing.location().to_owned();

        AccommodationDefinition.apply_update(
            &mut listing,
            UpdateAccommodation {
                name: Some("Mossy Owl Lodge".to_owned()),
                nightly_rate_cents: Some(15_000),
                ..UpdateAccommodation::default()
            },
        );

        assert_eq!(listing.name(), "Mossy Owl Lodge");
        assert_eq!(listing.nightly_rate_cents(), 15_000);
        assert_eq!(listing.location(), original_location);
    }

    #[rstest]
    fn filter_matches_on_text_and_capacity(payload: CreateAccommodation) {
        let listing = AccommodationDefinition.construct(payload, Uuid::new_v4(), stamp());

        let hit = AccommodationFilter {
            text: Some("quiet CABIN".to_owned()),
            min_guests: Some(3),
            ..AccommodationFilter::default()
        };
        assert!(AccommodationDefinition.matches(&listing, &hit));

        let miss = AccommodationFilter {
            min_guests: Some(9),
            ..AccommodationFilter::default()
        };
        assert!(!AccommodationDefinition.matches(&listing, &miss));
    }

    #[rstest]
    fn search_filter_merges_text_into_structured_filter(payload: CreateAccommodation) {
        let query = AccommodationSearch {
            text: "  owl  ".to_owned(),
            filter: AccommodationFilter {
                visibility: Some(Visibility::Published),
                ..AccommodationFilter::default()
            },
        };
        let filter = AccommodationDefinition.search_filter(&query);
        assert_eq!(filter.text.as_deref(), Some("owl"));
        assert_eq!(filter.visibility, Some(Visibility::Published));

        let listing = AccommodationDefinition.construct(payload, Uuid::new_v4(), stamp());
        assert!(AccommodationDefinition.matches(&listing, &filter));
    }

    #[rstest]
    fn rating_summary_averages_active_ratings() {
        let summary = RatingSummary::from_ratings(&[5, 4, 3]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.0));
        assert_eq!(RatingSummary::from_ratings(&[]), RatingSummary::empty());
    }
}
