//! Guest reviews and the hooks that maintain accommodation rating
//! aggregates.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::PageWindow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::EntityStore;
use crate::domain::{
    Accommodation, AccommodationFilter, Actor, AuditStamp, AuditTrail, AuditedEntity,
    DomainError, EntityDefinition, EntityService, FieldViolations, HookError, LifecycleHooks,
    RatingSummary, ResourceKind, UserId,
};

/// Maximum accepted length for a review comment.
pub const COMMENT_MAX: usize = 2000;

/// Star ratings run from one to five inclusive.
pub const RATING_MIN: u8 = 1;
/// Star ratings run from one to five inclusive.
pub const RATING_MAX: u8 = 5;

/// A guest's feedback on an accommodation.
///
/// ## Invariants
/// - `rating` lies in `RATING_MIN..=RATING_MAX`.
/// - `comment` is non-blank and at most [`COMMENT_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    id: Uuid,
    accommodation_id: Uuid,
    author_id: UserId,
    rating: u8,
    comment: String,
    audit: AuditTrail,
}

impl Review {
    /// Stable record identifier.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Accommodation the review refers to.
    pub const fn accommodation_id(&self) -> Uuid {
        self.accommodation_id
    }

    /// Guest that wrote the review.
    pub const fn author_id(&self) -> UserId {
        self.author_id
    }

    /// Star rating.
    pub const fn rating(&self) -> u8 {
        self.rating
    }

    /// Free-text comment.
    pub fn comment(&self) -> &str {
        self.comment.as_str()
    }
}

impl AuditedEntity for Review {
    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.author_id)
    }

    fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditTrail {
        &mut self.audit
    }
}

/// Payload accepted when reviewing an accommodation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    /// Accommodation being reviewed.
    pub accommodation_id: Uuid,
    /// Guest writing the review.
    pub author_id: UserId,
    /// Star rating.
    pub rating: u8,
    /// Free-text comment.
    pub comment: String,
}

/// Partial update for a review; absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReview {
    /// Replacement star rating.
    #[serde(default)]
    pub rating: Option<u8>,
    /// Replacement comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Structured filter over reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilter {
    /// Restrict to one accommodation's reviews.
    #[serde(default)]
    pub accommodation_id: Option<Uuid>,
    /// Restrict to one author's reviews.
    #[serde(default)]
    pub author_id: Option<UserId>,
    /// Keep only ratings at or above this value.
    #[serde(default)]
    pub min_rating: Option<u8>,
    /// Case-insensitive text match over the comment.
    #[serde(default)]
    pub text: Option<String>,
}

/// Free-text review search over comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSearch {
    /// Text matched over comments.
    pub text: String,
    /// Additional structured constraints.
    #[serde(default)]
    pub filter: ReviewFilter,
}

/// Capability set wiring reviews into the orchestrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReviewDefinition;

impl EntityDefinition for ReviewDefinition {
    type Entity = Review;
    type CreatePayload = CreateReview;
    type UpdatePayload = UpdateReview;
    type Filter = ReviewFilter;
    type SearchQuery = ReviewSearch;

    const RESOURCE: ResourceKind = ResourceKind::Review;

    fn validate_create(&self, payload: &CreateReview) -> Result<(), FieldViolations> {
        let mut violations = FieldViolations::new();
        check_rating(&mut violations, payload.rating);
        check_comment(&mut violations, &payload.comment);
        violations.into_result()
    }

    fn validate_update(&self, payload: &UpdateReview) -> Result<(), FieldViolations> {
        let mut violations = FieldViolations::new();
        if let Some(rating) = payload.rating {
            check_rating(&mut violations, rating);
        }
        if let Some(comment) = payload.comment.as_deref() {
            check_comment(&mut violations, comment);
        }
        violations.into_result()
    }

    fn create_owner(&self, payload: &CreateReview) -> Option<UserId> {
        Some(payload.author_id)
    }

    fn construct(&self, payload: CreateReview, id: Uuid, created: AuditStamp) -> Review {
        Review {
            id,
            accommodation_id: payload.accommodation_id,
            author_id: payload.author_id,
            rating: payload.rating,
            comment: payload.comment,
            audit: AuditTrail::new(created),
        }
    }

    fn apply_update(&self, entity: &mut Review, payload: UpdateReview) {
        if let Some(rating) = payload.rating {
            entity.rating = rating;
        }
        if let Some(comment) = payload.comment {
            entity.comment = comment;
        }
    }

    fn search_filter(&self, query: &ReviewSearch) -> ReviewFilter {
        let mut filter = query.filter.clone();
        let text = query.text.trim();
        if !text.is_empty() {
            filter.text = Some(text.to_owned());
        }
        filter
    }

    fn matches(&self, entity: &Review, filter: &ReviewFilter) -> bool {
        if filter
            .accommodation_id
            .is_some_and(|id| id != entity.accommodation_id)
        {
            return false;
        }
        if filter
            .author_id
            .is_some_and(|author| author != entity.author_id)
        {
            return false;
        }
        if filter.min_rating.is_some_and(|min| entity.rating < min) {
            return false;
        }
        if let Some(text) = filter.text.as_deref()
            && !entity
                .comment
                .to_lowercase()
                .contains(&text.to_lowercase())
        {
            return false;
        }
        true
    }
}

fn check_rating(violations: &mut FieldViolations, rating: u8) {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        violations.push(
            "rating",
            format!("must be between {RATING_MIN} and {RATING_MAX}"),
        );
    }
}

fn check_comment(violations: &mut FieldViolations, comment: &str) {
    if comment.trim().is_empty() {
        violations.push("comment", "must not be blank");
    } else if comment.chars().count() > COMMENT_MAX {
        violations.push(
            "comment",
            format!("must be at most {COMMENT_MAX} characters"),
        );
    }
}

/// Lifecycle hooks keeping the parent accommodation's rating aggregate in
/// step with its set of active reviews.
///
/// The recomputation scope is exactly the one affected accommodation; a
/// missing parent fails the operation instead of being skipped.
pub struct ReviewHooks<RS, AS> {
    reviews: Arc<RS>,
    accommodations: Arc<AS>,
}

impl<RS, AS> Clone for ReviewHooks<RS, AS> {
    fn clone(&self) -> Self {
        Self {
            reviews: Arc::clone(&self.reviews),
            accommodations: Arc::clone(&self.accommodations),
        }
    }
}

impl<RS, AS> ReviewHooks<RS, AS> {
    /// Build hooks over the review and accommodation stores.
    pub fn new(reviews: Arc<RS>, accommodations: Arc<AS>) -> Self {
        Self {
            reviews,
            accommodations,
        }
    }
}

impl<RS, AS> ReviewHooks<RS, AS>
where
    RS: EntityStore<Entity = Review, Filter = ReviewFilter>,
    AS: EntityStore<Entity = Accommodation, Filter = AccommodationFilter>,
{
    async fn recompute_rating(&self, accommodation_id: Uuid) -> Result<(), HookError> {
        let listing = self
            .accommodations
            .find_by_id(accommodation_id)
            .await?
            .ok_or_else(|| {
                HookError::failed(format!(
                    "accommodation {accommodation_id} missing during rating recompute"
                ))
            })?;

        let filter = ReviewFilter {
            accommodation_id: Some(accommodation_id),
            ..ReviewFilter::default()
        };
        let window = PageWindow {
            offset: 0,
            limit: u32::MAX,
        };
        let active = self.reviews.find_all(&filter, window, false).await?;
        let ratings: Vec<u8> = active.iter().map(Review::rating).collect();

        let mut updated = listing;
        updated.apply_rating(RatingSummary::from_ratings(&ratings));
        self.accommodations.update(&updated).await?;
        Ok(())
    }
}

#[async_trait]
impl<RS, AS> LifecycleHooks<ReviewDefinition> for ReviewHooks<RS, AS>
where
    RS: EntityStore<Entity = Review, Filter = ReviewFilter>,
    AS: EntityStore<Entity = Accommodation, Filter = AccommodationFilter>,
{
    async fn before_create(&self, _actor: &Actor, review: &mut Review) -> Result<(), HookError> {
        let listing = self
            .accommodations
            .find_by_id(review.accommodation_id())
            .await?;
        match listing {
            Some(listing) if !listing.is_archived() => Ok(()),
            _ => Err(HookError::Domain(DomainError::validation(format!(
                "accommodation {} does not accept reviews",
                review.accommodation_id()
            )))),
        }
    }

    async fn after_create(&self, _actor: &Actor, review: &Review) -> Result<(), HookError> {
        self.recompute_rating(review.accommodation_id()).await
    }

    async fn after_update(&self, _actor: &Actor, review: &Review) -> Result<(), HookError> {
        self.recompute_rating(review.accommodation_id()).await
    }

    async fn after_soft_delete(&self, _actor: &Actor, review: &Review) -> Result<(), HookError> {
        self.recompute_rating(review.accommodation_id()).await
    }

    async fn after_restore(&self, _actor: &Actor, review: &Review) -> Result<(), HookError> {
        self.recompute_rating(review.accommodation_id()).await
    }

    async fn after_hard_delete(&self, _actor: &Actor, review: &Review) -> Result<(), HookError> {
        self.recompute_rating(review.accommodation_id()).await
    }
}

/// Orchestrated service over reviews.
pub type ReviewService<S, H> = EntityService<ReviewDefinition, S, H>;

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
