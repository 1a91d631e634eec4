//! End-to-end marketplace flows through the public service API.
//!
//! These tests wire real stores, hooks, and the tracing audit sink together
//! the way a deployment would, then walk whole guest/host journeys.

use std::sync::Arc;

use mockable::DefaultClock;
use pagination::ListLimits;

use backend::domain::{
    AccommodationDefinition, AccommodationFilter, AccommodationSearch, Actor, BookingDefinition,
    BookingFilter, BookingService, BookingStatus, CreateAccommodation, CreateBooking,
    CreateReview, EntityService, ErrorCode, ListRequest, NoHooks, PermissionAction,
    PermissionGrant, ResourceKind, ReviewDefinition, ReviewHooks, Role, UpdateBooking, UserId,
    Visibility,
};
use backend::outbound::audit::TracingPermissionAudit;
use backend::outbound::persistence::InMemoryEntityStore;

use chrono::NaiveDate;

type AccommodationStore = InMemoryEntityStore<AccommodationDefinition>;
type BookingStore = InMemoryEntityStore<BookingDefinition>;
type ReviewStore = InMemoryEntityStore<ReviewDefinition>;

struct Marketplace {
    accommodations: EntityService<AccommodationDefinition, AccommodationStore, NoHooks>,
    bookings: BookingService<BookingStore, NoHooks>,
    reviews: EntityService<ReviewDefinition, ReviewStore, ReviewHooks<ReviewStore, AccommodationStore>>,
}

fn marketplace() -> Marketplace {
    let accommodation_store = Arc::new(AccommodationStore::new());
    let booking_store = Arc::new(BookingStore::new());
    let review_store = Arc::new(ReviewStore::new());
    let audit = Arc::new(TracingPermissionAudit);
    let clock = Arc::new(DefaultClock);
    let limits = ListLimits::default();

    Marketplace {
        accommodations: EntityService::new(
            AccommodationDefinition,
            Arc::clone(&accommodation_store),
            NoHooks,
            audit.clone(),
            clock.clone(),
            limits,
        ),
        bookings: EntityService::new(
            BookingDefinition,
            booking_store,
            NoHooks,
            audit.clone(),
            clock.clone(),
            limits,
        ),
        reviews: EntityService::new(
            ReviewDefinition,
            Arc::clone(&review_store),
            ReviewHooks::new(review_store, accommodation_store),
            audit,
            clock,
            limits,
        ),
    }
}

fn host() -> Actor {
    let id = UserId::random();
    Actor::new(id, Role::Host).with_grants([
        PermissionGrant::own(ResourceKind::Accommodation, PermissionAction::Create),
        PermissionGrant::own(ResourceKind::Accommodation, PermissionAction::View),
        PermissionGrant::own(ResourceKind::Accommodation, PermissionAction::Update),
        PermissionGrant::own(ResourceKind::Accommodation, PermissionAction::SoftDelete),
        PermissionGrant::own(ResourceKind::Accommodation, PermissionAction::UpdateVisibility),
    ])
}

fn guest() -> Actor {
    let id = UserId::random();
    Actor::new(id, Role::User).with_grants([
        PermissionGrant::any(ResourceKind::Accommodation, PermissionAction::View),
        PermissionGrant::own(ResourceKind::Booking, PermissionAction::Create),
        PermissionGrant::own(ResourceKind::Booking, PermissionAction::View),
        PermissionGrant::own(ResourceKind::Booking, PermissionAction::Update),
        PermissionGrant::own(ResourceKind::Booking, PermissionAction::SoftDelete),
        PermissionGrant::own(ResourceKind::Review, PermissionAction::Create),
        PermissionGrant::own(ResourceKind::Review, PermissionAction::View),
    ])
}

fn super_admin() -> Actor {
    Actor::new(UserId::random(), Role::SuperAdmin).with_grants([
        PermissionGrant::any(ResourceKind::Accommodation, PermissionAction::View),
        PermissionGrant::any(ResourceKind::Accommodation, PermissionAction::Restore),
        PermissionGrant::any(ResourceKind::Accommodation, PermissionAction::HardDelete),
        PermissionGrant::any(ResourceKind::Booking, PermissionAction::View),
        PermissionGrant::any(ResourceKind::Booking, PermissionAction::HardDelete),
    ])
}

fn listing_payload(host: &Actor, name: &str, slug: &str) -> CreateAccommodation {
    CreateAccommodation {
        host_id: host.id(),
        name: name.to_owned(),
        slug: slug.to_owned(),
        description: "Slate roof, sea view, short walk to the harbour.".to_owned(),
        location: "Port Isaac".to_owned(),
        nightly_rate_cents: 18_500,
        max_guests: 4,
        visibility: Visibility::Published,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}

#[tokio::test]
async fn a_stay_is_booked_reviewed_and_wound_down() {
    let market = marketplace();
    let host = host();
    let guest = guest();

    let listing = market
        .accommodations
        .create(&host, listing_payload(&host, "Harbour Watch", "harbour-watch"))
        .await
        .expect("host lists the property");

    let booking = market
        .bookings
        .create(
            &guest,
            CreateBooking {
                accommodation_id: listing.id(),
                guest_id: guest.id(),
                check_in: date(2026, 10, 2),
                check_out: date(2026, 10, 6),
                guests: 2,
                total_cents: 74_000,
            },
        )
        .await
        .expect("guest books the stay");
    assert_eq!(booking.status(), BookingStatus::Pending);

    let confirmed = market
        .bookings
        .update(
            &guest,
            booking.id(),
            UpdateBooking {
                status: Some(BookingStatus::Confirmed),
                ..UpdateBooking::default()
            },
        )
        .await
        .expect("booking confirms");
    assert_eq!(confirmed.status(), BookingStatus::Confirmed);

    market
        .reviews
        .create(
            &guest,
            CreateReview {
                accommodation_id: listing.id(),
                author_id: guest.id(),
                rating: 5,
                comment: "Perfect harbour views and a spotless kitchen.".to_owned(),
            },
        )
        .await
        .expect("guest reviews the stay");

    let rated = market
        .accommodations
        .get_by_id(&guest, listing.id(), false)
        .await
        .expect("listing still visible");
    assert_eq!(rated.rating().count, 1);
    assert_eq!(rated.rating().average, Some(5.0));

    // Winding down: the host archives the listing, a super admin restores it
    // after a complaint turns out unfounded, then purges the old booking.
    market
        .accommodations
        .soft_delete(&host, listing.id())
        .await
        .expect("host archives the listing");
    let hidden = market
        .accommodations
        .get_by_id(&guest, listing.id(), false)
        .await
        .expect_err("archived listings are invisible");
    assert_eq!(hidden.code(), ErrorCode::Forbidden);

    let admin = super_admin();
    market
        .accommodations
        .restore(&admin, listing.id())
        .await
        .expect("super admin restores the listing");

    market
        .bookings
        .hard_delete(&admin, booking.id())
        .await
        .expect("super admin purges the booking");
    let purged = market
        .bookings
        .get_by_id(&admin, booking.id(), false)
        .await
        .expect_err("booking is gone for good");
    assert_eq!(purged.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn guests_browse_the_published_catalogue() {
    let market = marketplace();
    let host = host();
    let guest = guest();

    market
        .accommodations
        .create(&host, listing_payload(&host, "Harbour Watch", "harbour-watch"))
        .await
        .expect("create succeeds");
    let mut hidden = listing_payload(&host, "Chandlery Loft", "chandlery-loft");
    hidden.visibility = Visibility::Hidden;
    market
        .accommodations
        .create(&host, hidden)
        .await
        .expect("create succeeds");

    let page = market
        .accommodations
        .list(
            &guest,
            AccommodationFilter {
                visibility: Some(Visibility::Published),
                ..AccommodationFilter::default()
            },
            &ListRequest::first_page(),
        )
        .await
        .expect("catalogue lists");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name(), "Harbour Watch");

    let searched = market
        .accommodations
        .search(
            &guest,
            &AccommodationSearch {
                text: "harbour".to_owned(),
                filter: AccommodationFilter {
                    visibility: Some(Visibility::Published),
                    ..AccommodationFilter::default()
                },
            },
            &ListRequest::first_page(),
        )
        .await
        .expect("catalogue searches");
    assert_eq!(searched.items.len(), 1);

    let nothing = market
        .accommodations
        .search(
            &guest,
            &AccommodationSearch {
                text: "alpine chalet".to_owned(),
                filter: AccommodationFilter::default(),
            },
            &ListRequest::first_page(),
        )
        .await
        .expect("empty search is data, not an error");
    assert!(nothing.items.is_empty());
    assert_eq!(nothing.total, 0);
}

#[tokio::test]
async fn bookings_stay_private_to_their_guests() {
    let market = marketplace();
    let host = host();
    let alice = guest();
    let bob = guest();

    let listing = market
        .accommodations
        .create(&host, listing_payload(&host, "Harbour Watch", "harbour-watch"))
        .await
        .expect("create succeeds");

    for (who, from, to) in [
        (&alice, date(2026, 10, 2), date(2026, 10, 6)),
        (&bob, date(2026, 11, 1), date(2026, 11, 4)),
    ] {
        market
            .bookings
            .create(
                who,
                CreateBooking {
                    accommodation_id: listing.id(),
                    guest_id: who.id(),
                    check_in: from,
                    check_out: to,
                    guests: 2,
                    total_cents: 55_500,
                },
            )
            .await
            .expect("booking succeeds");
    }

    let mine = market
        .bookings
        .list(&alice, BookingFilter::default(), &ListRequest::first_page())
        .await
        .expect("list succeeds");
    assert_eq!(mine.total, 2, "the backing query matched both bookings");
    assert_eq!(mine.items.len(), 1, "only Alice's booking is visible to her");
    assert_eq!(mine.items[0].guest_id(), alice.id());
}
