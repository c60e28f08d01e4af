//! Integration tests for the booking core.
//!
//! These tests walk full reservation lifecycles across the booking engine,
//! the lifecycle manager, and the review gate over one shared store, and
//! verify the no-overlapping-Confirmed invariant under concurrency.

use std::sync::Arc;

use booking::{BookingEngine, BookingError, BookingRequest, LifecycleManager, ReviewGate};
use chrono::{Duration, Utc};
use common::{Money, SpotId, TimeWindow, UserId};
use reservation_store::{InMemoryStore, Reservation, ReservationStatus, ReservationStore, Spot};

fn window(start_hour: i64, end_hour: i64) -> TimeWindow {
    let base = Utc::now() + Duration::days(7);
    TimeWindow::new(
        base + Duration::hours(start_hour),
        base + Duration::hours(end_hour),
    )
}

struct Marketplace {
    store: InMemoryStore,
    engine: BookingEngine<InMemoryStore, InMemoryStore>,
    manager: LifecycleManager<InMemoryStore, InMemoryStore>,
    gate: ReviewGate<InMemoryStore>,
    spot: Spot,
}

/// One spot at $10/hour, $80/day, wired to every service.
async fn marketplace() -> Marketplace {
    let store = InMemoryStore::new();
    let spot = Spot::new(
        SpotId::new(),
        UserId::new(),
        Money::from_dollars(10),
        Money::from_dollars(80),
    );
    store.insert_spot(spot.clone()).await;
    Marketplace {
        engine: BookingEngine::new(store.clone(), store.clone()),
        manager: LifecycleManager::new(store.clone(), store.clone()),
        gate: ReviewGate::new(store.clone()),
        store,
        spot,
    }
}

fn assert_confirmed_pairwise_disjoint(reservations: &[Reservation]) {
    let confirmed: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Confirmed)
        .collect();
    for (i, a) in confirmed.iter().enumerate() {
        for b in &confirmed[i + 1..] {
            assert!(
                a.spot_id != b.spot_id || !a.window.overlaps(&b.window),
                "confirmed reservations {} and {} overlap on spot {}",
                a.id,
                b.id,
                a.spot_id
            );
        }
    }
}

mod reservation_lifecycle {
    use super::*;

    #[tokio::test]
    async fn book_confirm_complete_review() {
        let m = marketplace().await;
        let renter = UserId::new();

        let reservation = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, renter, window(10, 13)))
            .await
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.total_price, Money::from_dollars(30));

        let confirmed = m
            .manager
            .confirm(reservation.id, m.spot.host_id)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        assert!(!m.gate.has_completed_stay(m.spot.id, renter).await.unwrap());
        let completed = m.manager.complete(reservation.id).await.unwrap();
        assert_eq!(completed.status, ReservationStatus::Completed);
        assert!(m.gate.has_completed_stay(m.spot.id, renter).await.unwrap());
    }

    #[tokio::test]
    async fn overlapping_pending_books_but_cannot_confirm() {
        let m = marketplace().await;

        // [10:00, 13:00) at $10/h books for $30 and gets confirmed.
        let first = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), window(10, 13)))
            .await
            .unwrap();
        m.manager.confirm(first.id, m.spot.host_id).await.unwrap();

        // [12:00, 14:00) still books: only Confirmed blocks creation.
        let second = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), window(12, 14)))
            .await
            .unwrap();
        assert_eq!(second.status, ReservationStatus::Pending);

        // But it can never become the second Confirmed holder.
        let result = m.manager.confirm(second.id, m.spot.host_id).await;
        assert!(matches!(result, Err(BookingError::Conflict { .. })));

        let back_to_back = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), window(13, 15)))
            .await
            .unwrap();
        let confirmed = m
            .manager
            .confirm(back_to_back.id, m.spot.host_id)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn full_day_booking_bills_the_day_rate() {
        let m = marketplace().await;
        let start = Utc::now() + Duration::hours(1);
        let day = TimeWindow::new(start, start + Duration::hours(24));

        let reservation = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), day))
            .await
            .unwrap();

        assert_eq!(reservation.total_price, Money::from_dollars(80));
    }

    #[tokio::test]
    async fn cancelled_reservation_frees_the_window() {
        let m = marketplace().await;

        let first = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), window(10, 13)))
            .await
            .unwrap();
        m.manager.confirm(first.id, m.spot.host_id).await.unwrap();
        m.manager
            .cancel(first.id, m.spot.host_id)
            .await
            .unwrap();

        // With the confirmation gone, an overlapping booking can confirm.
        let second = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), window(12, 14)))
            .await
            .unwrap();
        let confirmed = m
            .manager
            .confirm(second.id, m.spot.host_id)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        // The cancelled reservation stays terminal.
        let revive = m.manager.confirm(first.id, m.spot.host_id).await;
        assert!(matches!(
            revive,
            Err(BookingError::InvalidTransition {
                status: ReservationStatus::Cancelled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn listings_follow_renters_and_hosts() {
        let m = marketplace().await;
        let renter = UserId::new();
        let other_spot = Spot::new(
            SpotId::new(),
            UserId::new(),
            Money::from_dollars(5),
            Money::from_dollars(40),
        );
        m.store.insert_spot(other_spot.clone()).await;

        m.engine
            .create_reservation(BookingRequest::new(m.spot.id, renter, window(10, 13)))
            .await
            .unwrap();
        m.engine
            .create_reservation(BookingRequest::new(other_spot.id, renter, window(14, 16)))
            .await
            .unwrap();

        let mine = m.engine.list_by_renter(renter).await.unwrap();
        assert_eq!(mine.len(), 2);

        let hosted = m.engine.list_by_host(m.spot.host_id).await.unwrap();
        assert_eq!(hosted.len(), 1);
        assert_eq!(hosted[0].spot_id, m.spot.id);
    }
}

mod completion_sweep {
    use super::*;

    #[tokio::test]
    async fn sweep_feeds_the_review_gate() {
        let m = marketplace().await;
        let renter = UserId::new();

        let stay = m
            .engine
            .create_reservation(BookingRequest::new(m.spot.id, renter, window(10, 12)))
            .await
            .unwrap();
        m.manager.confirm(stay.id, m.spot.host_id).await.unwrap();

        let before = m
            .manager
            .complete_elapsed(stay.window.end - Duration::minutes(1))
            .await
            .unwrap();
        assert!(before.is_empty());

        let swept = m.manager.complete_elapsed(stay.window.end).await.unwrap();
        assert_eq!(swept.len(), 1);
        assert!(m.gate.has_completed_stay(m.spot.id, renter).await.unwrap());

        // A second sweep finds nothing left to do.
        let again = m.manager.complete_elapsed(stay.window.end).await.unwrap();
        assert!(again.is_empty());
    }
}

mod concurrency {
    use super::*;

    /// Many tasks race to confirm overlapping Pending reservations; at
    /// most one per overlapping cluster may win.
    #[tokio::test(flavor = "multi_thread")]
    async fn racing_confirmations_never_double_book() {
        let m = marketplace().await;
        let manager = Arc::new(LifecycleManager::new(m.store.clone(), m.store.clone()));

        // Ten Pending reservations all overlapping [10:00, 20:00).
        let mut ids = Vec::new();
        for i in 0..10 {
            let reservation = m
                .engine
                .create_reservation(BookingRequest::new(
                    m.spot.id,
                    UserId::new(),
                    window(10 + i, 20),
                ))
                .await
                .unwrap();
            ids.push(reservation.id);
        }

        let mut handles = Vec::new();
        for id in ids.clone() {
            let manager = Arc::clone(&manager);
            let host = m.spot.host_id;
            handles.push(tokio::spawn(
                async move { manager.confirm(id, host).await },
            ));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(confirmed) => {
                    wins += 1;
                    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
                }
                Err(BookingError::Conflict { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1, "exactly one overlapping confirmation may win");

        let all = m.engine.list_by_host(m.spot.host_id).await.unwrap();
        assert_confirmed_pairwise_disjoint(&all);
    }

    /// Interleaved creates and confirms across disjoint and overlapping
    /// windows: whatever the schedule, Confirmed windows stay pairwise
    /// disjoint per spot.
    #[tokio::test(flavor = "multi_thread")]
    async fn arbitrary_interleavings_preserve_the_invariant() {
        let m = marketplace().await;
        let engine = Arc::new(BookingEngine::new(m.store.clone(), m.store.clone()));
        let manager = Arc::new(LifecycleManager::new(m.store.clone(), m.store.clone()));

        let mut handles = Vec::new();
        for i in 0..20 {
            let engine = Arc::clone(&engine);
            let manager = Arc::clone(&manager);
            let spot_id = m.spot.id;
            let host = m.spot.host_id;
            handles.push(tokio::spawn(async move {
                // Windows [2i, 2i+3) so neighbors overlap by an hour.
                let request =
                    BookingRequest::new(spot_id, UserId::new(), window(2 * i, 2 * i + 3));
                if let Ok(reservation) = engine.create_reservation(request).await {
                    let _ = manager.confirm(reservation.id, host).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let all = m.engine.list_by_host(m.spot.host_id).await.unwrap();
        assert_confirmed_pairwise_disjoint(&all);
        assert!(
            all.iter()
                .any(|r| r.status == ReservationStatus::Confirmed),
            "at least one confirmation should have won"
        );
    }

    /// Confirm and cancel race on one reservation; the loser sees
    /// InvalidTransition and the final state is the winner's.
    #[tokio::test(flavor = "multi_thread")]
    async fn confirm_and_cancel_race_has_one_winner() {
        for _ in 0..20 {
            let m = marketplace().await;
            let reservation = m
                .engine
                .create_reservation(BookingRequest::new(m.spot.id, UserId::new(), window(10, 13)))
                .await
                .unwrap();

            let manager_a = Arc::new(LifecycleManager::new(m.store.clone(), m.store.clone()));
            let manager_b = Arc::clone(&manager_a);
            let host = m.spot.host_id;
            let id = reservation.id;

            let confirm = tokio::spawn(async move { manager_a.confirm(id, host).await });
            let cancel = tokio::spawn(async move { manager_b.cancel(id, host).await });

            let confirm_result = confirm.await.unwrap();
            let cancel_result = cancel.await.unwrap();

            let final_status = m.store.get(id).await.unwrap().unwrap().status;
            match (confirm_result, cancel_result) {
                // Cancel from Confirmed is legal, so a confirm winner may
                // still be cancelled afterwards.
                (Ok(_), Ok(_)) => assert_eq!(final_status, ReservationStatus::Cancelled),
                (Ok(_), Err(BookingError::InvalidTransition { .. })) => {
                    assert_eq!(final_status, ReservationStatus::Confirmed)
                }
                (Err(BookingError::InvalidTransition { .. }), Ok(_)) => {
                    assert_eq!(final_status, ReservationStatus::Cancelled)
                }
                (confirm_result, cancel_result) => panic!(
                    "unexpected outcome: confirm={confirm_result:?} cancel={cancel_result:?}"
                ),
            }
        }
    }
}
