//! Concurrent registrations racing for the same identity.

mod common;

use common::GatewayHarness;
use futures::future::join_all;
use rollcall_core::{IdentityField, RegistrationError};
use rollcall_core::Clock;
use rollcall_gateway::{MutationGateway, UserFilter};
use rollcall_rules::{MinimumAge, RuleEngine};
use rollcall_test::{numbered_candidate, test_candidate_with, test_clock};
use std::sync::Arc;

/// A gateway whose rules never look at email or username, so only the
/// store's unique indexes stand between two registrations.
fn index_only_gateway() -> MutationGateway {
    MutationGateway::builder()
        .clock(test_clock() as Arc<dyn Clock>)
        .rules(RuleEngine::empty().with_rule(MinimumAge { years: 13 }))
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_email_race_admits_exactly_one() {
    let h = GatewayHarness::new();
    let a = h.gateway.clone();
    let b = h.gateway.clone();

    let (first, second) = tokio::join!(
        tokio::spawn(async move {
            a.create(test_candidate_with("race@example.com", "racer_a"))
                .await
        }),
        tokio::spawn(async move {
            b.create(test_candidate_with("race@example.com", "racer_b"))
                .await
        }),
    );
    let results = [first.unwrap(), second.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(
        *loser,
        RegistrationError::DuplicateIdentity {
            field: IdentityField::Email
        }
    );

    assert_eq!(
        h.gateway
            .query(UserFilter::email("race@example.com"))
            .await
            .len(),
        1
    );
    assert_eq!(h.gateway.audit_trail().count().await, 1);
}

#[tokio::test]
async fn unique_index_alone_rejects_repeated_email() {
    let gw = index_only_gateway();
    gw.create(test_candidate_with("dup@example.com", "first"))
        .await
        .unwrap();

    let err = gw
        .create(test_candidate_with("dup@example.com", "second"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RegistrationError::DuplicateIdentity {
            field: IdentityField::Email
        }
    );
    assert_eq!(gw.query(UserFilter::email("dup@example.com")).await.len(), 1);
    assert_eq!(gw.database().user_count().await, 1);
    assert_eq!(gw.audit_trail().count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unique_index_alone_settles_email_race() {
    let gw = index_only_gateway();

    let tasks = (0..8).map(|n| {
        let gw = gw.clone();
        tokio::spawn(async move {
            gw.create(test_candidate_with("dup@example.com", format!("racer{n}")))
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| {
        *e == RegistrationError::DuplicateIdentity {
            field: IdentityField::Email,
        }
    }));
    assert_eq!(gw.query(UserFilter::Live).await.len(), 1);
    assert_eq!(gw.audit_trail().count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_way_username_race() {
    let h = GatewayHarness::new();

    let tasks = (0..16).map(|n| {
        let gw = h.gateway.clone();
        tokio::spawn(async move {
            gw.create(test_candidate_with(format!("racer{n}@example.com"), "contested"))
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| {
        *e == RegistrationError::DuplicateIdentity {
            field: IdentityField::Username,
        }
    }));
    assert_eq!(h.gateway.query(UserFilter::Live).await.len(), 1);
    assert_eq!(h.gateway.audit_trail().count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_registrations_all_commit() {
    let h = GatewayHarness::new();

    let tasks = (0..32).map(|n| {
        let gw = h.gateway.clone();
        tokio::spawn(async move { gw.create(numbered_candidate(n)).await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(h.gateway.query(UserFilter::Live).await.len(), 32);
    assert_eq!(h.gateway.audit_trail().count().await, 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn toggling_during_traffic_keeps_entries_consistent() {
    let h = GatewayHarness::new();

    let toggler = {
        let gw = h.gateway.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                gw.set_audit_capture(false);
                tokio::task::yield_now().await;
                gw.set_audit_capture(true);
                tokio::task::yield_now().await;
            }
        })
    };
    let writers = (0..32).map(|n| {
        let gw = h.gateway.clone();
        tokio::spawn(async move { gw.create(numbered_candidate(n)).await })
    });
    let created: Vec<_> = join_all(writers)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    toggler.await.unwrap();

    // Each committed create has zero or one entry, never more.
    let trail = h.gateway.audit_trail();
    let mut recorded = 0_usize;
    for user in &created {
        let count = trail.count_for(user.id).await;
        assert!(count <= 1);
        recorded = recorded.saturating_add(count);
    }
    assert_eq!(trail.count().await, recorded);
    assert!(h.gateway.audit_capture_enabled());
}
