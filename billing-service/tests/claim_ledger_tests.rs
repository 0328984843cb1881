mod common;

use billing_service::{BillingError, OrderRef, PayerContext, SettlementStore};
use common::{plan_with, scripted_engine, Fixture};
use config_engine::SettlementConfig;
use insurance_service::{
    CategoryCoverage, ClaimRequest, ClaimStatus, ClaimTx, ClaimType, CoveragePlan, Encounter, InsuranceError,
    ServiceCategory,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn generous_plan() -> CoveragePlan {
    CoveragePlan::new(Uuid::new_v4(), "Gold")
        .with_rule(ServiceCategory::Consultation, CategoryCoverage::all(dec!(70)))
        .with_rule(ServiceCategory::Drug, CategoryCoverage::all(dec!(70)))
        .with_rule(ServiceCategory::Laboratory, CategoryCoverage::all(dec!(50)))
}

async fn insured_fixture() -> Fixture {
    let fx = Fixture::new();
    fx.insure(generous_plan()).await;
    fx.fund_wallet(dec!(10000.00)).await;
    fx
}

/// Settle an order and return the id of the claim it raised
async fn claim_for(fx: &Fixture, order: OrderRef) -> Uuid {
    fx.engine
        .settle_new(order, fx.actor)
        .await
        .unwrap()
        .claim
        .expect("order should be claimed")
        .id
}

#[tokio::test]
async fn test_full_approval() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Drug, fx.patient, dec!(100.00))).await;

    let claim = fx
        .adjudication
        .approve(claim_id, dec!(100.00), fx.actor, None)
        .await
        .unwrap();

    assert_eq!(claim.status, ClaimStatus::Approved);
    assert_eq!(claim.approved_amount, Some(dec!(100.00)));
    assert_eq!(claim.covered_amount, dec!(100.00));
    assert_eq!(claim.patient_amount, Decimal::ZERO);
    assert_eq!(claim.processed_by, Some(fx.actor));
    assert!(claim.processed_date.is_some());
}

#[tokio::test]
async fn test_partial_approval_keeps_amounts_balanced() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Drug, fx.patient, dec!(100.00))).await;

    fx.adjudication.start_processing(claim_id).await.unwrap();
    let claim = fx
        .adjudication
        .approve(claim_id, dec!(45.55), fx.actor, Some("tariff ceiling".to_string()))
        .await
        .unwrap();

    assert_eq!(claim.status, ClaimStatus::PartiallyApproved);
    assert_eq!(claim.covered_amount, dec!(45.55));
    assert_eq!(claim.patient_amount, dec!(54.45));
    assert!(claim.is_balanced());
}

#[tokio::test]
async fn test_approval_above_total_is_refused() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Drug, fx.patient, dec!(100.00))).await;

    let err = fx
        .adjudication
        .approve(claim_id, dec!(100.01), fx.actor, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Insurance(InsuranceError::InvalidAmount(_))));

    let stored = fx.store.claim(claim_id).await.unwrap();
    assert_eq!(stored.status, ClaimStatus::Pending);
    assert_eq!(stored.covered_amount, dec!(70.00));
}

#[tokio::test]
async fn test_rejection_moves_everything_to_patient() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Drug, fx.patient, dec!(100.00))).await;

    let claim = fx
        .adjudication
        .reject(claim_id, fx.actor, "policy lapsed, call 555-123-4567")
        .await
        .unwrap();

    assert_eq!(claim.status, ClaimStatus::Rejected);
    assert_eq!(claim.covered_amount, dec!(0.00));
    assert_eq!(claim.patient_amount, dec!(100.00));
    assert!(claim.is_balanced());

    let err = fx
        .adjudication
        .approve(claim_id, dec!(10.00), fx.actor, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Insurance(InsuranceError::InvalidState { status: ClaimStatus::Rejected, .. })
    ));
}

#[tokio::test]
async fn test_paid_only_after_approval_and_only_once() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Laboratory, fx.patient, dec!(60.00))).await;

    let err = fx.adjudication.mark_paid(claim_id).await.unwrap_err();
    assert!(matches!(err, BillingError::Insurance(InsuranceError::InvalidState { .. })));

    fx.adjudication
        .approve(claim_id, dec!(30.00), fx.actor, None)
        .await
        .unwrap();
    let paid = fx.adjudication.mark_paid(claim_id).await.unwrap();
    assert_eq!(paid.status, ClaimStatus::Paid);
    assert!(paid.paid_date.is_some());

    let err = fx.adjudication.mark_paid(claim_id).await.unwrap_err();
    assert!(matches!(
        err,
        BillingError::Insurance(InsuranceError::InvalidState { status: ClaimStatus::Paid, .. })
    ));
}

#[tokio::test]
async fn test_encounter_summary_tracks_its_claims() {
    let fx = insured_fixture().await;
    let consultation = Uuid::new_v4();

    let drug = claim_for(
        &fx,
        OrderRef::new(ClaimType::Drug, fx.patient, dec!(100.00)).in_consultation(consultation),
    )
    .await;
    claim_for(
        &fx,
        OrderRef::new(ClaimType::Laboratory, fx.patient, dec!(40.00)).in_consultation(consultation),
    )
    .await;

    let summaries = fx.store.summaries().await;
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.encounter, Encounter::Consultation(consultation));
    assert_eq!(summary.claim_count, 2);
    assert_eq!(summary.total_amount, dec!(140.00));
    assert_eq!(summary.covered_amount, dec!(90.00));
    assert_eq!(summary.patient_amount, dec!(50.00));

    fx.adjudication.reject(drug, fx.actor, "duplicate").await.unwrap();
    let summary = fx.store.summaries().await.remove(0);
    assert_eq!(summary.covered_amount, dec!(20.00));
    assert_eq!(summary.patient_amount, dec!(120.00));
}

#[tokio::test]
async fn test_attach_to_summary_is_idempotent() {
    let fx = insured_fixture().await;
    let admission = fx.admit(dec!(1000.00)).await;
    let claim_id = claim_for(
        &fx,
        OrderRef::new(ClaimType::Drug, fx.patient, dec!(80.00)).in_admission(admission.id),
    )
    .await;

    let mut tx = fx.store.begin().await.unwrap();
    let mut claim = tx.lock_claim(claim_id).await.unwrap().unwrap();
    let first = fx.engine.ledger().attach_to_summary(&mut tx, &mut claim).await.unwrap();
    let second = fx.engine.ledger().attach_to_summary(&mut tx, &mut claim).await.unwrap();
    fx.store.commit(tx).await.unwrap();

    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.id, second.id);
    assert_eq!(second.claim_count, 1);
    assert_eq!(second.total_amount, dec!(80.00));

    let summaries = fx.store.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_amount, dec!(80.00));
    assert_eq!(summaries[0].covered_amount, dec!(56.00));
    assert_eq!(summaries[0].encounter, Encounter::Admission(admission.id));
}

#[tokio::test]
async fn test_orphan_claim_stays_without_summary() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Drug, fx.patient, dec!(20.00))).await;

    let claim = fx.store.claim(claim_id).await.unwrap();
    assert_eq!(claim.summary_id, None);
    assert!(fx.store.summaries().await.is_empty());
}

#[tokio::test]
async fn test_consultation_order_is_its_own_encounter() {
    let fx = insured_fixture().await;
    let order = OrderRef::new(ClaimType::Consultation, fx.patient, dec!(30.00));
    let consultation = order.id();
    claim_for(&fx, order).await;

    let summaries = fx.store.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].encounter, Encounter::Consultation(consultation));
}

#[tokio::test]
async fn test_removing_last_claim_deletes_summary() {
    let fx = insured_fixture().await;
    let surgery = Uuid::new_v4();
    let first = claim_for(
        &fx,
        OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00)).in_surgery(surgery),
    )
    .await;
    let second = claim_for(
        &fx,
        OrderRef::new(ClaimType::Drug, fx.patient, dec!(30.00)).in_surgery(surgery),
    )
    .await;

    fx.adjudication.remove_claim(first).await.unwrap();
    let summaries = fx.store.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].claim_count, 1);
    assert_eq!(summaries[0].total_amount, dec!(30.00));

    fx.adjudication.remove_claim(second).await.unwrap();
    assert!(fx.store.summaries().await.is_empty());
    assert!(fx.store.claims().await.is_empty());
}

#[tokio::test]
async fn test_paid_claim_cannot_be_removed() {
    let fx = insured_fixture().await;
    let claim_id = claim_for(&fx, OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00))).await;
    fx.adjudication
        .approve(claim_id, dec!(7.00), fx.actor, None)
        .await
        .unwrap();
    fx.adjudication.mark_paid(claim_id).await.unwrap();

    let err = fx.adjudication.remove_claim(claim_id).await.unwrap_err();
    assert!(matches!(
        err,
        BillingError::Insurance(InsuranceError::InvalidState { action: "removed", .. })
    ));
    assert!(fx.store.claim(claim_id).await.is_some());
}

#[tokio::test]
async fn test_second_claim_for_same_order_is_refused() {
    let fx = insured_fixture().await;
    let order = OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00));
    claim_for(&fx, order.clone()).await;

    let mut tx = fx.store.begin().await.unwrap();
    let active = tx
        .active_insurance(fx.patient, order.ordered_at.date_naive())
        .await
        .unwrap()
        .unwrap();
    let request = ClaimRequest {
        target: order.target,
        patient_id: fx.patient,
        billed_item: None,
        total_amount: order.total_amount,
        service_date: order.ordered_at.date_naive(),
        created_by: fx.actor,
    };
    let err = fx
        .engine
        .ledger()
        .create_claim(&mut tx, Some(&active), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, InsuranceError::DuplicateClaim { .. }));
}

#[tokio::test]
async fn test_claim_number_collision_is_retried() {
    let fx = insured_fixture().await;
    let engine = scripted_engine(&fx.store, &fx.config, &["CLM-0000000A", "CLM-0000000A", "CLM-0000000B"]);

    let first = engine
        .settle_new(OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00)), fx.actor)
        .await
        .unwrap();
    let second = engine
        .settle_new(OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00)), fx.actor)
        .await
        .unwrap();

    assert_eq!(first.claim.unwrap().claim_number, "CLM-0000000A");
    assert_eq!(second.claim.unwrap().claim_number, "CLM-0000000B");
}

#[tokio::test]
async fn test_exhausted_claim_numbers_abort_the_settlement() {
    let fx = insured_fixture().await;
    let config = SettlementConfig {
        claim_number_attempts: 3,
        ..fx.config.clone()
    };
    let engine = scripted_engine(&fx.store, &config, &["CLM-FFFFFFFF"]);

    engine
        .settle_new(OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00)), fx.actor)
        .await
        .unwrap();
    let order = engine
        .record_order(OrderRef::new(ClaimType::Drug, fx.patient, dec!(10.00)))
        .await
        .unwrap();
    let err = engine
        .settle(
            &order.order.target,
            PayerContext::Wallet(fx.patient),
            fx.actor,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BillingError::Insurance(InsuranceError::ClaimNumberExhausted(3))
    ));
    assert_eq!(fx.store.claims().await.len(), 1);
    assert!(fx.store.order(&order.order.target).await.unwrap().is_pending());
}
