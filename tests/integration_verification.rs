// Integration tests for email verification and resend

#[path = "common/mod.rs"]
mod common;

use chrono::{Duration as ChronoDuration, Utc};
use volunchain_identity::core::models::EmailVerificationOutcome;
use volunchain_identity::store::CredentialStore;
use volunchain_identity::IdentityError;

use common::*;

async fn registered(h: &TestHarness) -> String {
    h.service.registration.register(ana_request()).await.unwrap();
    h.email.last_token().unwrap()
}

#[tokio::test]
async fn test_verify_marks_account_verified() {
    let h = harness();
    let token = registered(&h).await;

    let outcome = h.service.verification.verify(&token).await.unwrap();

    assert_eq!(outcome, EmailVerificationOutcome::Verified);
    assert!(outcome.message().contains("verified"));

    let account = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();
    assert!(account.is_verified);
    assert!(account.verification_token.is_none());
    assert!(account.verification_token_expires_at.is_none());
}

#[tokio::test]
async fn test_verify_twice_is_idempotent() {
    let h = harness();
    let token = registered(&h).await;

    h.service.verification.verify(&token).await.unwrap();
    let second = h.service.verification.verify(&token).await.unwrap();

    assert_eq!(second, EmailVerificationOutcome::AlreadyVerified);
    assert!(second.message().contains("already verified"));
}

#[tokio::test]
async fn test_verify_rejects_stored_expiry_before_signature_expiry() {
    let h = harness();
    let token = registered(&h).await;
    let account = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();

    h.store
        .update_verification_token(account.id, &token, Utc::now() - ChronoDuration::seconds(1))
        .await
        .unwrap();

    let err = h.service.verification.verify(&token).await.unwrap_err();
    assert!(matches!(err, IdentityError::Expired));
    assert_eq!(err.status_code(), 410);

    let account = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();
    assert!(!account.is_verified);
    assert!(account.verification_token.is_some());
}

#[tokio::test]
async fn test_verify_rejects_signature_expiry() {
    let h = harness_builder()
        .token_lifetimes(ChronoDuration::seconds(-120), ChronoDuration::hours(1))
        .build();
    let token = registered(&h).await;

    let err = h.service.verification.verify(&token).await.unwrap_err();
    assert!(matches!(err, IdentityError::Expired));
    assert!(!h.store.find_by_email("ana@x.com").await.unwrap().unwrap().is_verified);
}

#[tokio::test]
async fn test_verify_rejects_malformed_token() {
    let h = harness();
    registered(&h).await;

    let err = h.service.verification.verify("not.a.token").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken));
    assert_eq!(err.user_message(), "Invalid verification token");
}

#[tokio::test]
async fn test_verify_token_for_unknown_email() {
    let h = harness();
    let issued = test_token_service().issue_email_token("nobody@x.com").unwrap();

    let err = h.service.verification.verify(&issued.token).await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)));
}

#[tokio::test]
async fn test_resend_overwrites_token_and_expiry() {
    let h = harness();
    let first = registered(&h).await;
    let before = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();

    let outcome = h.service.verification.resend("ana@x.com").await.unwrap();
    assert_eq!(outcome, EmailVerificationOutcome::Resent);

    let after = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();
    let second = h.email.last_token().unwrap();

    assert_ne!(first, second);
    assert_eq!(after.verification_token.as_deref(), Some(second.as_str()));
    assert!(after.verification_token_expires_at >= before.verification_token_expires_at);
    assert_eq!(h.email.sent_count(), 2);
}

#[tokio::test]
async fn test_resend_recovers_from_expired_token() {
    let h = harness();
    let token = registered(&h).await;
    let account = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();
    h.store
        .update_verification_token(account.id, &token, Utc::now() - ChronoDuration::hours(1))
        .await
        .unwrap();

    h.service.verification.resend("ana@x.com").await.unwrap();
    let fresh = h.email.last_token().unwrap();

    let outcome = h.service.verification.verify(&fresh).await.unwrap();
    assert_eq!(outcome, EmailVerificationOutcome::Verified);
}

#[tokio::test]
async fn test_resend_after_verification_skips_dispatch() {
    let h = harness();
    let token = registered(&h).await;
    h.service.verification.verify(&token).await.unwrap();
    let dispatched = h.email.sent_count();

    let outcome = h.service.verification.resend("ana@x.com").await.unwrap();

    assert_eq!(outcome, EmailVerificationOutcome::AlreadyVerified);
    assert!(outcome.message().contains("already verified"));
    assert_eq!(h.email.sent_count(), dispatched);

    let account = h.store.find_by_email("ana@x.com").await.unwrap().unwrap();
    assert!(account.verification_token.is_none());
}

#[tokio::test]
async fn test_resend_unknown_email_is_not_found() {
    let h = harness();
    let err = h.service.verification.resend("nobody@x.com").await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(_)));
    assert_eq!(h.email.sent_count(), 0);
}

#[tokio::test]
async fn test_resend_succeeds_when_dispatch_fails() {
    let h = harness_builder().email(RecordingEmailDispatcher::failing()).build();
    registered(&h).await;

    let outcome = h.service.verification.resend("ana@x.com").await.unwrap();
    assert_eq!(outcome, EmailVerificationOutcome::Resent);
}
