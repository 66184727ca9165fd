// Performance benchmarks for token issuance and verification

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use secrecy::Secret;
use uuid::Uuid;
use volunchain_identity::auth::{TokenFingerprint, TokenService};

fn token_service() -> TokenService {
    TokenService::new(
        &Secret::new("bench-email-secret-0123456789abcdef".to_string()),
        &Secret::new("bench-session-secret-0123456789abcdef".to_string()),
    )
}

fn bench_email_token(c: &mut Criterion) {
    let service = token_service();
    let issued = service.issue_email_token("ana@x.com").unwrap();

    c.bench_function("email_token_issue", |b| {
        b.iter(|| service.issue_email_token(black_box("ana@x.com")).unwrap());
    });

    c.bench_function("email_token_verify", |b| {
        b.iter(|| service.verify_email_token(black_box(&issued.token)).unwrap());
    });
}

fn bench_session_token(c: &mut Criterion) {
    let service = token_service();
    let account_id = Uuid::new_v4();
    let session = service.issue_session_token(account_id).unwrap();

    c.bench_function("session_token_verify", |b| {
        b.iter(|| service.verify_session_token(black_box(&session.token)).unwrap());
    });
}

fn bench_fingerprint(c: &mut Criterion) {
    let issued = token_service().issue_email_token("ana@x.com").unwrap();

    c.bench_function("token_fingerprint", |b| {
        b.iter(|| TokenFingerprint::of(black_box(&issued.token)));
    });
}

criterion_group!(benches, bench_email_token, bench_session_token, bench_fingerprint);
criterion_main!(benches);
