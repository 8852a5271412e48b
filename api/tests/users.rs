//! Registration, login and profile updates through `UserService`.

mod common;

use std::sync::Arc;

use sqlx::SqlitePool;

use bookstore::auth::token::{Claims, TokenKind};
use bookstore::error::AppError;
use bookstore::models::user::{CreateUser, LoginPayload, UpdateUser, User, UserResponse};
use bookstore::AppState;

fn state(pool: &SqlitePool) -> AppState {
    common::build_state(pool.clone(), Arc::new(common::MemoryCache::default()))
}

fn new_user(name: &str, email: &str, password: &str) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

async fn fetch_user(pool: &SqlitePool, email: &str) -> Option<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, is_admin, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .unwrap()
}

async fn register_and_login(state: &AppState, email: &str) -> (UserResponse, Claims) {
    let user = state
        .users
        .register(new_user("Reader", email, "Password1"))
        .await
        .unwrap();
    let auth = state
        .users
        .login(LoginPayload {
            email: email.to_string(),
            password: "Password1".to_string(),
        })
        .await
        .unwrap();
    let claims = state
        .tokens
        .validate(&auth.access_token, TokenKind::Access)
        .unwrap();
    (user, claims)
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn register_hashes_password(pool: SqlitePool) {
    let state = state(&pool);
    let user = state
        .users
        .register(new_user("Jin-Woo", "jinwoo@example.com", "Password1"))
        .await
        .unwrap();

    assert_eq!(user.name, "Jin-Woo");
    assert_eq!(user.email, "jinwoo@example.com");
    assert!(!user.is_admin);

    let row = fetch_user(&pool, "jinwoo@example.com").await.unwrap();
    assert_eq!(row.id, user.id);
    assert!(row.password_hash.starts_with("$argon2id$"));
    assert!(row.updated_at.is_none());
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn duplicate_email_is_a_conflict(pool: SqlitePool) {
    let state = state(&pool);
    state
        .users
        .register(new_user("First", "dup@example.com", "Password1"))
        .await
        .unwrap();
    let before = fetch_user(&pool, "dup@example.com").await.unwrap();

    let second = state
        .users
        .register(new_user("Second", "dup@example.com", "Different1"))
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))), "{second:?}");

    let after = fetch_user(&pool, "dup@example.com").await.unwrap();
    assert_eq!(after.name, "First");
    assert_eq!(after.password_hash, before.password_hash);
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn register_validates_input(pool: SqlitePool) {
    let state = state(&pool);

    for payload in [
        new_user("Reader", "not-an-email", "Password1"),
        new_user("Reader", "reader@example.com", "short1A"),
        new_user("Reader", "reader@example.com", "password1"),
        new_user("   ", "reader@example.com", "Password1"),
    ] {
        let result = state.users.register(payload).await;
        assert!(matches!(result, Err(AppError::Validation(_))), "{result:?}");
    }
    assert!(fetch_user(&pool, "reader@example.com").await.is_none());
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn login_opens_a_session(pool: SqlitePool) {
    let state = state(&pool);
    state
        .users
        .register(new_user("Reader", "reader@example.com", "Password1"))
        .await
        .unwrap();

    let auth = state
        .users
        .login(LoginPayload {
            email: "reader@example.com".into(),
            password: "Password1".into(),
        })
        .await
        .unwrap();

    assert_eq!(auth.user.email, "reader@example.com");
    assert!(auth.access_token_expires_at < auth.refresh_token_expires_at);

    let session = state.sessions.get_session(&auth.session_id).await.unwrap();
    assert_eq!(session.user_email, "reader@example.com");
    assert_eq!(session.refresh_token, auth.refresh_token);
    assert!(!session.is_revoked);

    let session_claims = state
        .tokens
        .validate(&auth.refresh_token, TokenKind::Session)
        .unwrap();
    assert_eq!(session_claims.jti, auth.session_id);
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn login_failures_are_indistinguishable(pool: SqlitePool) {
    let state = state(&pool);
    state
        .users
        .register(new_user("Reader", "reader@example.com", "Password1"))
        .await
        .unwrap();

    let wrong_password = state
        .users
        .login(LoginPayload {
            email: "reader@example.com".into(),
            password: "Password2".into(),
        })
        .await
        .unwrap_err();
    let unknown_email = state
        .users
        .login(LoginPayload {
            email: "ghost@example.com".into(),
            password: "Password1".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown_email, AppError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn update_uses_identity_from_claims(pool: SqlitePool) {
    let state = state(&pool);
    let (user, claims) = register_and_login(&state, "reader@example.com").await;

    let updated = state
        .users
        .update_user_data(&claims, "Renamed".into())
        .await
        .unwrap();
    assert_eq!(updated.id, user.id);
    assert_eq!(updated.name, "Renamed");

    let row = fetch_user(&pool, "reader@example.com").await.unwrap();
    assert!(row.updated_at.is_some());
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn update_password_allows_new_login(pool: SqlitePool) {
    let state = state(&pool);
    let (_, claims) = register_and_login(&state, "reader@example.com").await;

    assert!(matches!(
        state
            .users
            .update_user_password(&claims, "weak".into())
            .await,
        Err(AppError::Validation(_))
    ));

    state
        .users
        .update_user_password(&claims, "NewPassword9".into())
        .await
        .unwrap();

    let old = state
        .users
        .login(LoginPayload {
            email: "reader@example.com".into(),
            password: "Password1".into(),
        })
        .await;
    assert!(matches!(old, Err(AppError::InvalidCredentials)));

    state
        .users
        .login(LoginPayload {
            email: "reader@example.com".into(),
            password: "NewPassword9".into(),
        })
        .await
        .unwrap();
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn update_email_checks_format_and_conflicts(pool: SqlitePool) {
    let state = state(&pool);
    let (_, claims) = register_and_login(&state, "reader@example.com").await;
    state
        .users
        .register(new_user("Other", "taken@example.com", "Password1"))
        .await
        .unwrap();

    assert!(matches!(
        state.users.update_user_email(&claims, "bogus".into()).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        state
            .users
            .update_user_email(&claims, "taken@example.com".into())
            .await,
        Err(AppError::Conflict(_))
    ));

    let moved = state
        .users
        .update_user_email(&claims, "moved@example.com".into())
        .await
        .unwrap();
    assert_eq!(moved.email, "moved@example.com");
    assert!(fetch_user(&pool, "reader@example.com").await.is_none());
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn empty_update_is_rejected(pool: SqlitePool) {
    let state = state(&pool);
    let (_, claims) = register_and_login(&state, "reader@example.com").await;

    assert!(matches!(
        state.users.update_user(&claims, UpdateUser::default()).await,
        Err(AppError::Validation(_))
    ));
}

#[sqlx::test(migrator = "bookstore::db::MIGRATOR")]
async fn email_change_keeps_identity_and_revokes_sessions(pool: SqlitePool) {
    let state = state(&pool);
    let (user, claims) = register_and_login(&state, "reader@example.com").await;

    state
        .users
        .update_user_email(&claims, "moved@example.com".into())
        .await
        .unwrap();
    let newcomer = state
        .users
        .register(new_user("Newcomer", "reader@example.com", "Password1"))
        .await
        .unwrap();

    // The old token still names the old address but acts on its own user.
    let renamed = state
        .users
        .update_user_data(&claims, "Still Me".into())
        .await
        .unwrap();
    assert_eq!(renamed.id, user.id);
    assert_eq!(renamed.email, "moved@example.com");

    let newcomer_row = fetch_user(&pool, "reader@example.com").await.unwrap();
    assert_eq!(newcomer_row.id, newcomer.id);
    assert_eq!(newcomer_row.name, "Newcomer");

    let revoked: Vec<bool> =
        sqlx::query_scalar("SELECT is_revoked FROM sessions WHERE user_email = ?")
            .bind("reader@example.com")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(revoked, vec![true]);
}
