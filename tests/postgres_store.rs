//! `PgStore` against a real Postgres
//!
//! Each test creates a throwaway database from `configuration.yaml` and runs the
//! migrations into it. Run with `cargo test -- --ignored` while Postgres is up.

use chrono::Duration;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

use chirpy::auth::{
    create_refresh_token, generate_refresh_token, lookup_refresh_token, revoke_refresh_token,
    validate_refresh_token, RefreshTokenError, RefreshTokenRecord, RefreshTokenStore,
};
use chirpy::configuration::{get_configuration, DatabaseSettings};
use chirpy::database::{ChirpRepository, PgStore, UserRepository};
use chirpy::error::DatabaseError;

pub struct TestStore {
    pub store: PgStore,
    pub user_id: Uuid,
}

async fn spawn_store() -> TestStore {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let store = PgStore::new(connection_pool);
    let user_id = store
        .create_user(&format!("{}@example.com", Uuid::new_v4()), "hash")
        .await
        .expect("Failed to create test user")
        .id;

    TestStore { store, user_id }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

// --- Refresh Token Tests ---

#[tokio::test]
#[ignore] // Requires actual database
async fn created_token_validates_to_its_owner() {
    let app = spawn_store().await;
    let token = generate_refresh_token();

    let created = create_refresh_token(&app.store, &token, app.user_id, Duration::days(60))
        .await
        .unwrap();
    let found = lookup_refresh_token(&app.store, &token).await.unwrap();

    assert_eq!(found.user_id, app.user_id);
    assert_eq!(found.revoked_at, None);
    assert_eq!(
        found.expires_at.timestamp(),
        created.expires_at.timestamp()
    );
    assert_eq!(
        validate_refresh_token(&app.store, &token).await.unwrap(),
        app.user_id
    );
    assert_eq!(app.store.owner_of(&token).await.unwrap(), Some(app.user_id));
}

#[tokio::test]
#[ignore] // Requires actual database
async fn unknown_and_expired_tokens_are_rejected() {
    let app = spawn_store().await;
    let token = generate_refresh_token();
    create_refresh_token(&app.store, &token, app.user_id, Duration::seconds(-1))
        .await
        .unwrap();

    assert_eq!(
        validate_refresh_token(&app.store, &token).await,
        Err(RefreshTokenError::Expired)
    );
    assert_eq!(
        validate_refresh_token(&app.store, "unknown").await,
        Err(RefreshTokenError::NotFound)
    );
    assert_eq!(app.store.owner_of("unknown").await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires actual database
async fn revoke_sets_revoked_at_once() {
    let app = spawn_store().await;
    let token = generate_refresh_token();
    create_refresh_token(&app.store, &token, app.user_id, Duration::days(60))
        .await
        .unwrap();

    revoke_refresh_token(&app.store, &token).await.unwrap();
    let first = lookup_refresh_token(&app.store, &token).await.unwrap();

    revoke_refresh_token(&app.store, &token).await.unwrap();
    let second = lookup_refresh_token(&app.store, &token).await.unwrap();

    assert!(first.revoked_at.is_some());
    assert_eq!(first.revoked_at, second.revoked_at);
    assert_eq!(first.updated_at, second.updated_at);
    assert_eq!(
        validate_refresh_token(&app.store, &token).await,
        Err(RefreshTokenError::Revoked)
    );
    assert_eq!(
        revoke_refresh_token(&app.store, "unknown").await,
        Err(RefreshTokenError::NotFound)
    );
}

#[tokio::test]
#[ignore] // Requires actual database
async fn concurrent_revokes_leave_one_timestamp() {
    let app = spawn_store().await;
    let token = generate_refresh_token();
    create_refresh_token(&app.store, &token, app.user_id, Duration::days(60))
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = app.store.clone();
            let token = token.clone();
            tokio::spawn(async move { revoke_refresh_token(&store, &token).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = lookup_refresh_token(&app.store, &token).await.unwrap();
    assert!(record.revoked_at.is_some());
    assert_eq!(record.revoked_at, Some(record.updated_at));
}

#[tokio::test]
#[ignore] // Requires actual database
async fn duplicate_token_is_a_persistence_error() {
    let app = spawn_store().await;
    let token = generate_refresh_token();
    create_refresh_token(&app.store, &token, app.user_id, Duration::days(60))
        .await
        .unwrap();

    let result = create_refresh_token(&app.store, &token, app.user_id, Duration::days(60)).await;
    assert!(matches!(result, Err(RefreshTokenError::Persistence(_))));

    let orphan = RefreshTokenRecord::new(
        generate_refresh_token(),
        Uuid::new_v4(),
        chrono::Utc::now(),
        Duration::days(60),
    );
    assert!(matches!(
        app.store.insert(&orphan).await,
        Err(RefreshTokenError::Persistence(_))
    ));
}

// --- User / Chirp Tests ---

#[tokio::test]
#[ignore] // Requires actual database
async fn users_can_be_created_and_updated() {
    let app = spawn_store().await;

    let user = app
        .store
        .create_user("walt@breakingbad.com", "old-hash")
        .await
        .unwrap();
    assert!(!user.is_chirpy_red);

    let duplicate = app.store.create_user("walt@breakingbad.com", "hash").await;
    assert!(matches!(
        duplicate,
        Err(DatabaseError::UniqueConstraintViolation(_))
    ));

    let updated = app
        .store
        .update_credentials(user.id, "heisenberg@breakingbad.com", "new-hash")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.email, "heisenberg@breakingbad.com");
    assert_eq!(updated.hashed_password, "new-hash");
    assert!(app
        .store
        .user_by_email("walt@breakingbad.com")
        .await
        .unwrap()
        .is_none());

    let upgraded = app.store.upgrade_user(user.id).await.unwrap().unwrap();
    assert!(upgraded.is_chirpy_red);
    assert!(app.store.upgrade_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires actual database
async fn chirps_round_trip() {
    let app = spawn_store().await;

    let first = app.store.create_chirp("first", app.user_id).await.unwrap();
    let second = app.store.create_chirp("second", app.user_id).await.unwrap();

    let all = app.store.all_chirps().await.unwrap();
    assert_eq!(
        all.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    assert!(app.store.delete_chirp(first.id).await.unwrap());
    assert!(!app.store.delete_chirp(first.id).await.unwrap());
    assert!(app.store.chirp_by_id(first.id).await.unwrap().is_none());
    assert_eq!(
        app.store.chirp_by_id(second.id).await.unwrap().map(|c| c.body),
        Some("second".to_string())
    );
}
