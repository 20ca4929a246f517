//! PostgreSQL repository tests
//!
//! These tests need a reachable PostgreSQL instance (`DATABASE_URL`) and are
//! ignored by default. Run with `cargo test -- --ignored`. Usernames carry a
//! per-run suffix so the tests can share a database.

use chat::{
    models::{MessageChanges, NewMessage, NewRoom, NewUser, RoomChanges, UserChanges},
    repositories::{
        MessageStore, PgMessageRepository, PgRoomRepository, PgUserRepository, RoomStore,
        UserStore,
    },
    validation::USERNAME_CONSTRAINT,
};
use chrono::Utc;
use common::{
    database::{DatabaseConfig, init_pool, run_migrations},
    error::DatabaseError,
};
use sqlx::PgPool;

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

fn unique(name: &str) -> String {
    format!("{}_{}", name, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn user(users: &PgUserRepository, name: &str) -> Result<i64, DatabaseError> {
    let user = users
        .create(&NewUser {
            username: unique(name),
            email: format!("{}@x.com", name),
            avatar: None,
            password_hash: "$argon2id$placeholder".to_string(),
        })
        .await?;
    Ok(user.id)
}

#[tokio::test]
#[ignore] // Requires database
async fn test_duplicate_username_is_unique_violation() -> TestResult {
    let users = PgUserRepository::new(pool().await?);
    let username = unique("alice");
    let new_user = NewUser {
        username: username.clone(),
        email: "a@x.com".to_string(),
        avatar: None,
        password_hash: "$argon2id$placeholder".to_string(),
    };

    let created = users.create(&new_user).await?;
    assert_eq!(
        users.find_by_username(&username).await?.map(|u| u.id),
        Some(created.id)
    );

    match users.create(&new_user).await {
        Err(DatabaseError::UniqueViolation(constraint)) => {
            assert_eq!(constraint, USERNAME_CONSTRAINT)
        }
        other => panic!("expected unique violation, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_user_update_and_id_filters() -> TestResult {
    let users = PgUserRepository::new(pool().await?);
    let alice = user(&users, "alice").await?;
    let bob = user(&users, "bob").await?;

    let updated = users
        .update(
            alice,
            UserChanges {
                avatar: Some(Some("avatars/alice.png".to_string())),
                ..UserChanges::default()
            },
        )
        .await?
        .ok_or("user vanished")?;
    assert_eq!(updated.avatar.as_deref(), Some("avatars/alice.png"));
    assert!(users.update(i64::MAX, UserChanges::default()).await?.is_none());

    let listed: Vec<i64> = users
        .list(Some(&[bob, alice]))
        .await?
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(listed, vec![alice, bob]);

    let mut existing = users.existing_ids(&[alice, i64::MAX]).await?;
    existing.sort();
    assert_eq!(existing, vec![alice]);

    Ok(())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_room_participants_keep_order_and_can_be_replaced() -> TestResult {
    let pool = pool().await?;
    let users = PgUserRepository::new(pool.clone());
    let rooms = PgRoomRepository::new(pool);
    let alice = user(&users, "alice").await?;
    let bob = user(&users, "bob").await?;
    let carol = user(&users, "carol").await?;

    let room = rooms
        .create(&NewRoom {
            name: "general".to_string(),
            description: String::new(),
            participants: vec![carol, alice, bob],
        })
        .await?;

    let stored = rooms.find_by_id(room.id).await?.ok_or("room missing")?;
    assert_eq!(stored.participants, vec![carol, alice, bob]);
    assert!(rooms.exists(room.id).await?);

    let updated = rooms
        .update(
            room.id,
            RoomChanges {
                name: Some("random".to_string()),
                participants: Some(vec![bob, carol]),
                ..RoomChanges::default()
            },
        )
        .await?
        .ok_or("room missing")?;
    assert_eq!(updated.participants, vec![bob, carol]);

    let stored = rooms.find_by_id(room.id).await?.ok_or("room missing")?;
    assert_eq!(stored.name, "random");
    assert_eq!(stored.participants, vec![bob, carol]);

    Ok(())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_empty_room_reads_back_without_participants() -> TestResult {
    let rooms = PgRoomRepository::new(pool().await?);

    let room = rooms
        .create(&NewRoom {
            name: "lobby".to_string(),
            description: "nobody here".to_string(),
            participants: Vec::new(),
        })
        .await?;

    let stored = rooms.find_by_id(room.id).await?.ok_or("room missing")?;
    assert!(stored.participants.is_empty());

    let listed = rooms.list().await?;
    let listed = listed
        .iter()
        .find(|r| r.id == room.id)
        .ok_or("room not listed")?;
    assert!(listed.participants.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_dangling_participant_is_foreign_key_violation() -> TestResult {
    let pool = pool().await?;
    let users = PgUserRepository::new(pool.clone());
    let rooms = PgRoomRepository::new(pool);
    let alice = user(&users, "alice").await?;
    let name = unique("dangling");

    let result = rooms
        .create(&NewRoom {
            name: name.clone(),
            description: String::new(),
            participants: vec![alice, i64::MAX],
        })
        .await;

    match result {
        Err(DatabaseError::ForeignKeyViolation(constraint)) => {
            assert_eq!(constraint, "room_participants_user_id_fkey")
        }
        other => panic!("expected foreign key violation, got {:?}", other),
    }

    // The room insert is rolled back with the participants
    assert!(!rooms.list().await?.iter().any(|r| r.name == name));

    Ok(())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_room_delete_cascades_to_messages() -> TestResult {
    let pool = pool().await?;
    let users = PgUserRepository::new(pool.clone());
    let rooms = PgRoomRepository::new(pool.clone());
    let messages = PgMessageRepository::new(pool);
    let alice = user(&users, "alice").await?;

    let room = rooms
        .create(&NewRoom {
            name: "general".to_string(),
            description: String::new(),
            participants: vec![alice],
        })
        .await?;

    let first = messages
        .create(&NewMessage {
            room: room.id,
            sender: alice,
            content: "hello".to_string(),
            file: None,
        })
        .await?;
    let second = messages
        .create(&NewMessage {
            room: room.id,
            sender: alice,
            content: String::new(),
            file: Some("files/notes.txt".to_string()),
        })
        .await?;

    let edited = messages
        .update(
            first.id,
            MessageChanges {
                content: Some("hello again".to_string()),
                ..MessageChanges::default()
            },
        )
        .await?
        .ok_or("message missing")?;
    assert_eq!(edited.content, "hello again");
    assert_eq!(edited.room, room.id);

    let in_room: Vec<i64> = messages
        .list(Some(room.id))
        .await?
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(in_room, vec![first.id, second.id]);

    assert!(rooms.delete(room.id).await?);
    assert!(!rooms.delete(room.id).await?);
    assert!(rooms.find_by_id(room.id).await?.is_none());
    assert!(messages.find_by_id(first.id).await?.is_none());
    assert!(messages.list(Some(room.id)).await?.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_message_with_unknown_room_is_foreign_key_violation() -> TestResult {
    let pool = pool().await?;
    let users = PgUserRepository::new(pool.clone());
    let messages = PgMessageRepository::new(pool);
    let alice = user(&users, "alice").await?;

    let result = messages
        .create(&NewMessage {
            room: i64::MAX,
            sender: alice,
            content: "hello".to_string(),
            file: None,
        })
        .await;

    assert!(matches!(
        result,
        Err(DatabaseError::ForeignKeyViolation(_))
    ));

    Ok(())
}
