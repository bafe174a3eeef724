//! PgStore against a live database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test --test 70_postgres_store -- --ignored`.
//! Every test creates its own users, so a shared scratch database is fine.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use vidshare_api::database::models::{
    Comment, EdgeKey, NewComment, NewPlaylist, NewUser, NewVideo, Relation, TargetKind, User, Video,
};
use vidshare_api::database::{PgStore, Store, StoreError};

async fn connect() -> Result<PgStore> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must point at a scratch PostgreSQL database")?;
    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await?;
    let store = PgStore::from_pool(pool);
    store.ensure_tables().await?;
    Ok(store)
}

async fn user(store: &PgStore) -> Result<User> {
    let name = format!("pg{}", &Uuid::new_v4().simple().to_string()[..12]);
    Ok(store
        .insert_user(NewUser {
            email: format!("{}@example.com", name),
            username: name.clone(),
            full_name: name,
            avatar_url: "memory://avatar.png".into(),
            avatar_public_id: "avatar".into(),
            cover_image_url: None,
            cover_image_public_id: None,
            password_hash: "hash".into(),
        })
        .await?)
}

async fn video(store: &PgStore, owner: &User, title: &str) -> Result<Video> {
    Ok(store
        .insert_video(NewVideo {
            owner_id: owner.id,
            video_url: "memory://v.mp4".into(),
            video_public_id: "v".into(),
            thumbnail_url: "memory://t.png".into(),
            thumbnail_public_id: "t".into(),
            title: title.into(),
            description: "desc".into(),
            duration: 3.0,
        })
        .await?)
}

async fn comment(store: &PgStore, video: &Video, owner: &User, parent: Option<&Comment>) -> Result<Comment> {
    Ok(store
        .insert_comment(NewComment {
            video_id: video.id,
            owner_id: owner.id,
            parent_comment_id: parent.map(|c| c.id),
            content: "words".into(),
        })
        .await?)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_edge_is_a_conflict() -> Result<()> {
    let store = connect().await?;
    let fan = user(&store).await?;
    let owner = user(&store).await?;
    let clip = video(&store, &owner, "clip").await?;
    let key = EdgeKey::new(fan.id, TargetKind::Video, clip.id);

    let edge = store.insert_edge(&key).await?;
    match store.insert_edge(&key).await {
        Err(StoreError::Conflict(constraint)) => assert_eq!(constraint, "toggle_edges_unique_tuple"),
        other => anyhow::bail!("expected a conflict, got {:?}", other.map(|e| e.id)),
    }

    assert_eq!(store.find_edge(&key).await?.map(|e| e.id), Some(edge.id));
    assert_eq!(store.count_edges_to(TargetKind::Video, clip.id, Relation::Like).await?, 1);
    assert!(store.delete_edge(edge.id).await?);
    assert!(!store.delete_edge(edge.id).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_is_a_conflict() -> Result<()> {
    let store = connect().await?;
    let taken = user(&store).await?;
    let result = store
        .insert_user(NewUser {
            username: taken.username.clone(),
            email: format!("other-{}", taken.email),
            full_name: "Copycat".into(),
            avatar_url: "memory://avatar.png".into(),
            avatar_public_id: "avatar".into(),
            cover_image_url: None,
            cover_image_public_id: None,
            password_hash: "hash".into(),
        })
        .await;
    match result {
        Err(StoreError::Conflict(constraint)) => assert_eq!(constraint, "users_username_key"),
        other => anyhow::bail!("expected a conflict, got {:?}", other.map(|u| u.id)),
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn deleting_comment_removes_its_thread_and_likes() -> Result<()> {
    let store = connect().await?;
    let author = user(&store).await?;
    let fan = user(&store).await?;
    let clip = video(&store, &author, "clip").await?;

    let root = comment(&store, &clip, &author, None).await?;
    let reply = comment(&store, &clip, &fan, Some(&root)).await?;
    let nested = comment(&store, &clip, &author, Some(&reply)).await?;
    let sibling = comment(&store, &clip, &fan, None).await?;
    for target in [&root, &reply, &nested, &sibling] {
        store.insert_edge(&EdgeKey::new(fan.id, TargetKind::Comment, target.id)).await?;
    }

    assert!(store.delete_comment(root.id).await?);

    for gone in [&root, &reply, &nested] {
        assert!(store.find_comment(gone.id).await?.is_none());
        assert_eq!(store.count_edges_to(TargetKind::Comment, gone.id, Relation::Like).await?, 0);
    }
    assert!(store.find_comment(sibling.id).await?.is_some());
    assert_eq!(store.count_edges_to(TargetKind::Comment, sibling.id, Relation::Like).await?, 1);
    assert_eq!(store.count_comments(clip.id).await?, 1);
    assert!(!store.delete_comment(root.id).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn playlist_videos_decode_newest_first() -> Result<()> {
    let store = connect().await?;
    let owner = user(&store).await?;
    let first = video(&store, &owner, "first").await?;
    let second = video(&store, &owner, "second").await?;
    let third = video(&store, &owner, "third").await?;

    let playlist = store
        .insert_playlist(NewPlaylist {
            owner_id: owner.id,
            name: "mix".into(),
            description: String::new(),
            first_video: Some(first.id),
        })
        .await?;
    assert!(store.add_playlist_video(playlist.id, second.id).await?);
    assert!(store.add_playlist_video(playlist.id, third.id).await?);
    assert!(!store.add_playlist_video(playlist.id, second.id).await?);

    let found = store.find_playlist(playlist.id).await?.context("playlist")?;
    assert_eq!(found.video_ids, vec![third.id, second.id, first.id]);

    assert!(store.remove_playlist_video(playlist.id, second.id).await?);
    let listed = store.list_playlists_by_owner(owner.id).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].video_ids, vec![third.id, first.id]);

    // Deleting a video drops it from every playlist.
    assert!(store.delete_video(third.id).await?);
    let found = store.find_playlist(playlist.id).await?.context("playlist")?;
    assert_eq!(found.video_ids, vec![first.id]);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn batched_edge_reads_group_by_target() -> Result<()> {
    let store = connect().await?;
    let owner = user(&store).await?;
    let fan = user(&store).await?;
    let clip = video(&store, &owner, "clip").await?;
    let liked = comment(&store, &clip, &owner, None).await?;
    let quiet = comment(&store, &clip, &owner, None).await?;

    store.insert_edge(&EdgeKey::new(owner.id, TargetKind::Comment, liked.id)).await?;
    store.insert_edge(&EdgeKey::new(fan.id, TargetKind::Comment, liked.id)).await?;

    let ids = [liked.id, quiet.id];
    let counts = store.count_edges_to_many(TargetKind::Comment, &ids, Relation::Like).await?;
    assert_eq!(counts.get(&liked.id), Some(&2));
    assert_eq!(counts.get(&quiet.id), None);

    let mine = store.find_edge_targets(fan.id, TargetKind::Comment, &ids, Relation::Like).await?;
    assert!(mine.contains(&liked.id));
    assert!(!mine.contains(&quiet.id));
    Ok(())
}
