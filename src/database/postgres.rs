use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{
    Comment, EdgeKey, NewComment, NewPlaylist, NewUser, NewVideo, Playlist, Relation, TargetKind,
    ToggleEdge, User, Video, VideoFilter,
};
use super::store::{Store, StoreResult};
use crate::config::DatabaseConfig;

/// Schema applied at startup. Every statement is idempotent.
///
/// Toggle edges point at several tables, so their cleanup is done explicitly
/// in `delete_video` and `delete_comment` rather than through foreign keys.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        full_name TEXT NOT NULL,
        avatar_url TEXT NOT NULL,
        avatar_public_id TEXT NOT NULL,
        cover_image_url TEXT,
        cover_image_public_id TEXT,
        password_hash TEXT NOT NULL,
        refresh_token TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS videos (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        video_url TEXT NOT NULL,
        video_public_id TEXT NOT NULL,
        thumbnail_url TEXT NOT NULL,
        thumbnail_public_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        duration DOUBLE PRECISION NOT NULL DEFAULT 0,
        views BIGINT NOT NULL DEFAULT 0,
        is_published BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_videos_owner ON videos(owner_id)",
    r#"CREATE TABLE IF NOT EXISTS comments (
        id UUID PRIMARY KEY,
        video_id UUID NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
        owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        parent_comment_id UUID REFERENCES comments(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_comments_video ON comments(video_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment_id)",
    r#"CREATE TABLE IF NOT EXISTS playlists (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT playlists_owner_id_name_key UNIQUE (owner_id, name)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS playlist_videos (
        playlist_id UUID NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        video_id UUID NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
        added_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (playlist_id, video_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS toggle_edges (
        id UUID PRIMARY KEY,
        principal_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        target_kind TEXT NOT NULL,
        target_id UUID NOT NULL,
        relation TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT toggle_edges_unique_tuple UNIQUE (principal_id, target_kind, target_id, relation)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_toggle_edges_target ON toggle_edges(target_kind, target_id, relation)",
    r#"CREATE TABLE IF NOT EXISTS watch_history (
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        video_id UUID NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
        watched_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (user_id, video_id)
    )"#,
];

/// Advisory lock key held while the schema is applied.
const SCHEMA_LOCK_KEY: i64 = 0x7669_6473_6861_7265;

const PLAYLIST_COLUMNS: &str = r#"p.id, p.owner_id, p.name, p.description, p.created_at, p.updated_at,
    ARRAY(SELECT pv.video_id FROM playlist_videos pv WHERE pv.playlist_id = p.id ORDER BY pv.added_at DESC) AS video_ids"#;

/// Edge row as stored; kind and relation are plain text columns.
#[derive(FromRow)]
struct EdgeRow {
    id: Uuid,
    principal_id: Uuid,
    target_kind: String,
    target_id: Uuid,
    relation: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EdgeRow> for ToggleEdge {
    type Error = StoreError;

    fn try_from(row: EdgeRow) -> Result<Self, Self::Error> {
        Ok(ToggleEdge {
            id: row.id,
            principal_id: row.principal_id,
            target_kind: row.target_kind.parse().map_err(StoreError::CorruptRow)?,
            target_id: row.target_id,
            relation: row.relation.parse().map_err(StoreError::CorruptRow)?,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens the pool and makes sure the schema exists.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::ConnectionError("DATABASE_URL is not set".into()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        let store = Self { pool };
        store.ensure_tables().await?;
        info!("Connected to PostgreSQL (max_connections={})", config.max_connections);
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the schema in one transaction so a failure leaves the database untouched.
    ///
    /// Concurrent `CREATE TABLE IF NOT EXISTS` can still collide on the catalog,
    /// so instances starting together serialize on an advisory lock.
    pub async fn ensure_tables(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await?;
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn push_video_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &VideoFilter) {
        builder.push(" WHERE TRUE");
        if filter.published_only {
            builder.push(" AND is_published");
        }
        if let Some(owner) = filter.owner_id {
            builder.push(" AND owner_id = ").push_bind(owner);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user(Uuid::new_v4(), Utc::now());
        sqlx::query(
            r#"INSERT INTO users (id, username, email, full_name, avatar_url, avatar_public_id,
                cover_image_url, cover_image_public_id, password_hash, refresh_token, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .bind(&user.avatar_public_id)
        .bind(&user.cover_image_url)
        .bind(&user.cover_image_public_id)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE users SET username = $2, email = $3, full_name = $4, avatar_url = $5,
                avatar_public_id = $6, cover_image_url = $7, cover_image_public_id = $8,
                password_hash = $9, refresh_token = $10, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .bind(&user.avatar_public_id)
        .bind(&user.cover_image_url)
        .bind(&user.cover_image_public_id)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }

    async fn insert_video(&self, video: NewVideo) -> StoreResult<Video> {
        let video = video.into_video(Uuid::new_v4(), Utc::now());
        sqlx::query(
            r#"INSERT INTO videos (id, owner_id, video_url, video_public_id, thumbnail_url,
                thumbnail_public_id, title, description, duration, views, is_published, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(video.id)
        .bind(video.owner_id)
        .bind(&video.video_url)
        .bind(&video.video_public_id)
        .bind(&video.thumbnail_url)
        .bind(&video.thumbnail_public_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(video)
    }

    async fn find_video(&self, id: Uuid) -> StoreResult<Option<Video>> {
        Ok(sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_videos(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let mut by_id: HashMap<Uuid, Video> = rows.into_iter().map(|v| (v.id, v)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn update_video(&self, video: &Video) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE videos SET video_url = $2, video_public_id = $3, thumbnail_url = $4,
                thumbnail_public_id = $5, title = $6, description = $7, duration = $8,
                is_published = $9, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(video.id)
        .bind(&video.video_url)
        .bind(&video.video_public_id)
        .bind(&video.thumbnail_url)
        .bind(&video.thumbnail_public_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(video.is_published)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("video"));
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"DELETE FROM toggle_edges
               WHERE (target_kind = 'video' AND target_id = $1)
                  OR (target_kind = 'comment' AND target_id IN (SELECT id FROM comments WHERE video_id = $1))"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_videos(&self, filter: &VideoFilter, skip: u64, limit: u64) -> StoreResult<Vec<Video>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM videos");
        Self::push_video_filter(&mut builder, filter);
        // Column and direction come from closed enums, never from raw input.
        builder.push(format!(
            " ORDER BY {} {}, id {}",
            filter.sort_by.column(),
            filter.sort_direction.keyword(),
            filter.sort_direction.keyword()
        ));
        builder.push(" LIMIT ").push_bind(to_i64(limit));
        builder.push(" OFFSET ").push_bind(to_i64(skip));
        Ok(builder.build_query_as::<Video>().fetch_all(&self.pool).await?)
    }

    async fn count_videos(&self, filter: &VideoFilter) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos");
        Self::push_video_filter(&mut builder, filter);
        let (count,) = builder.build_query_as::<(i64,)>().fetch_one(&self.pool).await?;
        Ok(to_u64(count))
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let comment = comment.into_comment(Uuid::new_v4(), Utc::now());
        sqlx::query(
            r#"INSERT INTO comments (id, video_id, owner_id, parent_comment_id, content, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(comment.id)
        .bind(comment.video_id)
        .bind(comment.owner_id)
        .bind(comment.parent_comment_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let result = sqlx::query("UPDATE comments SET content = $2, updated_at = now() WHERE id = $1")
            .bind(comment.id)
            .bind(&comment.content)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("comment"));
        }
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"WITH RECURSIVE thread AS (
                   SELECT id FROM comments WHERE id = $1
                   UNION ALL
                   SELECT c.id FROM comments c JOIN thread t ON c.parent_comment_id = t.id
               )
               DELETE FROM toggle_edges
               WHERE target_kind = 'comment' AND target_id IN (SELECT id FROM thread)"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, video_id: Uuid, skip: u64, limit: u64) -> StoreResult<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE video_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(video_id)
        .bind(to_i64(limit))
        .bind(to_i64(skip))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_comments(&self, video_id: Uuid) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(to_u64(count))
    }

    async fn insert_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        let playlist = playlist.into_playlist(Uuid::new_v4(), Utc::now());
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(playlist.id)
        .bind(playlist.owner_id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&mut *tx)
        .await?;
        for video_id in &playlist.video_ids {
            sqlx::query("INSERT INTO playlist_videos (playlist_id, video_id) VALUES ($1, $2)")
                .bind(playlist.id)
                .bind(video_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(playlist)
    }

    async fn find_playlist(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        Ok(sqlx::query_as::<_, Playlist>(&format!(
            "SELECT {} FROM playlists p WHERE p.id = $1",
            PLAYLIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_playlist(&self, playlist: &Playlist) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE playlists SET name = $2, description = $3, updated_at = now() WHERE id = $1",
        )
        .bind(playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("playlist"));
        }
        Ok(())
    }

    async fn delete_playlist(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"INSERT INTO playlist_videos (playlist_id, video_id, added_at) VALUES ($1, $2, clock_timestamp())
               ON CONFLICT DO NOTHING"#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&mut *tx)
        .await?;
        let added = result.rows_affected() > 0;
        if added {
            sqlx::query("UPDATE playlists SET updated_at = now() WHERE id = $1")
                .bind(playlist_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(added)
    }

    async fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(&mut *tx)
            .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            sqlx::query("UPDATE playlists SET updated_at = now() WHERE id = $1")
                .bind(playlist_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(removed)
    }

    async fn list_playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>> {
        Ok(sqlx::query_as::<_, Playlist>(&format!(
            "SELECT {} FROM playlists p WHERE p.owner_id = $1 ORDER BY p.created_at DESC, p.id DESC",
            PLAYLIST_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_edge(&self, key: &EdgeKey) -> StoreResult<Option<ToggleEdge>> {
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"SELECT * FROM toggle_edges
               WHERE principal_id = $1 AND target_kind = $2 AND target_id = $3 AND relation = $4"#,
        )
        .bind(key.principal_id)
        .bind(key.target_kind.as_str())
        .bind(key.target_id)
        .bind(key.relation.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ToggleEdge::try_from).transpose()
    }

    async fn insert_edge(&self, key: &EdgeKey) -> StoreResult<ToggleEdge> {
        let edge = ToggleEdge {
            id: Uuid::new_v4(),
            principal_id: key.principal_id,
            target_kind: key.target_kind,
            target_id: key.target_id,
            relation: key.relation,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO toggle_edges (id, principal_id, target_kind, target_id, relation, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(edge.id)
        .bind(edge.principal_id)
        .bind(edge.target_kind.as_str())
        .bind(edge.target_id)
        .bind(edge.relation.as_str())
        .bind(edge.created_at)
        .execute(&self.pool)
        .await?;
        Ok(edge)
    }

    async fn delete_edge(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM toggle_edges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_edges_to(&self, target_kind: TargetKind, target_id: Uuid, relation: Relation) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM toggle_edges WHERE target_kind = $1 AND target_id = $2 AND relation = $3",
        )
        .bind(target_kind.as_str())
        .bind(target_id)
        .bind(relation.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(to_u64(count))
    }

    async fn count_edges_to_many(
        &self,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashMap<Uuid, u64>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"SELECT target_id, COUNT(*) FROM toggle_edges
               WHERE target_kind = $1 AND relation = $2 AND target_id = ANY($3)
               GROUP BY target_id"#,
        )
        .bind(target_kind.as_str())
        .bind(relation.as_str())
        .bind(target_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id, count)| (id, to_u64(count))).collect())
    }

    async fn find_edge_targets(
        &self,
        principal_id: Uuid,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashSet<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"SELECT target_id FROM toggle_edges
               WHERE principal_id = $1 AND target_kind = $2 AND relation = $3 AND target_id = ANY($4)"#,
        )
        .bind(principal_id)
        .bind(target_kind.as_str())
        .bind(relation.as_str())
        .bind(target_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn count_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM toggle_edges WHERE principal_id = $1 AND target_kind = $2 AND relation = $3",
        )
        .bind(principal_id)
        .bind(target_kind.as_str())
        .bind(relation.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(to_u64(count))
    }

    async fn list_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<Vec<ToggleEdge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"SELECT * FROM toggle_edges
               WHERE principal_id = $1 AND target_kind = $2 AND relation = $3
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(principal_id)
        .bind(target_kind.as_str())
        .bind(relation.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ToggleEdge::try_from).collect()
    }

    async fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO watch_history (user_id, video_id, watched_at) VALUES ($1, $2, now())
               ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = EXCLUDED.watched_at"#,
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT video_id FROM watch_history WHERE user_id = $1 ORDER BY watched_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
