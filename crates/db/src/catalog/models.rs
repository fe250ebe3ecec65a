//! Catalog entities
//!
//! Every entity carries an identifier, an attribution field, and a
//! creation timestamp; the schema enforces that invariant, not this code.
//! Relational links are foreign-key identifiers with separately-loaded
//! accessors, never embedded structs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::types::{HoldingCommentType, TrackFccStatus};
use crate::error::DbResult;

/// A physical or logical shelf grouping holdings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
}

impl Stack {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> DbResult<Self> {
        let row = sqlx::query("SELECT * FROM stacks WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Self::from_row(&row)
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO stacks (id, added_by, added_at, name, description) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.name)
        .bind(&self.description)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// A release medium (vinyl, CD, digital, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub physical: bool,
}

impl Format {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            physical: row.try_get("physical")?,
        })
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> DbResult<Self> {
        let row = sqlx::query("SELECT * FROM formats WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Self::from_row(&row)
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO formats (id, added_by, added_at, name, description, physical) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.physical)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// An album-level grouping of holdings within a stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingGroup {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub album_title: String,
    pub album_artist: String,
    pub releasegroup_mbid: Option<Uuid>,
    pub description: Option<String>,
    pub active: bool,
    pub stack_id: Uuid,
}

impl HoldingGroup {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            album_title: row.try_get("album_title")?,
            album_artist: row.try_get("album_artist")?,
            releasegroup_mbid: row.try_get("releasegroup_mbid")?,
            description: row.try_get("description")?,
            active: row.try_get("active")?,
            stack_id: row.try_get("stack_id")?,
        })
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> DbResult<Self> {
        let row = sqlx::query("SELECT * FROM holding_groups WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Self::from_row(&row)
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO holding_groups \
             (id, added_by, added_at, album_title, album_artist, releasegroup_mbid, \
              description, active, stack_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.album_title)
        .bind(&self.album_artist)
        .bind(self.releasegroup_mbid)
        .bind(&self.description)
        .bind(self.active)
        .bind(self.stack_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn stack(&self, pool: &PgPool) -> DbResult<Stack> {
        Stack::find(pool, self.stack_id).await
    }
}

impl std::fmt::Display for HoldingGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} by {} <{}>",
            self.album_title, self.album_artist, self.id
        )
    }
}

/// One concrete copy of a release in some format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub label: Option<String>,
    pub releasegroup_mbid: Option<Uuid>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub source_desc: Option<String>,
    pub torrent_hash: Option<String>,
    pub active: bool,
    pub holding_group_id: Uuid,
    pub format_id: Uuid,
}

impl Holding {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            label: row.try_get("label")?,
            releasegroup_mbid: row.try_get("releasegroup_mbid")?,
            description: row.try_get("description")?,
            source_url: row.try_get("source_url")?,
            source_desc: row.try_get("source_desc")?,
            torrent_hash: row.try_get("torrent_hash")?,
            active: row.try_get("active")?,
            holding_group_id: row.try_get("holding_group_id")?,
            format_id: row.try_get("format_id")?,
        })
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> DbResult<Self> {
        let row = sqlx::query("SELECT * FROM holdings WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Self::from_row(&row)
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO holdings \
             (id, added_by, added_at, label, releasegroup_mbid, description, source_url, \
              source_desc, torrent_hash, active, holding_group_id, format_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.label)
        .bind(self.releasegroup_mbid)
        .bind(&self.description)
        .bind(&self.source_url)
        .bind(&self.source_desc)
        .bind(&self.torrent_hash)
        .bind(self.active)
        .bind(self.holding_group_id)
        .bind(self.format_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn holding_group(&self, pool: &PgPool) -> DbResult<HoldingGroup> {
        HoldingGroup::find(pool, self.holding_group_id).await
    }

    pub async fn format(&self, pool: &PgPool) -> DbResult<Format> {
        Format::find(pool, self.format_id).await
    }
}

/// A window during which a holding is in rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationRelease {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub stop: Option<DateTime<Utc>>,
    pub bin: Option<String>,
    pub holding_id: Uuid,
}

impl RotationRelease {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            start: row.try_get("start")?,
            stop: row.try_get("stop")?,
            bin: row.try_get("bin")?,
            holding_id: row.try_get("holding_id")?,
        })
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO rotation_releases (id, added_by, added_at, start, stop, bin, holding_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(self.start)
        .bind(self.stop)
        .bind(&self.bin)
        .bind(self.holding_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn holding(&self, pool: &PgPool) -> DbResult<Holding> {
        Holding::find(pool, self.holding_id).await
    }
}

/// A free-form tag attached to a holding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingTag {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub owner: Option<String>,
    pub tag: String,
    pub holding_id: Uuid,
}

impl HoldingTag {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            owner: row.try_get("owner")?,
            tag: row.try_get("tag")?,
            holding_id: row.try_get("holding_id")?,
        })
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO holding_tags (id, added_by, added_at, owner, tag, holding_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.owner)
        .bind(&self.tag)
        .bind(self.holding_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn holding(&self, pool: &PgPool) -> DbResult<Holding> {
        Holding::find(pool, self.holding_id).await
    }
}

/// A review, note, or warning attached to a holding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingComment {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub comment_text: Option<String>,
    pub reviewer_username: Option<String>,
    pub reviewer_fullname: String,
    pub rating: Option<i32>,
    pub review_date: Option<NaiveDate>,
    pub comment_type: HoldingCommentType,
    pub holding_id: Uuid,
}

impl HoldingComment {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        let comment_type: Option<String> = row.try_get("type")?;
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            comment_text: row.try_get("comment_text")?,
            reviewer_username: row.try_get("reviewer_username")?,
            reviewer_fullname: row.try_get("reviewer_fullname")?,
            rating: row.try_get("rating")?,
            review_date: row.try_get("review_date")?,
            comment_type: HoldingCommentType::from_nullable(comment_type.as_deref())?,
            holding_id: row.try_get("holding_id")?,
        })
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> DbResult<Self> {
        let row = sqlx::query("SELECT * FROM holding_comments WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Self::from_row(&row)
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO holding_comments \
             (id, added_by, added_at, comment_text, reviewer_username, reviewer_fullname, \
              rating, review_date, type, holding_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.comment_text)
        .bind(&self.reviewer_username)
        .bind(&self.reviewer_fullname)
        .bind(self.rating)
        .bind(self.review_date)
        .bind(self.comment_type.as_str())
        .bind(self.holding_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn holding(&self, pool: &PgPool) -> DbResult<Holding> {
        Holding::find(pool, self.holding_id).await
    }
}

/// One track on a holding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub title: String,
    pub artist: String,
    pub file_path: Option<String>,
    pub track_num: i32,
    pub disc_number: i32,
    pub track_mbid: Option<Uuid>,
    pub recording_mbid: Option<Uuid>,
    pub has_fcc: TrackFccStatus,
    pub holding_id: Uuid,
}

impl Track {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        let has_fcc: Option<String> = row.try_get("has_fcc")?;
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            title: row.try_get("title")?,
            artist: row.try_get("artist")?,
            file_path: row.try_get("file_path")?,
            track_num: row.try_get("track_num")?,
            disc_number: row.try_get("disc_number")?,
            track_mbid: row.try_get("track_mbid")?,
            recording_mbid: row.try_get("recording_mbid")?,
            has_fcc: TrackFccStatus::from_nullable(has_fcc.as_deref())?,
            holding_id: row.try_get("holding_id")?,
        })
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> DbResult<Self> {
        let row = sqlx::query("SELECT * FROM tracks WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Self::from_row(&row)
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO tracks \
             (id, added_by, added_at, title, artist, file_path, track_num, disc_number, \
              track_mbid, recording_mbid, has_fcc, holding_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.title)
        .bind(&self.artist)
        .bind(&self.file_path)
        .bind(self.track_num)
        .bind(self.disc_number)
        .bind(self.track_mbid)
        .bind(self.recording_mbid)
        .bind(self.has_fcc.as_str())
        .bind(self.holding_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn holding(&self, pool: &PgPool) -> DbResult<Holding> {
        Holding::find(pool, self.holding_id).await
    }

    /// Key/value metadata attached to this track, ordered by key.
    pub async fn metadata(&self, pool: &PgPool) -> DbResult<Vec<TrackMetadata>> {
        let rows = sqlx::query("SELECT * FROM track_metadata WHERE track_id = $1 ORDER BY key")
            .bind(self.id)
            .fetch_all(pool)
            .await?;
        rows.iter().map(TrackMetadata::from_row).collect()
    }
}

/// A key/value pair attached to a track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: Uuid,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    pub key: String,
    pub value: String,
    pub track_id: Uuid,
}

impl TrackMetadata {
    pub fn from_row(row: &PgRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            added_by: row.try_get("added_by")?,
            added_at: row.try_get("added_at")?,
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            track_id: row.try_get("track_id")?,
        })
    }

    pub async fn insert(&self, pool: &PgPool) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO track_metadata (id, added_by, added_at, key, value, track_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(self.id)
        .bind(&self.added_by)
        .bind(self.added_at)
        .bind(&self.key)
        .bind(&self.value)
        .bind(self.track_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn track(&self, pool: &PgPool) -> DbResult<Track> {
        Track::find(pool, self.track_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_group_display() {
        let group = HoldingGroup {
            id: Uuid::nil(),
            added_by: "dj".to_string(),
            added_at: Utc::now(),
            album_title: "Blue Train".to_string(),
            album_artist: "John Coltrane".to_string(),
            releasegroup_mbid: None,
            description: None,
            active: true,
            stack_id: Uuid::nil(),
        };
        assert_eq!(
            group.to_string(),
            "Blue Train by John Coltrane <00000000-0000-0000-0000-000000000000>"
        );
    }
}
