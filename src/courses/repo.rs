use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: Uuid,
    pub lecture_count: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub media_public_id: Option<String>,
    pub media_url: Option<String>,
    pub position: i32,
    pub created_at: OffsetDateTime,
}

const COURSE_COLUMNS: &str = "c.id, c.title, c.description, c.category, c.created_by, \
     (SELECT count(*) FROM lectures l WHERE l.course_id = c.id) AS lecture_count, c.created_at";

impl Course {
    /// Catalog listing; lectures stay behind the subscription gate.
    pub async fn list(db: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c ORDER BY c.created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        description: &str,
        category: &str,
        created_by: Uuid,
    ) -> Result<Course, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, category, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, category, created_by,
                      0::bigint AS lecture_count, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(created_by)
        .fetch_one(db)
        .await
    }
}

impl Lecture {
    pub async fn list_by_course(db: &PgPool, course_id: Uuid) -> Result<Vec<Lecture>, sqlx::Error> {
        sqlx::query_as::<_, Lecture>(
            r#"
            SELECT id, course_id, title, description, media_public_id, media_url,
                   position, created_at
            FROM lectures
            WHERE course_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(db)
        .await
    }

    /// Append a lecture at the end of the course's sequence.
    pub async fn create(
        db: &PgPool,
        course_id: Uuid,
        title: &str,
        description: &str,
        media_public_id: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<Lecture, sqlx::Error> {
        sqlx::query_as::<_, Lecture>(
            r#"
            INSERT INTO lectures (course_id, title, description, media_public_id, media_url, position)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT COALESCE(MAX(position), 0) + 1 FROM lectures WHERE course_id = $1))
            RETURNING id, course_id, title, description, media_public_id, media_url,
                      position, created_at
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(description)
        .bind(media_public_id)
        .bind(media_url)
        .fetch_one(db)
        .await
    }

    /// Delete a lecture, returning its media key so the caller can clean up
    /// the media store.
    pub async fn delete(
        db: &PgPool,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            r#"
            DELETE FROM lectures
            WHERE id = $1 AND course_id = $2
            RETURNING media_public_id
            "#,
        )
        .bind(lecture_id)
        .bind(course_id)
        .fetch_optional(db)
        .await
    }
}
