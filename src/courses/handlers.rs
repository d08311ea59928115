use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::MessageResponse,
        extractors::{load_current_user, AuthUser},
        guards::{require_active_subscription, require_role},
        repo_types::Role,
    },
    courses::{
        dto::{
            CourseListResponse, CourseResponse, CreateCourseRequest, CreateLectureRequest,
            LectureListResponse, LectureResponse,
        },
        repo::{Course, Lecture},
    },
    error::ApiError,
    media::ext_from_mime,
    state::AppState,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/:id/lectures",
            get(list_lectures).post(create_lecture),
        )
        .route(
            "/courses/:id/lectures/:lecture_id",
            delete(delete_lecture),
        )
}

/// Public catalog; no credential required.
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<CourseListResponse>, ApiError> {
    let courses = Course::list(&state.db).await?;
    Ok(Json(CourseListResponse {
        success: true,
        message: "All courses".into(),
        courses,
    }))
}

/// Lecture content is paid: active subscription or ADMIN.
#[instrument(skip(state))]
pub async fn list_lectures(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<LectureListResponse>, ApiError> {
    let user = load_current_user(&state, user_id).await?;
    require_active_subscription(&user)?;

    let Some(_course) = Course::find_by_id(&state.db, course_id).await? else {
        return Err(ApiError::not_found("No such course found with that ID"));
    };

    let lectures = Lecture::list_by_course(&state.db, course_id).await?;
    Ok(Json(LectureListResponse {
        success: true,
        message: "Course lectures fetched successfully".into(),
        lectures,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let user = load_current_user(&state, user_id).await?;
    require_role(&user, &[Role::Admin])?;

    if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }

    let course = Course::create(
        &state.db,
        payload.title.trim(),
        payload.description.trim(),
        payload.category.trim(),
        user.id,
    )
    .await?;

    info!(course_id = %course.id, created_by = %user.id, "course created");
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            success: true,
            message: "Course created successfully".into(),
            course,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_lecture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(course_id): Path<Uuid>,
    Json(mut payload): Json<CreateLectureRequest>,
) -> Result<(StatusCode, Json<LectureResponse>), ApiError> {
    let user = load_current_user(&state, user_id).await?;
    require_role(&user, &[Role::Admin])?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Lecture title is required"));
    }
    let Some(_course) = Course::find_by_id(&state.db, course_id).await? else {
        return Err(ApiError::not_found("No such course found with that ID"));
    };

    let mut media_public_id = None;
    let mut media_url = None;
    if let Some(media) = payload.media.take() {
        let ct = payload
            .media_content_type
            .as_deref()
            .unwrap_or("video/mp4");
        let ext = ext_from_mime(ct)
            .ok_or_else(|| ApiError::validation(format!("Unsupported media type {ct}")))?;
        let key = format!("lectures/{}/{}.{}", course_id, Uuid::new_v4(), ext);
        let obj = state
            .media
            .upload(&key, Bytes::from(media.into_vec()), ct)
            .await
            .map_err(ApiError::upstream)?;
        media_public_id = Some(obj.public_id);
        media_url = Some(obj.secure_url);
    }

    let lecture = Lecture::create(
        &state.db,
        course_id,
        payload.title.trim(),
        payload.description.trim(),
        media_public_id.as_deref(),
        media_url.as_deref(),
    )
    .await?;

    info!(course_id = %course_id, lecture_id = %lecture.id, "lecture created");
    Ok((
        StatusCode::CREATED,
        Json(LectureResponse {
            success: true,
            message: "Lecture added successfully".into(),
            lecture,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn delete_lecture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((course_id, lecture_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = load_current_user(&state, user_id).await?;
    require_role(&user, &[Role::Admin])?;

    let Some(media_public_id) = Lecture::delete(&state.db, course_id, lecture_id).await? else {
        return Err(ApiError::not_found("No such lecture found with that ID"));
    };

    // The DB row is gone either way; a media-store failure is reported so the
    // orphaned object can be cleaned up by retrying.
    if let Some(public_id) = media_public_id {
        if let Err(e) = state.media.delete(&public_id).await {
            warn!(lecture_id = %lecture_id, public_id = %public_id, error = %e, "lecture media delete failed");
            return Err(ApiError::upstream(e));
        }
    }

    info!(course_id = %course_id, lecture_id = %lecture_id, "lecture deleted");
    Ok(Json(MessageResponse::ok("Lecture removed successfully")))
}
