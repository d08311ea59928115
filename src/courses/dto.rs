use serde::{Deserialize, Serialize};

use crate::courses::repo::{Course, Lecture};

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Lecture media arrives as raw bytes alongside the metadata; the handler
/// pushes them to the media store and persists only the returned handles.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLectureRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub media: Option<serde_bytes::ByteBuf>,
    #[serde(default)]
    pub media_content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub success: bool,
    pub message: String,
    pub courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub success: bool,
    pub message: String,
    pub course: Course,
}

#[derive(Debug, Serialize)]
pub struct LectureListResponse {
    pub success: bool,
    pub message: String,
    pub lectures: Vec<Lecture>,
}

#[derive(Debug, Serialize)]
pub struct LectureResponse {
    pub success: bool,
    pub message: String,
    pub lecture: Lecture,
}
