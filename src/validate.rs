// Validation boundary for sync submissions. Everything here runs before any
// store read, so a rejected request never changes state. The reconciler
// assumes inputs that passed these checks.

use thiserror::Error;

use crate::models::SyncProgressReq;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("lesson id must not be blank")]
    BlankLessonId,
    #[error("negative time for lesson {0}")]
    NegativeTime(String),
}

pub fn validate_sync(req: &SyncProgressReq) -> Result<(), ValidationError> {
    if req.user_id.trim().is_empty() {
        return Err(ValidationError::MissingField("userId"));
    }
    if req.course_id.trim().is_empty() {
        return Err(ValidationError::MissingField("courseId"));
    }

    for lesson_id in &req.progress.completed_lesson_ids {
        if lesson_id.trim().is_empty() {
            return Err(ValidationError::BlankLessonId);
        }
    }
    if let Some(last) = &req.progress.last_lesson_id {
        if last.trim().is_empty() {
            return Err(ValidationError::BlankLessonId);
        }
    }
    for (lesson_id, &secs) in &req.progress.lesson_times {
        if lesson_id.trim().is_empty() {
            return Err(ValidationError::BlankLessonId);
        }
        if secs < 0 {
            return Err(ValidationError::NegativeTime(lesson_id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgressUpdate;

    fn req(user_id: &str, course_id: &str, progress: ProgressUpdate) -> SyncProgressReq {
        SyncProgressReq {
            user_id: user_id.into(),
            course_id: course_id.into(),
            progress,
            client_updated_at: None,
        }
    }

    #[test]
    fn blank_ids_are_rejected() {
        let err = validate_sync(&req("", "c1", ProgressUpdate::default())).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("userId"));

        let err = validate_sync(&req("u1", "  ", ProgressUpdate::default())).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("courseId"));
    }

    #[test]
    fn negative_lesson_time_is_rejected() {
        let progress = ProgressUpdate {
            lesson_times: [("L1".to_string(), -5i64)].into_iter().collect(),
            ..Default::default()
        };
        let err = validate_sync(&req("u1", "c1", progress)).unwrap_err();
        assert_eq!(err, ValidationError::NegativeTime("L1".into()));
    }

    #[test]
    fn well_formed_request_passes() {
        let progress = ProgressUpdate {
            completed_lesson_ids: vec!["L1".into()],
            lesson_times: [("L1".to_string(), 30i64)].into_iter().collect(),
            last_lesson_id: Some("L1".into()),
        };
        assert_eq!(validate_sync(&req("u1", "c1", progress)), Ok(()));
    }
}
