//! Subject business logic - Handles all subject-related operations.

use crate::{
    core::{attendance, classroom},
    entities::{Subject, classroom as classroom_entity, subject},
    errors::{Error, Result},
};
use sea_orm::{JoinType, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Retrieves all subjects taught in a classroom year, in creation order.
pub async fn get_subjects_by_year<C>(db: &C, year: &str) -> Result<Vec<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find()
        .join(JoinType::InnerJoin, subject::Relation::Classroom.def())
        .filter(classroom_entity::Column::Year.eq(year))
        .order_by_asc(subject::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a subject by its unique ID.
pub async fn get_subject_by_id<C>(db: &C, subject_id: i64) -> Result<Option<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find_by_id(subject_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_subject_by_id`], but a missing id is an error.
pub async fn require_subject_by_id<C>(db: &C, subject_id: i64) -> Result<subject::Model>
where
    C: ConnectionTrait,
{
    get_subject_by_id(db, subject_id)
        .await?
        .ok_or_else(|| Error::SubjectNotFound {
            key: subject_id.to_string(),
        })
}

/// Adds a subject to a classroom.
pub async fn create_subject(
    db: &DatabaseConnection,
    classroom_id: i64,
    name: String,
) -> Result<subject::Model> {
    let name = normalized_name(&name)?;
    let classroom = classroom::require_classroom_by_id(db, classroom_id).await?;

    let subject = subject::ActiveModel {
        name: Set(name),
        classroom_id: Set(classroom.id),
        ..Default::default()
    };

    let result = subject.insert(db).await?;
    info!("Added subject '{}' to {}", result.name, classroom.year);
    Ok(result)
}

/// Renames a subject and/or moves it to another classroom.
pub async fn update_subject(
    db: &DatabaseConnection,
    subject_id: i64,
    classroom_id: i64,
    name: String,
) -> Result<subject::Model> {
    let name = normalized_name(&name)?;
    let existing = require_subject_by_id(db, subject_id).await?;
    let classroom = classroom::require_classroom_by_id(db, classroom_id).await?;

    let mut active: subject::ActiveModel = existing.into();
    active.name = Set(name);
    active.classroom_id = Set(classroom.id);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a subject after removing every attendance row recorded for it.
#[instrument(skip(db))]
pub async fn delete_subject(
    db: &DatabaseConnection,
    subject_id: i64,
) -> Result<(subject::Model, u64)> {
    let txn = db.begin().await?;

    let subject = require_subject_by_id(&txn, subject_id).await?;
    let removed = attendance::delete_attendance_for_subjects(&txn, &[subject.id]).await?;
    Subject::delete_by_id(subject.id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted subject '{}' and {} attendance rows",
        subject.name, removed
    );
    Ok((subject, removed))
}

fn normalized_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Subject name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}
