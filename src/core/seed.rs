//! First-boot data: the default administrator and the configured classroom years.
//!
//! Safe to run on every start; anything that already exists is left alone.

use crate::{
    config::SeedConfig,
    core::{
        classroom,
        user::{self, Role},
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument};

/// What a seeding run actually created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Whether the default admin account was created
    pub admin_created: bool,
    /// Classroom years created in this run
    pub classrooms_created: Vec<String>,
}

/// Creates the default admin and each missing classroom year.
#[instrument(skip(db, seed))]
pub async fn seed_defaults(db: &DatabaseConnection, seed: &SeedConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if user::get_user_by_username(db, seed.admin_username.trim())
        .await?
        .is_none()
    {
        user::create_user(db, &seed.admin_username, &seed.admin_password, Role::Admin).await?;
        report.admin_created = true;
    } else {
        debug!("Admin user '{}' already present", seed.admin_username);
    }

    for year in &seed.classroom_years {
        if classroom::get_classroom_by_year(db, year.trim()).await?.is_none() {
            let created = classroom::create_classroom(db, year.clone()).await?;
            report.classrooms_created.push(created.year);
        }
    }

    info!(
        "Seeding complete: admin created = {}, {} classroom(s) created",
        report.admin_created,
        report.classrooms_created.len()
    );
    Ok(report)
}
