//! First-boot data: the admin account and the default category list.

use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Category, Role};
use crate::identity::{new_user, password::hash_password};
use crate::slug::slugify;
use crate::state::AppState;

pub const DEFAULT_CATEGORIES: [&str; 21] = [
    ".NET",
    "AI",
    "Blockchain",
    "Blog",
    "Business",
    "Data Engineering",
    "DBI",
    "Golang",
    "Java",
    "JavaScript",
    "Mobile App Development",
    "MVP",
    "Personal",
    "Programming & Development",
    "Python",
    "React",
    "Software Development",
    "SQL Server",
    "Staff Augmentation",
    "Technology",
    "Web",
];

/// Idempotent: the admin is created only if its email is free, and
/// categories only into an empty table.
pub async fn seed_admin_and_categories(state: &AppState) -> anyhow::Result<()> {
    seed_admin(state).await?;
    seed_categories(state).await?;
    Ok(())
}

async fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password)
    else {
        tracing::info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed");
        return Ok(());
    };

    let email = email.trim().to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(password.clone(), state.config.bcrypt_cost).await?;
    let admin = new_user("Admin", &email, password_hash, Role::Admin);
    state.store.insert_user(&admin).await?;

    tracing::info!(email = %email, "seeded admin");
    Ok(())
}

async fn seed_categories(state: &AppState) -> anyhow::Result<()> {
    if state.store.count_categories().await? > 0 {
        return Ok(());
    }

    let now = Utc::now();
    for name in DEFAULT_CATEGORIES {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            created_at: now,
            updated_at: now,
        };
        state.store.insert_category(&category).await?;
    }

    tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded categories");
    Ok(())
}
