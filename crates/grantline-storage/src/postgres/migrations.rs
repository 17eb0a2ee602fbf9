use sqlx::PgPool;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_authorizations (
            user_id       BIGINT NOT NULL,
            project_id    BIGINT NOT NULL,
            access_level  SMALLINT NOT NULL,
            is_unique     BOOLEAN NOT NULL DEFAULT false,
            PRIMARY KEY (user_id, project_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Reverse index for project-scoped deletes and per-project listings.
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_project_authorizations_project
        ON project_authorizations (project_id, access_level)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
