use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

use crate::config::Config;
use crate::entity::{client, day, profile, profile_tag, project, tag};

/// Open the SeaORM connection pool described by the config
pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let max = config.database_max_connections.max(1);

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.max_connections(max)
        .min_connections(max.min(5))
        .sqlx_logging(true);

    Database::connect(opt).await
}

/// Create every table (if missing) plus the `(project_id, date)` unique index on days
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Parents before children so foreign keys resolve
    create_table(db, profile::Entity).await?;
    create_table(db, tag::Entity).await?;
    create_table(db, client::Entity).await?;
    create_table(db, project::Entity).await?;
    create_table(db, day::Entity).await?;
    create_table(db, profile_tag::Entity).await?;

    let backend = db.get_database_backend();
    let unique_day = Index::create()
        .name("idx_days_project_date")
        .table(day::Entity)
        .col(day::Column::ProjectId)
        .col(day::Column::Date)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&unique_day)).await?;

    let project_user = Index::create()
        .name("idx_projects_user")
        .table(project::Entity)
        .col(project::Column::UserId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&project_user)).await?;

    let project_parent = Index::create()
        .name("idx_projects_parent")
        .table(project::Entity)
        .col(project::Column::ParentId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&project_parent)).await?;

    let profile_tag_unique = Index::create()
        .name("idx_profile_tags_profile_tag")
        .table(profile_tag::Entity)
        .col(profile_tag::Column::ProfileId)
        .col(profile_tag::Column::TagId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&profile_tag_unique)).await?;

    tracing::info!("Database schema ready");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();

    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
