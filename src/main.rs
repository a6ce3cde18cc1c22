use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blogicum::blog::catalog::{self, NewCategory};
use blogicum::config::{Cli, Command, Config};
use blogicum::db;
use blogicum::routes;
use blogicum::state::{AppState, DbPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        command => manage(&pool, command),
    }
}

async fn serve(pool: DbPool, config: Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(config.media_path())?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = routes::app(AppState { db: pool, config });

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Catalog maintenance from the command line.
fn manage(pool: &DbPool, command: Command) -> anyhow::Result<()> {
    let conn = pool.get()?;
    match command {
        Command::Serve => {}
        Command::AddCategory {
            slug,
            title,
            description,
            hidden,
        } => {
            let category = catalog::create_category(
                &conn,
                &NewCategory {
                    title: &title,
                    description: &description,
                    slug: &slug,
                    is_published: !hidden,
                },
            )
            .with_context(|| format!("creating category {:?}", slug))?;
            tracing::info!("Created category {} ({})", category.slug, category.id);
        }
        Command::AddLocation { name, hidden } => {
            let location = catalog::create_location(&conn, &name, !hidden)?;
            tracing::info!("Created location {} ({})", location.name, location.id);
        }
        Command::DeleteCategory { slug } => {
            if catalog::delete_category(&conn, &slug)? {
                tracing::info!("Deleted category {}", slug);
            } else {
                anyhow::bail!("no category with slug {:?}", slug);
            }
        }
        Command::DeleteLocation { id } => {
            if catalog::delete_location(&conn, &id)? {
                tracing::info!("Deleted location {}", id);
            } else {
                anyhow::bail!("no location with id {:?}", id);
            }
        }
        Command::ListCategories => {
            for category in catalog::list_categories(&conn)? {
                println!(
                    "{}\t{}\t{}",
                    category.slug,
                    publication_label(category.is_published),
                    category.title
                );
            }
        }
        Command::ListLocations => {
            for location in catalog::list_locations(&conn)? {
                println!(
                    "{}\t{}\t{}",
                    location.id,
                    publication_label(location.is_published),
                    location.name
                );
            }
        }
        Command::PublishCategory { slug } => set_category(&conn, &slug, true)?,
        Command::UnpublishCategory { slug } => set_category(&conn, &slug, false)?,
        Command::PublishLocation { id } => set_location(&conn, &id, true)?,
        Command::UnpublishLocation { id } => set_location(&conn, &id, false)?,
    }
    Ok(())
}

fn set_category(conn: &rusqlite::Connection, slug: &str, published: bool) -> anyhow::Result<()> {
    if !catalog::set_category_published(conn, slug, published)? {
        anyhow::bail!("no category with slug {:?}", slug);
    }
    tracing::info!("Category {} is now {}", slug, publication_label(published));
    Ok(())
}

fn set_location(conn: &rusqlite::Connection, id: &str, published: bool) -> anyhow::Result<()> {
    if !catalog::set_location_published(conn, id, published)? {
        anyhow::bail!("no location with id {:?}", id);
    }
    tracing::info!("Location {} is now {}", id, publication_label(published));
    Ok(())
}

fn publication_label(published: bool) -> &'static str {
    if published {
        "published"
    } else {
        "hidden"
    }
}
