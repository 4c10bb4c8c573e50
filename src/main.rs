use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use clientele::auth::BearerTokenPolicy;
use clientele::config::ServerConfig;
use clientele::server::{AppState, create_router};
use clientele::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "clientele")]
#[command(about = "A self-hostable CRM server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip token verification and act as this email's account.
        /// Creates the account on first use. Development only.
        #[cfg(feature = "insecure-dev-auth")]
        #[arg(long)]
        dev_identity: Option<String>,
    },
}

#[cfg(feature = "insecure-dev-auth")]
fn dev_identity_policy(
    store: &SqliteStore,
    email: &str,
) -> anyhow::Result<clientele::auth::FixedIdentityPolicy> {
    use chrono::Utc;
    use clientele::auth::{FixedIdentityPolicy, hash_password};
    use clientele::types::{Identity, User};
    use uuid::Uuid;

    let user = match store.get_user_by_email(email)? {
        Some(user) => user,
        None => {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4().to_string(),
                name: email.to_string(),
                email: email.to_string(),
                password_hash: hash_password(&Uuid::new_v4().to_string())?,
                created_at: now,
                updated_at: now,
            };
            store.create_user(&user)?;
            user
        }
    };

    tracing::warn!("Authentication DISABLED: all requests act as {}", user.email);
    Ok(FixedIdentityPolicy::new(Identity {
        id: user.id,
        email: user.email,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("clientele=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            #[cfg(feature = "insecure-dev-auth")]
            dev_identity,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;
            let store = Arc::new(store);

            #[cfg(feature = "insecure-dev-auth")]
            let auth: Arc<dyn clientele::auth::AuthPolicy> = match dev_identity {
                Some(email) => Arc::new(dev_identity_policy(store.as_ref(), &email)?),
                None => Arc::new(BearerTokenPolicy),
            };
            #[cfg(not(feature = "insecure-dev-auth"))]
            let auth: Arc<dyn clientele::auth::AuthPolicy> = Arc::new(BearerTokenPolicy);

            let state = Arc::new(AppState::new(store, auth));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
