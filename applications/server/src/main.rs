/// Jukebox Server - venue music voting and playback rooms
use clap::{Parser, Subcommand, ValueEnum};
use jukebox_core::{Identity, PatronId, Role, RoomId};
use jukebox_server::{api, config::ServerConfig, services::JwtSessionDirectory, state::AppState};
use jukebox_spotify::{MusicService, SpotifyClient};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jukebox-server")]
#[command(about = "Venue jukebox: shared vote queue driving a remote player", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long, global = true, env = "JUKEBOX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve,
    /// Issue a session token
    IssueToken {
        /// Patron identifier
        #[arg(short, long)]
        patron: String,
        /// Session role
        #[arg(short, long, value_enum, default_value_t = RoleArg::Patron)]
        role: RoleArg,
        /// Venue (room) a clerk controls
        #[arg(short, long)]
        venue: Option<String>,
        /// Token lifetime in hours
        #[arg(long)]
        hours: Option<u64>,
    },
    /// Print the authorization URL for a room
    AuthorizeUrl {
        /// Room (venue) identifier
        #[arg(short, long)]
        room: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Patron,
    Clerk,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Patron => Role::Patron,
            RoleArg::Clerk => Role::Clerk,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jukebox_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::IssueToken {
            patron,
            role,
            venue,
            hours,
        } => {
            issue_token(&config, patron, role.into(), venue, hours)?;
        }
        Commands::AuthorizeUrl { room } => {
            authorize_url(&config, &room)?;
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Jukebox Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let service: Arc<dyn MusicService> = Arc::new(SpotifyClient::new(config.spotify_config())?);
    let sessions = Arc::new(JwtSessionDirectory::new(
        config.session.jwt_secret.clone(),
        config.session.jwt_expiration_hours,
    ));

    let app_state = AppState::new(&config, service, sessions);

    Arc::clone(&app_state.reconciler).start();

    let app = api::router(app_state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn issue_token(
    config: &ServerConfig,
    patron: String,
    role: Role,
    venue: Option<String>,
    hours: Option<u64>,
) -> anyhow::Result<()> {
    if config.session.jwt_secret.is_empty() {
        anyhow::bail!("JWT secret is required (set JUKEBOX_SESSION__JWT_SECRET)");
    }
    if role == Role::Clerk && venue.is_none() {
        anyhow::bail!("A clerk token needs --venue");
    }

    let identity = Identity {
        patron_id: PatronId::new(patron),
        role,
        venue: venue.map(RoomId::new),
    };

    let sessions = JwtSessionDirectory::new(
        config.session.jwt_secret.clone(),
        hours.unwrap_or(config.session.jwt_expiration_hours),
    );
    println!("{}", sessions.issue(&identity)?);

    Ok(())
}

fn authorize_url(config: &ServerConfig, room: &str) -> anyhow::Result<()> {
    let client = SpotifyClient::new(config.spotify_config())?;
    println!("{}", client.authorize_url(room));
    Ok(())
}
