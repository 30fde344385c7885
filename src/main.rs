use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use storefront_session::config::{config_schema, load_config, ConfigV1};
use storefront_session::error::{AuthenticationError, BooksError, LoggingError, StartupError};
use storefront_session::models::{Book, TokenClaims};
use storefront_session::session::{guard, AccessDecision};
use storefront_session::startup::build_context;
use storefront_session::state::AppContext;
use storefront_session::utils::logger::init_logging;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not load configuration: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("could not initialise logging: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Auth(#[from] AuthenticationError),
    #[error(transparent)]
    Books(#[from] BooksError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not logged in")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Bookstore session client", version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = "STOREFRONT_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session.
    Login {
        username: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in as it.
    Signup {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Ask for the ADMIN role.
        #[arg(long)]
        admin: bool,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Show the claims carried by the current token.
    Claims,
    /// Check whether the current user may enter a view.
    CheckAccess {
        /// Role the view requires; any logged-in user passes without one.
        role: Option<String>,
    },
    Books(BooksCommand),
    /// Print the configuration JSON schema.
    Schema,
}

#[derive(Args, Debug)]
struct BooksCommand {
    #[command(subcommand)]
    command: BooksSubcommand,
}

#[derive(Subcommand, Debug)]
enum BooksSubcommand {
    List,
    Get { id: String },
    Create(BookArgs),
    Update {
        id: String,
        #[command(flatten)]
        book: BookArgs,
    },
    Delete { id: String },
}

#[derive(Args, Debug)]
struct BookArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    price: f64,
    #[arg(long, default_value_t = 0)]
    quantity: u32,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    isbn: Option<String>,
    /// Publication date as YYYY-MM-DD.
    #[arg(long)]
    published_date: Option<NaiveDate>,
    #[arg(long)]
    publisher: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
}

impl From<BookArgs> for Book {
    fn from(args: BookArgs) -> Self {
        Book {
            id: None,
            title: args.title,
            author: args.author,
            description: args.description,
            price: args.price,
            quantity: args.quantity,
            isbn: args.isbn,
            published_date: args.published_date,
            publisher: args.publisher,
            category: args.category,
            image_url: args.image_url,
        }
    }
}

#[derive(Serialize)]
struct WhoAmI {
    username: String,
    roles: Vec<String>,
    is_admin: bool,
    persistent: bool,
}

#[derive(Serialize)]
struct ClaimsView {
    subject: Option<String>,
    issuer: Option<String>,
    email: Option<String>,
    groups: Vec<String>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
    attributes: BTreeMap<String, String>,
}

impl From<TokenClaims> for ClaimsView {
    fn from(claims: TokenClaims) -> Self {
        ClaimsView {
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            expired: claims.is_expired(Utc::now()),
            attributes: claims.attributes(),
            subject: claims.sub.or(claims.upn),
            issuer: claims.iss,
            email: claims.email,
            groups: claims.groups.unwrap_or_default(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    if let Command::Schema = cli.command {
        println!("{}", config_schema()?);
        return Ok(ExitCode::SUCCESS);
    }

    let config: ConfigV1 = load_config(&cli.config).map_err(Box::new)?;
    init_logging(&config.logging)?;
    debug!("Loaded configuration from {}", cli.config.display());

    let context = build_context(Arc::new(config))?;
    execute(&context, cli.command).await
}

async fn execute(context: &AppContext, command: Command) -> Result<ExitCode, CliError> {
    let session = &context.session;
    match command {
        Command::Login { username, password } => {
            let identity = session.login(&username, &password).await?;
            println!("Logged in as {}", identity.username);
        }
        Command::Signup {
            username,
            email,
            password,
            admin,
        } => {
            let identity = session.signup(&username, &email, &password, admin).await?;
            println!(
                "Signed up as {}{}",
                identity.username,
                if identity.is_admin() { " (admin)" } else { "" }
            );
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            let identity = session.identity().ok_or(CliError::NotLoggedIn)?;
            let whoami = WhoAmI {
                is_admin: identity.is_admin(),
                username: identity.username,
                roles: identity.roles.into_iter().collect(),
                persistent: session.is_persistent(),
            };
            println!("{}", serde_json::to_string_pretty(&whoami)?);
        }
        Command::Claims => {
            if !session.is_authenticated() {
                return Err(CliError::NotLoggedIn);
            }
            match session.claims() {
                Some(claims) => {
                    let view = ClaimsView::from(claims);
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                None => println!("Token carries no readable claims"),
            }
        }
        Command::CheckAccess { role } => {
            let decision = guard(session, role.as_deref());
            println!("{}", access_message(decision));
            return Ok(ExitCode::from(access_status(decision)));
        }
        Command::Books(books) => run_books(context, books.command).await?,
        Command::Schema => println!("{}", config_schema()?),
    }
    Ok(ExitCode::SUCCESS)
}

/// Process status for `check-access`: 0 when granted, 1 when denied.
fn access_status(decision: AccessDecision) -> u8 {
    if decision.is_granted() {
        0
    } else {
        1
    }
}

fn access_message(decision: AccessDecision) -> String {
    match decision.redirect_path() {
        None => "granted".to_string(),
        Some(path) => format!("denied, redirect to {}", path),
    }
}

async fn run_books(context: &AppContext, command: BooksSubcommand) -> Result<(), CliError> {
    let books = &context.books;
    match command {
        BooksSubcommand::List => {
            println!("{}", serde_json::to_string_pretty(&books.list_books().await?)?);
        }
        BooksSubcommand::Get { id } => {
            println!("{}", serde_json::to_string_pretty(&books.get_book(&id).await?)?);
        }
        BooksSubcommand::Create(args) => {
            let created = books.create_book(&context.token(), &args.into()).await?;
            print_saved(created)?;
        }
        BooksSubcommand::Update { id, book } => {
            let updated = books.update_book(&context.token(), &id, &book.into()).await?;
            print_saved(updated)?;
        }
        BooksSubcommand::Delete { id } => {
            books.delete_book(&context.token(), &id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn print_saved(book: Option<Book>) -> Result<(), CliError> {
    match book {
        Some(book) => println!("{}", serde_json::to_string_pretty(&book)?),
        None => println!("Saved"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_session::config::{ApiConfig, StorageBackend, StorageConfig};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("storefront").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_login_and_signup() {
        let cli = parse(&["--config", "alt.yaml", "login", "alice", "--password", "pw"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.yaml"));
        match cli.command {
            Command::Login { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = parse(&[
            "signup", "eve", "--email", "eve@example.com", "--password", "pw", "--admin",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Signup { admin: true, .. }));

        assert!(parse(&["signup", "eve", "--password", "pw"]).is_err(), "email is required");
    }

    #[test]
    fn test_parse_check_access_role_is_optional() {
        let cli = parse(&["check-access"]).unwrap();
        assert!(matches!(cli.command, Command::CheckAccess { role: None }));

        let cli = parse(&["check-access", "ADMIN"]).unwrap();
        match cli.command {
            Command::CheckAccess { role } => assert_eq!(role.as_deref(), Some("ADMIN")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_books_update() {
        let cli = parse(&[
            "books", "update", "b1", "--title", "Howl", "--author", "Allen Ginsberg", "--price",
            "7.5", "--published-date", "1956-11-01",
        ])
        .unwrap();
        let Command::Books(books) = cli.command else {
            panic!("expected books command");
        };
        match books.command {
            BooksSubcommand::Update { id, book } => {
                assert_eq!(id, "b1");
                let book = Book::from(book);
                assert_eq!(book.quantity, 0);
                assert_eq!(book.published_date, NaiveDate::from_ymd_opt(1956, 11, 1));
            }
            other => panic!("unexpected books command: {other:?}"),
        }

        assert!(parse(&["books", "update", "b1", "--title", "Howl"]).is_err());
        assert!(parse(&["books", "get"]).is_err(), "id is required");
        assert!(parse(&["books", "create", "--title", "x", "--author", "y", "--price", "cheap"]).is_err());
    }

    #[test]
    fn test_access_status_codes() {
        assert_eq!(access_status(AccessDecision::Granted), 0);
        assert_eq!(access_status(AccessDecision::RedirectToLogin), 1);
        assert_eq!(access_status(AccessDecision::Unauthorized), 1);
        assert_eq!(access_message(AccessDecision::Granted), "granted");
        assert_eq!(
            access_message(AccessDecision::Unauthorized),
            "denied, redirect to /unauthorized"
        );
    }

    #[tokio::test]
    async fn test_check_access_logged_out_fails() {
        let config = ConfigV1 {
            api: ApiConfig {
                base_url: "http://127.0.0.1:1".to_string(),
            },
            storage: StorageConfig {
                enabled: true,
                backend: Some(StorageBackend::Memory),
            },
            ..ConfigV1::default()
        };
        let context = build_context(Arc::new(config)).unwrap();
        let code = execute(&context, Command::CheckAccess { role: None }).await.unwrap();
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));

        let err = execute(&context, Command::Whoami).await.unwrap_err();
        assert!(matches!(err, CliError::NotLoggedIn));
    }
}
