use atelier_app::{
    auth::{AuthTokenKey, PgAuthService},
    database,
    domain::CustomerUuid,
};
use clap::Args;
use jiff::Timestamp;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct IssueTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Server-side token signing key
    #[arg(long, env = "AUTH_TOKEN_KEY", hide_env_values = true)]
    auth_token_key: String,

    /// Customer the token should authenticate as
    #[arg(long)]
    customer_uuid: Uuid,

    /// Optional token expiration timestamp (RFC 3339)
    #[arg(long)]
    expires_at: Option<String>,
}

pub(crate) async fn run(args: IssueTokenArgs) -> Result<(), String> {
    let expires_at = args
        .expires_at
        .as_deref()
        .map(|value| {
            value
                .parse::<Timestamp>()
                .map_err(|error| format!("invalid expires-at timestamp: {error}"))
        })
        .transpose()?;

    if let Some(expires_at) = expires_at.as_ref()
        && *expires_at <= Timestamp::now()
    {
        return Err("expires-at must be in the future".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAuthService::new(pool, AuthTokenKey::new(args.auth_token_key));

    let issued = service
        .issue_api_token(CustomerUuid::from_uuid(args.customer_uuid), expires_at)
        .await
        .map_err(|error| format!("failed to issue token: {error}"))?;

    println!("token_uuid: {}", issued.metadata.uuid);
    println!("customer_uuid: {}", issued.metadata.customer_uuid);
    println!("token_created_at: {}", issued.metadata.created_at);
    if let Some(expires_at) = issued.metadata.expires_at {
        println!("token_expires_at: {expires_at}");
    }
    println!("api_token: {}", issued.token);
    println!("store this token now; it is only shown once");

    Ok(())
}
