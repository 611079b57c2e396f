use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_minutes: i64,
    pub verification_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub resend_api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        // A missing signing secret must fail loudly here, never fall back to
        // a built-in default.
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "notably".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "notably-users".into()),
            session_ttl_minutes: std::env::var("JWT_SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            verification_ttl_minutes: std::env::var("JWT_VERIFICATION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(5),
        };
        let mail = MailConfig {
            resend_api_key: std::env::var("RESEND_API_KEY")?,
            from_address: std::env::var("RESEND_EMAIL_ADDRESS")
                .map(|addr| format!("Notes App <{addr}>"))?,
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
        })
    }
}
