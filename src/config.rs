use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    pub key_id: String,
    pub key_secret: String,
    pub plan_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from_address: String,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub billing: BillingConfig,
    pub mail: MailConfig,
    pub media: MediaConfig,
    pub reset_token_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "coursehub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "coursehub-users".into()),
            // Session tokens live 7 days unless overridden.
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let billing = BillingConfig {
            key_id: std::env::var("BILLING_KEY_ID")?,
            key_secret: std::env::var("BILLING_KEY_SECRET")?,
            plan_id: std::env::var("BILLING_PLAN_ID")?,
            api_base: std::env::var("BILLING_API_BASE")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".into()),
        };
        let mail = MailConfig {
            from_address: std::env::var("MAIL_FROM")?,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
        };
        let media = MediaConfig {
            endpoint: std::env::var("MEDIA_ENDPOINT")?,
            bucket: std::env::var("MEDIA_BUCKET")?,
            access_key: std::env::var("MEDIA_ACCESS_KEY")?,
            secret_key: std::env::var("MEDIA_SECRET_KEY")?,
            region: std::env::var("MEDIA_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        let reset_token_ttl_minutes = std::env::var("RESET_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(15);
        Ok(Self {
            database_url,
            jwt,
            billing,
            mail,
            media,
            reset_token_ttl_minutes,
        })
    }
}
