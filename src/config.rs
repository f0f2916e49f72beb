// config.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub environment: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub callback_url: String,
    // Shared secret appended to the registered callback URL as `?token=`
    pub callback_token: Option<String>,
}

impl MpesaConfig {
    pub fn base_url(&self) -> &'static str {
        if self.environment == "production" {
            "https://api.safaricom.co.ke"
        } else {
            "https://sandbox.safaricom.co.ke"
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub admin_email: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    // minutes
    pub jwt_maxage: i64,
    pub port: u16,
    pub app_env: String,
    pub cors_origins: Vec<String>,
    pub mpesa: MpesaConfig,
    pub media: MediaConfig,
    pub smtp: SmtpConfig,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let jwt_maxage = required("JWT_MAXAGE")?;
        let jwt_maxage = jwt_maxage
            .parse::<i64>()
            .map_err(|_| ConfigError::Invalid("JWT_MAXAGE", jwt_maxage))?;

        let port = optional("PORT", "8000");
        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid("PORT", port))?;

        let cors_origins = optional("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mpesa = MpesaConfig {
            environment: optional("MPESA_ENV", "sandbox"),
            consumer_key: optional("MPESA_CONSUMER_KEY", ""),
            consumer_secret: optional("MPESA_CONSUMER_SECRET", ""),
            shortcode: optional("MPESA_SHORTCODE", ""),
            passkey: optional("MPESA_PASSKEY", ""),
            callback_url: optional("MPESA_CALLBACK_URL", ""),
            callback_token: std::env::var("MPESA_CALLBACK_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
        };

        let media = MediaConfig {
            cloud_name: optional("CLOUDINARY_CLOUD_NAME", ""),
            upload_preset: optional("CLOUDINARY_UPLOAD_PRESET", ""),
        };

        let smtp_port = optional("SMTP_PORT", "587");
        let smtp = SmtpConfig {
            host: optional("SMTP_HOST", "localhost"),
            port: smtp_port
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("SMTP_PORT", smtp_port))?,
            username: optional("SMTP_USERNAME", ""),
            password: optional("SMTP_PASSWORD", ""),
            from: optional("MAIL_FROM", "Pharmacy Store <noreply@pharmacy.local>"),
            admin_email: optional("ADMIN_EMAIL", ""),
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            app_env: optional("APP_ENV", "development"),
            cors_origins,
            mpesa,
            media,
            smtp,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
