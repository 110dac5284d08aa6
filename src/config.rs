use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub db_max_overflow: u32,
    /// Recreate the reporting views at startup.
    pub install_views: bool,
    /// Seasons shown in trend charts, current season included.
    pub trend_seasons: usize,
    pub app_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let trend_seasons: usize = env::var("TREND_SEASONS")
            .unwrap_or_else(|_| "5".into())
            .parse()?;
        if trend_seasons == 0 {
            anyhow::bail!("TREND_SEASONS must be at least 1");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            db_pool_size: env::var("DB_POOL_SIZE")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
            db_max_overflow: env::var("DB_MAX_OVERFLOW")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            install_views: match env::var("INSTALL_VIEWS") {
                Ok(v) => parse_bool(&v)
                    .ok_or_else(|| anyhow::anyhow!("Invalid INSTALL_VIEWS value: {}", v))?,
                Err(_) => true,
            },
            trend_seasons,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
        })
    }

    /// Database settings only, for the admin CLI.
    pub fn database_from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: String::new(),
            host: String::new(),
            port: 0,
            db_pool_size: 1,
            db_max_overflow: 1,
            install_views: false,
            trend_seasons: 1,
            app_base_url: String::new(),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" YES "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
