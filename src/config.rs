use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub db: DbConfig,
    pub admin: AdminConfig,
    pub cashfree: CashfreeConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub password: String,
    pub header: String,
}

#[derive(Clone, Debug)]
pub struct CashfreeConfig {
    pub app_id: String,
    pub secret: String,
    pub env: String,
}

impl CashfreeConfig {
    pub fn base_url(&self) -> &'static str {
        if self.env == "production" {
            "https://api.cashfree.com/pg"
        } else {
            "https://sandbox.cashfree.com/pg"
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 8000),
            cors_origins: parse_origins(&env_or("CORS_ORIGINS", "*")),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "turf"),
                user: env_or("DB_USER", "turf"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 1),
                pool_max: env_or_parse("DB_POOL_MAX", 10),
            },
            admin: AdminConfig {
                password: env_or("ADMIN_PASSWORD", "cricket123"),
                header: "x-admin-password".to_string(),
            },
            cashfree: CashfreeConfig {
                app_id: env_or("CASHFREE_APP_ID", ""),
                secret: env_or("CASHFREE_SECRET", ""),
                env: env_or("CASHFREE_ENV", "production"),
            },
        }
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return vec!["*".to_string()];
    }
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(parse_origins(" * "), vec!["*"]);
    }

    #[test]
    fn origin_list_is_trimmed() {
        let origins = parse_origins("https://turf.example.com, http://localhost:5173 ,");
        assert_eq!(
            origins,
            vec!["https://turf.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn cashfree_base_url_by_env() {
        let prod = CashfreeConfig {
            app_id: String::new(),
            secret: String::new(),
            env: "production".into(),
        };
        assert_eq!(prod.base_url(), "https://api.cashfree.com/pg");

        let sandbox = CashfreeConfig {
            env: "sandbox".into(),
            ..prod
        };
        assert_eq!(sandbox.base_url(), "https://sandbox.cashfree.com/pg");
    }
}
