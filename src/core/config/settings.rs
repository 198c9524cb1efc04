use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_f64,
    parse_u16, parse_u64, parse_u8,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, IepSettings,
    MailSettings, RedisSettings, RuntimeSettings, S3Settings, SecuritySettings, ServerHost,
    ServerPort, ServerSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("LITEREXIA_HOST", "0.0.0.0");
        let port = env_or_default("LITEREXIA_PORT", "5001");

        let environment = parse_environment(
            env_optional("LITEREXIA_ENV").or_else(|| env_optional("NODE_ENV")),
        );
        let strict_config = env_optional("LITEREXIA_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Literexia API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let prefix = env_or_default("API_PREFIX", "/api");

        let secret_key = match env_optional("SECRET_KEY").or_else(|| env_optional("JWT_SECRET")) {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "literexia");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "literexia_db");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "literexia-bucket");
        let s3_region = env_or_default("S3_REGION", "ap-southeast-1");

        let mail_api_url = env_or_default("MAIL_API_URL", "");
        let mail_api_key = env_or_default("MAIL_API_KEY", "");
        let mail_from = env_or_default("MAIL_FROM", "Literexia <no-reply@literexia.local>");
        let mail_timeout_seconds =
            parse_u64("MAIL_TIMEOUT_SECONDS", env_or_default("MAIL_TIMEOUT_SECONDS", "15"))?;

        let passing_threshold =
            parse_f64("IEP_PASSING_THRESHOLD", env_or_default("IEP_PASSING_THRESHOLD", "75"))?;
        let school_year_start_month = parse_u8(
            "IEP_SCHOOL_YEAR_START_MONTH",
            env_or_default("IEP_SCHOOL_YEAR_START_MONTH", "6"),
        )?;
        let report_url_expire_minutes = parse_u64(
            "REPORT_URL_EXPIRE_MINUTES",
            env_or_default("REPORT_URL_EXPIRE_MINUTES", "60"),
        )?;
        let max_report_size_mb =
            parse_u64("MAX_REPORT_SIZE_MB", env_or_default("MAX_REPORT_SIZE_MB", "10"))?;

        let first_admin_email = env_or_default("FIRST_ADMIN_EMAIL", "admin@literexia.local");
        let first_admin_password = env_or_default("FIRST_ADMIN_PASSWORD", "");

        let log_level = env_or_default("LITEREXIA_LOG_LEVEL", "info");
        let json =
            env_optional("LITEREXIA_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, prefix },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            mail: MailSettings {
                api_url: mail_api_url,
                api_key: mail_api_key,
                from: mail_from,
                timeout_seconds: mail_timeout_seconds,
            },
            iep: IepSettings {
                passing_threshold,
                school_year_start_month,
                report_url_expire_minutes,
                max_report_size_mb,
            },
            admin: AdminSettings { first_admin_email, first_admin_password },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn mail(&self) -> &MailSettings {
        &self.mail
    }

    pub(crate) fn iep(&self) -> &IepSettings {
        &self.iep
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.iep.passing_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "IEP_PASSING_THRESHOLD",
                value: self.iep.passing_threshold.to_string(),
            });
        }

        if !(1..=12).contains(&self.iep.school_year_start_month) {
            return Err(ConfigError::InvalidValue {
                field: "IEP_SCHOOL_YEAR_START_MONTH",
                value: self.iep.school_year_start_month.to_string(),
            });
        }

        if self.iep.max_report_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_REPORT_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if !self.api.prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "API_PREFIX",
                value: self.api.prefix.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if !self.s3.is_configured() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }
        if self.admin.first_admin_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"));
        }

        Ok(())
    }
}
