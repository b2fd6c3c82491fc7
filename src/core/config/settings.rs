use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_u16,
    parse_u64,
};
use super::types::{
    AntiCheatSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, ExamSettings,
    RedisSettings, RuntimeSettings, ServerHost, ServerPort, ServerSettings, Settings,
    TelemetrySettings,
};

const DEFAULT_ALERT_TEXT: &str =
    "Terdeteksi meninggalkan halaman ujian! Layar dibekukan sementara.";

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("DAS_HOST", "0.0.0.0");
        let port = env_or_default("DAS_PORT", "8000");

        let environment =
            parse_environment(env_optional("DAS_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("DAS_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "DAS Exam API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "das");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "das_db");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let anti_cheat_active =
            env_optional("ANTICHEAT_ACTIVE").map(|value| parse_bool(&value)).unwrap_or(true);
        let freeze_duration_seconds = parse_u64(
            "ANTICHEAT_FREEZE_SECONDS",
            env_or_default("ANTICHEAT_FREEZE_SECONDS", "15"),
        )?;
        let alert_text = env_or_default("ANTICHEAT_ALERT_TEXT", DEFAULT_ALERT_TEXT);
        let enable_sound =
            env_optional("ANTICHEAT_SOUND").map(|value| parse_bool(&value)).unwrap_or(true);

        let max_concurrent_sessions = parse_u64(
            "MAX_CONCURRENT_SESSIONS",
            env_or_default("MAX_CONCURRENT_SESSIONS", "150"),
        )?;
        let finished_session_retention_minutes = parse_u64(
            "FINISHED_SESSION_RETENTION_MINUTES",
            env_or_default("FINISHED_SESSION_RETENTION_MINUTES", "60"),
        )?;

        let log_level = env_or_default("DAS_LOG_LEVEL", "info");
        let json = env_optional("DAS_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
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
            anti_cheat: AntiCheatSettings {
                is_active: anti_cheat_active,
                freeze_duration_seconds,
                alert_text,
                enable_sound,
            },
            exam: ExamSettings { max_concurrent_sessions, finished_session_retention_minutes },
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

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn anti_cheat(&self) -> &AntiCheatSettings {
        &self.anti_cheat
    }

    pub(crate) fn exam(&self) -> &ExamSettings {
        &self.exam
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.anti_cheat.freeze_duration_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ANTICHEAT_FREEZE_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.exam.max_concurrent_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_CONCURRENT_SESSIONS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        Ok(())
    }
}
