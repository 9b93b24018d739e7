use std::path::PathBuf;

use vhost_gate::proxy::http_client;
use vhost_gate::routing::Gate;
use vhost_gate::server::reload_routes;
use vhost_gate::settings::logging::{LogFormat, LogOutput};
use vhost_gate::settings::{RoutesConfig, Settings, SettingsError};

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 8] = [
        "PROXY_CONFIG_FILE",
        "PROXY_LISTEN_ADDR",
        "PROXY_HTTP_PORT",
        "PROXY_LOG_LEVEL",
        "PROXY_LOG_FORMAT",
        "PROXY_LOG_OUTPUT",
        "PROXY_ROUTES_FILE",
        "PROXY_WATCH_ROUTES",
    ];

    fn cleanup_env() {
        for var in ENV_VARS.iter() {
            std::env::remove_var(var);
        }
    }

    // 테스트용 임시 파일 생성 헬퍼
    fn create_test_file(name: &str, content: &str) -> (PathBuf, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join(name);
        std::fs::write(&file_path, content).unwrap();
        (file_path, dir)
    }

    #[test]
    #[serial]
    fn test_settings_defaults() {
        cleanup_env();

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.http_port, 80);
        assert_eq!(settings.server.socket_addr().to_string(), "0.0.0.0:80");
        assert_eq!(settings.logging.level, tracing::Level::INFO);
        assert_eq!(settings.logging.format, LogFormat::Text);
        assert_eq!(settings.logging.output, LogOutput::Stdout);
        assert!(settings.routes_file.is_none());
        assert!(settings.watch_routes);
    }

    #[test]
    #[serial]
    fn test_settings_from_env() {
        cleanup_env();
        std::env::set_var("PROXY_LISTEN_ADDR", "127.0.0.1");
        std::env::set_var("PROXY_HTTP_PORT", "8080");
        std::env::set_var("PROXY_LOG_LEVEL", "debug");
        std::env::set_var("PROXY_LOG_FORMAT", "json");
        std::env::set_var("PROXY_LOG_OUTPUT", "/var/log/gate.log");
        std::env::set_var("PROXY_ROUTES_FILE", "/etc/gate/routes.toml");
        std::env::set_var("PROXY_WATCH_ROUTES", "false");

        let settings = Settings::from_env().unwrap();
        cleanup_env();

        assert_eq!(settings.server.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(settings.logging.level, tracing::Level::DEBUG);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.output, LogOutput::File("/var/log/gate.log".to_string()));
        assert_eq!(settings.routes_file, Some(PathBuf::from("/etc/gate/routes.toml")));
        assert!(!settings.watch_routes);
    }

    #[test]
    #[serial]
    fn test_settings_validation() {
        let invalid = vec![
            ("PROXY_HTTP_PORT", "99999"),
            ("PROXY_HTTP_PORT", "http"),
            ("PROXY_LISTEN_ADDR", "not-an-ip"),
            ("PROXY_LOG_LEVEL", "invalid_level"),
            ("PROXY_LOG_FORMAT", "xml"),
            ("PROXY_WATCH_ROUTES", "maybe"),
        ];

        for (var, value) in invalid {
            cleanup_env();
            std::env::set_var(var, value);
            let result = Settings::from_env();
            assert!(
                matches!(result, Err(SettingsError::EnvVarInvalid { .. })),
                "{}={} 는 거부되어야 함",
                var,
                value
            );
        }
        cleanup_env();
    }

    #[test]
    #[serial]
    fn test_settings_from_toml_file() {
        cleanup_env();
        let (path, dir) = create_test_file("gate.toml", r#"
            routes_file = "routes.toml"
            watch_routes = false

            [server]
            listen_addr = "127.0.0.1"
            http_port = 8080

            [logging]
            level = "warn"
            format = "json"
            output = "stdout"
        "#);

        std::env::set_var("PROXY_CONFIG_FILE", &path);
        let settings = Settings::load().unwrap();
        cleanup_env();

        assert_eq!(settings.server.http_port, 8080);
        assert_eq!(settings.logging.level, tracing::Level::WARN);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.output, LogOutput::Stdout);
        assert_eq!(settings.routes_file, Some(dir.path().join("routes.toml")));
        assert!(!settings.watch_routes);
    }

    #[test]
    fn test_settings_toml_errors() {
        let (path, _dir) = create_test_file("gate.toml", "[logging]\nlevel = \"loud\"\n");
        assert!(matches!(
            Settings::from_toml_file(&path),
            Err(SettingsError::ParseError { .. })
        ));

        assert!(matches!(
            Settings::from_toml_file("/nonexistent/gate.toml"),
            Err(SettingsError::FileError { .. })
        ));
    }

    #[test]
    fn test_routes_config_formats() {
        let toml = RoutesConfig::from_toml_str(r#"
            [[hosts]]
            pattern = "*.example.com"

            [hosts.routes]
            "/" = "10.0.0.1:80"
            "/api" = "backend:9000"

            [[hosts]]
            pattern = "*"
            routes = { "/" = "fallback:8080" }
        "#).unwrap();

        let json = RoutesConfig::from_json_str(r#"{
            "hosts": [
                { "pattern": "*.example.com", "routes": { "/": "10.0.0.1:80", "/api": "backend:9000" } },
                { "pattern": "*", "routes": { "/": "fallback:8080" } }
            ]
        }"#).unwrap();

        assert_eq!(toml, json);
        assert_eq!(toml.hosts.len(), 2);
        assert_eq!(toml.route_count(), 3);
        assert_eq!(toml.hosts[0].pattern, "*.example.com");
    }

    #[test]
    fn test_routes_config_apply() {
        let config = RoutesConfig::from_toml_str(r#"
            [[hosts]]
            pattern = "*.example.com"
            routes = { "/" = "10.0.0.1:80", "/api" = "backend:9000" }
        "#).unwrap();

        let gate = Gate::new();
        config.apply(&gate, &http_client()).unwrap();

        assert_eq!(gate.patterns(), vec!["*.example.com".to_string()]);
        let host = gate.find_host("svc.example.com").unwrap();
        assert_eq!(host.patterns(), vec!["/".to_string(), "/api".to_string()]);
        assert_eq!(
            host.find_route("/api/widgets").unwrap().backend().unwrap().as_str(),
            "http://backend:9000/"
        );
    }

    #[test]
    fn test_reload_keeps_table_on_invalid_file() {
        let gate = Gate::new();
        let client = http_client();

        let (path, _dir) = create_test_file("routes.json", r#"{
            "hosts": [{ "pattern": "api.example.com", "routes": { "/": "backend:9000" } }]
        }"#);
        assert_eq!(reload_routes(&path, &gate, &client).unwrap(), 1);

        // 백엔드 URL이 잘못된 파일
        std::fs::write(&path, r#"{
            "hosts": [{ "pattern": "new.example.com", "routes": { "/": "backend:99999" } }]
        }"#).unwrap();
        assert!(matches!(
            reload_routes(&path, &gate, &client),
            Err(SettingsError::Routing { host, .. }) if host == "new.example.com"
        ));

        // 문법이 깨진 파일
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            reload_routes(&path, &gate, &client),
            Err(SettingsError::JsonError { .. })
        ));

        assert_eq!(gate.patterns(), vec!["api.example.com".to_string()]);
    }
}
