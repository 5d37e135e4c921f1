use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.public_port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        public_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.public_addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.public_addr.port(), DEFAULT_PUBLIC_PORT);
    assert_eq!(settings.server.admin_addr.port(), DEFAULT_ADMIN_PORT);
    assert_eq!(settings.server.public_base_url.as_str(), "http://localhost:3000/");
    assert_eq!(settings.server.max_body_bytes.get(), DEFAULT_MAX_BODY_BYTES);
    assert_eq!(settings.render.program, PathBuf::from("python"));
    assert_eq!(settings.render.script, Some(PathBuf::from("inference.py")));
    assert_eq!(settings.render.checkpoint_flag, "--checkpoint");
    assert_ne!(
        settings.render.slide_checkpoint,
        settings.render.infographic_checkpoint
    );
    assert_eq!(settings.render.timeout, Duration::from_secs(900));
    assert_eq!(settings.render.concurrency.get(), 1);
    assert!(settings.render.verify_outputs);
    assert!(!settings.catalog.cache);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn render_overrides_apply() {
    let overrides = ServeOverrides {
        render: RenderOverrides {
            program: Some(PathBuf::from("/bin/sh")),
            script: Some(PathBuf::from("render.sh")),
            timeout_seconds: Some(5),
            concurrency: Some(3),
            queue_depth: Some(0),
            verify_outputs: Some(false),
            ..Default::default()
        },
        ..Default::default()
    };

    let settings = Settings::from_overrides(&overrides).expect("valid settings");
    assert_eq!(settings.render.program, PathBuf::from("/bin/sh"));
    assert_eq!(settings.render.script, Some(PathBuf::from("render.sh")));
    assert_eq!(settings.render.timeout, Duration::from_secs(5));
    assert_eq!(settings.render.concurrency.get(), 3);
    assert_eq!(settings.render.queue_depth, 0);
    assert!(!settings.render.verify_outputs);
}

#[test]
fn empty_script_runs_program_directly() {
    let overrides = ServeOverrides {
        render: RenderOverrides {
            script: Some(PathBuf::new()),
            ..Default::default()
        },
        ..Default::default()
    };

    let settings = Settings::from_overrides(&overrides).expect("valid settings");
    assert_eq!(settings.render.script, None);
}

#[test]
fn rejects_zero_concurrency() {
    let overrides = ServeOverrides {
        render: RenderOverrides {
            concurrency: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };

    let err = Settings::from_overrides(&overrides).expect_err("zero concurrency");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.concurrency",
            ..
        }
    ));
}

#[test]
fn rejects_shared_checkpoint() {
    let overrides = ServeOverrides {
        render: RenderOverrides {
            slide_checkpoint: Some("same".into()),
            infographic_checkpoint: Some("same".into()),
            ..Default::default()
        },
        ..Default::default()
    };

    let err = Settings::from_overrides(&overrides).expect_err("shared checkpoint");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.infographic_checkpoint",
            ..
        }
    ));
}

#[test]
fn rejects_non_http_base_url() {
    let overrides = ServeOverrides {
        public_base_url: Some("ftp://example.com".into()),
        ..Default::default()
    };

    let err = Settings::from_overrides(&overrides).expect_err("ftp base url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.public_base_url",
            ..
        }
    ));
}

#[test]
fn rejects_colliding_staging_dirs() {
    let overrides = ServeOverrides {
        staging_config_dir: Some(PathBuf::from("work")),
        staging_output_dir: Some(PathBuf::from("work")),
        ..Default::default()
    };

    assert!(Settings::from_overrides(&overrides).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["layoutgen"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "layoutgen",
        "serve",
        "--server-public-port",
        "8080",
        "--render-concurrency",
        "4",
        "--catalog-cache",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.public_port, Some(8080));
            assert_eq!(serve.overrides.render.concurrency, Some(4));
            assert_eq!(serve.overrides.catalog_cache, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_check_arguments() {
    let args = CliArgs::parse_from(["layoutgen", "check", "request.json"]);

    match args.command.expect("check command") {
        Command::Check(check) => assert_eq!(check.file, PathBuf::from("request.json")),
        other => panic!("unexpected command: {other:?}"),
    }
}
