use super::*;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn no_subcommand_defaults_to_chat() {
    let args = parse_args(&["tether"]);
    assert_eq!(args.command, None);
    assert!(!args.no_markdown);

    let args = parse_args(&["tether", "chat", "--host", "example.com:7000"]);
    assert_eq!(args.command, Some(Commands::Chat));
    assert_eq!(args.host.as_deref(), Some("example.com:7000"));
}

#[test]
fn say_collects_trailing_words() {
    let args = parse_args(&["tether", "say", "hello", "-there", "world"]);
    assert_eq!(
        args.command,
        Some(Commands::Say {
            text: vec!["hello".into(), "-there".into(), "world".into()],
        })
    );
}

#[test]
fn global_flags_parse_after_subcommand() {
    let args = parse_args(&[
        "tether",
        "say",
        "--no-markdown",
        "--log",
        "/tmp/tether.log",
        "hi",
    ]);
    assert!(args.no_markdown);
    assert_eq!(args.log, Some(PathBuf::from("/tmp/tether.log")));
}

#[test]
fn set_accepts_missing_value() {
    let args = parse_args(&["tether", "set", "theme"]);
    assert_eq!(
        args.command,
        Some(Commands::Set {
            key: "theme".into(),
            value: Vec::new(),
        })
    );
}

#[test]
fn flags_override_loaded_config() {
    let args = parse_args(&[
        "tether",
        "--url",
        "wss://chat.example/ws",
        "--no-markdown",
        "--no-syntax",
    ]);
    let loaded = Config {
        host: Some("ignored:1".into()),
        markdown: Some(true),
        theme: Some("light".into()),
        ..Default::default()
    };
    let merged = args.apply_overrides(loaded);
    assert_eq!(merged.url.as_deref(), Some("wss://chat.example/ws"));
    assert_eq!(merged.host.as_deref(), Some("ignored:1"));
    assert!(!merged.markdown_enabled());
    assert!(!merged.syntax_enabled());
    assert_eq!(merged.theme.as_deref(), Some("light"));
    assert_eq!(merged.endpoint().unwrap().as_str(), "wss://chat.example/ws");
}

#[test]
fn no_flags_leave_config_untouched() {
    let args = parse_args(&["tether"]);
    let loaded = Config {
        syntax: Some(false),
        ..Default::default()
    };
    assert_eq!(args.apply_overrides(loaded.clone()), loaded);
}

#[test]
fn set_and_unset_report_results() {
    let mut config = Config::default();
    assert_eq!(
        set_config_value(&mut config, "host", &["chat.local:9001".into()]).unwrap(),
        "✅ Set host to: chat.local:9001"
    );
    assert_eq!(config.host.as_deref(), Some("chat.local:9001"));

    assert!(set_config_value(&mut config, "colour", &["x".into()]).is_err());
    assert!(set_config_value(&mut config, "markdown", &["maybe".into()]).is_err());
    assert_eq!(config.markdown, None);

    assert_eq!(
        unset_config_value(&mut config, "HOST").unwrap(),
        "✅ Unset host"
    );
    assert_eq!(config.host, None);
}
