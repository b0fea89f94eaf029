use clap::{ ArgAction, Parser };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional API Key used to verify handshake signatures. If set, clients must sign the `ts` query param.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Optional port for the HTTP API (health, options, default config).
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Optional path to the TLS certificate file (PEM format) for enabling WSS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling WSS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    // --- Conversation Args ---
    /// Archive store for previous conversations (memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// Optional JSON file replacing the built-in canned responses. Re-read when it changes.
    #[arg(long, env = "RESPONSES_PATH")]
    pub responses_path: Option<String>,

    /// Delay before the assistant answers free text, in milliseconds.
    #[arg(long, env = "USER_RESPONSE_DELAY_MS", default_value = "500")]
    pub user_response_delay_ms: u64,

    /// Delay before the assistant answers a selected option, in milliseconds.
    #[arg(long, env = "OPTION_RESPONSE_DELAY_MS", default_value = "800")]
    pub option_response_delay_ms: u64,

    /// Delay between an option reply and the follow-up menu, in milliseconds.
    #[arg(long, env = "FOLLOWUP_RESPONSE_DELAY_MS", default_value = "500")]
    pub followup_response_delay_ms: u64,

    /// Viewport width assumed for new views until the client reports its own.
    #[arg(long, env = "VIEWPORT_WIDTH", default_value = "1024")]
    pub viewport_width: u32,

    // --- Configuration Drawer Defaults ---
    /// Model label shown in the header.
    #[arg(long, env = "MODEL_NAME", default_value = "Luminous")]
    pub model_name: String,

    /// Initial creativity (0.0 to 1.0).
    #[arg(long, env = "DEFAULT_CREATIVITY", default_value = "0.7")]
    pub default_creativity: f64,

    /// Initial max tokens (256 to 4096).
    #[arg(long, env = "DEFAULT_MAX_TOKENS", default_value = "1024")]
    pub default_max_tokens: i64,

    #[arg(long, env = "DEFAULT_WEB_SEARCH", default_value = "false")]
    pub default_web_search: bool,

    #[arg(long, env = "DEFAULT_MEMORY_RETENTION", default_value = "true", action = ArgAction::Set)]
    pub default_memory_retention: bool,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_without_flags() {
        let args = Args::try_parse_from(["luminary"]).unwrap();
        assert_eq!(args.server_addr, "127.0.0.1:4000");
        assert_eq!(args.history_type, "memory");
        assert_eq!(args.user_response_delay_ms, 500);
        assert_eq!(args.option_response_delay_ms, 800);
        assert_eq!(args.followup_response_delay_ms, 500);
        assert_eq!(args.model_name, "Luminous");
        assert!(args.default_memory_retention);
        assert!(!args.enable_tls);
        assert!(!args.debug);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "luminary",
            "--server-addr",
            "0.0.0.0:9000",
            "--http-port",
            "8080",
            "--default-max-tokens",
            "2048",
            "--default-memory-retention",
            "false",
            "--debug",
        ]).unwrap();
        assert_eq!(args.server_addr, "0.0.0.0:9000");
        assert_eq!(args.http_port, Some(8080));
        assert_eq!(args.default_max_tokens, 2048);
        assert!(!args.default_memory_retention);
        assert!(args.debug);
    }
}
