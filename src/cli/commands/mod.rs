use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("parley")
        .about("Chat service with token-based authentication")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PARLEY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("access-secret")
                .long("access-secret")
                .help("Signing secret for access tokens")
                .env("PARLEY_ACCESS_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("refresh-secret")
                .long("refresh-secret")
                .help("Signing secret for refresh tokens, independent from the access secret")
                .env("PARLEY_REFRESH_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Frontend base URL, used for CORS and cookie security")
                .default_value("http://localhost:3000")
                .env("PARLEY_FRONTEND_URL"),
        )
        .arg(
            Arg::new("embedding-url")
                .long("embedding-url")
                .help("Embedding service endpoint")
                .default_value("http://localhost:8081/embeddings")
                .env("PARLEY_EMBEDDING_URL"),
        )
        .arg(
            Arg::new("retrieval-url")
                .long("retrieval-url")
                .help("Vector store retrieval endpoint")
                .default_value("http://localhost:8082/rpc/relevant_chunks")
                .env("PARLEY_RETRIEVAL_URL"),
        )
        .arg(
            Arg::new("completion-url")
                .long("completion-url")
                .help("Chat completion endpoint")
                .default_value("http://localhost:8083/v1/chat/completions")
                .env("PARLEY_COMPLETION_URL"),
        )
        .arg(
            Arg::new("completion-model")
                .long("completion-model")
                .help("Model name sent to the completion endpoint")
                .default_value("qwen-turbo")
                .env("PARLEY_COMPLETION_MODEL"),
        )
        .arg(
            Arg::new("completion-api-key")
                .long("completion-api-key")
                .help("API key for the completion endpoint")
                .env("PARLEY_COMPLETION_API_KEY"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PARLEY_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
