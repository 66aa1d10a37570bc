use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "discord-n8n-relay", version, about)]
pub struct Cli {
    /// Optional YAML config file; environment variables override its values.
    #[arg(short, long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_optional() {
        let cli = Cli::try_parse_from(["discord-n8n-relay", "--config", "bot.yaml"]).unwrap();
        assert_eq!(cli.config.unwrap().to_str(), Some("bot.yaml"));
    }
}
