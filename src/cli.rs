use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tapebot")]
#[command(author, version, about = "Telegram bot that relays Streamtape videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run {
        /// Load `.env.<profile>` on top of `.env`
        #[arg(long)]
        profile: Option<String>,
    },

    /// Resolve a Streamtape link and print the direct download URL
    Resolve {
        /// Streamtape share link (https://streamtape.com/v/...)
        link: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["tapebot", "run", "--profile", "staging"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                profile: Some("staging".to_string())
            })
        );

        let cli = Cli::try_parse_from(["tapebot", "resolve", "https://streamtape.com/v/abc"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Resolve {
                link: "https://streamtape.com/v/abc".to_string()
            })
        );

        assert_eq!(Cli::try_parse_from(["tapebot"]).unwrap().command, None);
    }
}
