use crate::domain::model::Identity;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "swipe-predict")]
#[command(about = "Swipe prediction-market cards from the terminal")]
pub struct CliArgs {
    #[arg(long, short, default_value = "swipe-predict.toml")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the feed the given user would see
    Feed(UserArgs),
    /// Read one drag offset per line from stdin and apply it to the top card
    Play(UserArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct UserArgs {
    /// Identity-provider user id; omit to browse as a guest
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long, requires = "user")]
    pub wallet: Option<String>,

    #[arg(long, requires = "user")]
    pub email: Option<String>,
}

impl UserArgs {
    pub fn identity(&self) -> Option<Identity> {
        let mut identity = Identity::new(self.user.clone()?);
        identity.wallet_address = self.wallet.clone();
        identity.email = self.email.clone();
        Some(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_with_wallet() {
        let args = CliArgs::parse_from([
            "swipe-predict",
            "--config",
            "app.toml",
            "play",
            "--user",
            "did:privy:42",
            "--wallet",
            "0xabcdef0123",
        ]);

        let Command::Play(user) = args.command else {
            panic!("expected play");
        };
        let identity = user.identity().unwrap();
        assert_eq!(identity.provider_user_id, "did:privy:42");
        assert_eq!(identity.display_label(), "0xabcd...");
    }

    #[test]
    fn test_guest_feed() {
        let args = CliArgs::parse_from(["swipe-predict", "feed"]);
        let Command::Feed(user) = args.command else {
            panic!("expected feed");
        };
        assert!(user.identity().is_none());
        assert_eq!(args.config, PathBuf::from("swipe-predict.toml"));
    }

    #[test]
    fn test_wallet_requires_user() {
        assert!(CliArgs::try_parse_from(["swipe-predict", "feed", "--wallet", "0x1"]).is_err());
    }
}
